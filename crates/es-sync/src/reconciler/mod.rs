pub mod apply_outcome;
pub mod collection;
pub mod display_order;
#[allow(clippy::module_inception)]
pub mod reconciler;
pub mod retention;
