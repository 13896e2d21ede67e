pub mod filter;
pub mod order;
#[allow(clippy::module_inception)]
pub mod query;
pub mod value_cmp;
