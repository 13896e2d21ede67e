/// Presentation order of a live collection by `order_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOrder {
    NewestFirst,
    OldestFirst,
}
