/// How snapshots relate to what the collection already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// A snapshot lists the whole scope; rows it lacks were deleted remotely.
    Exhaustive,
    /// Entries are immutable once observed and never pruned (log streams).
    AppendOnly,
}
