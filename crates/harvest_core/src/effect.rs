#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEffect {
    /// Fetch and process the listing page with this 1-based index.
    FetchListing { page: u32 },
    /// Persist the store. Issued exactly once per run.
    Commit,
}
