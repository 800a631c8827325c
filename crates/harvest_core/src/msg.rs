use crate::PageStats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMsg {
    /// Trigger fired; begin iterating `page_count` listing pages.
    Start { page_count: u32 },
    /// Cooperative cancellation observed. Takes effect at the next page boundary.
    CancelRequested,
    /// Listing page processed (possibly partially, if cancelled mid-page).
    PageHarvested { page: u32, stats: PageStats },
    /// Listing page could not be fetched or decoded; the run continues.
    PageSkipped { page: u32, reason: String },
    /// Required structure missing on the page; the run stops.
    PageFailed {
        page: u32,
        stats: PageStats,
        reason: String,
    },
    /// Store committed.
    Committed { records: usize },
    /// Store commit failed.
    CommitFailed { message: String },
}
