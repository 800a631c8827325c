use serde::Serialize;

/// Why a run stopped before completing every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    Cancelled,
    StructuralMismatch { page: u32, message: String },
    Persistence { message: String },
}

/// Externally observable status of the harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    NotStarted,
    Running,
    Completed,
    Aborted { reason: AbortReason },
}

impl RunStatus {
    /// True only after a full, uninterrupted run.
    pub fn is_ready(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Aborted { .. })
    }
}

/// Counters for one listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PageStats {
    pub added: usize,
    pub refreshed: usize,
    pub cache_hits: usize,
    pub detail_failures: usize,
    pub skipped_items: usize,
}

/// Counters accumulated over a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunTotals {
    pub pages_harvested: usize,
    pub pages_skipped: usize,
    pub added: usize,
    pub refreshed: usize,
    pub cache_hits: usize,
    pub detail_failures: usize,
    pub skipped_items: usize,
    pub committed_records: Option<usize>,
}

impl RunTotals {
    pub(crate) fn absorb(&mut self, stats: &PageStats) {
        self.added += stats.added;
        self.refreshed += stats.refreshed;
        self.cache_hits += stats.cache_hits;
        self.detail_failures += stats.detail_failures;
        self.skipped_items += stats.skipped_items;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    pub(crate) status: RunStatus,
    pub(crate) page_count: u32,
    pub(crate) cancel_requested: bool,
    pub(crate) pending_abort: Option<AbortReason>,
    pub(crate) totals: RunTotals,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn totals(&self) -> &RunTotals {
        &self.totals
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// A page result is only meaningful while running and not already stopping.
    pub(crate) fn awaiting_page(&self) -> bool {
        self.status == RunStatus::Running && self.pending_abort.is_none()
    }
}
