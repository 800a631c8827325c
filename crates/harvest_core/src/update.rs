use crate::{AbortReason, RunEffect, RunMsg, RunState, RunStatus};

/// Pure update function: applies a message to the run state and returns the
/// next effects to execute.
pub fn update(mut state: RunState, msg: RunMsg) -> (RunState, Vec<RunEffect>) {
    let effects = match msg {
        RunMsg::Start { page_count } => {
            // Runs are singletons: a trigger while running is dropped.
            if state.status == RunStatus::Running {
                return (state, Vec::new());
            }
            state = RunState {
                status: RunStatus::Running,
                page_count,
                ..RunState::default()
            };
            if page_count == 0 {
                vec![RunEffect::Commit]
            } else {
                vec![RunEffect::FetchListing { page: 1 }]
            }
        }
        RunMsg::CancelRequested => {
            if state.status == RunStatus::Running {
                state.cancel_requested = true;
            }
            Vec::new()
        }
        RunMsg::PageHarvested { page, stats } => {
            if !state.awaiting_page() {
                return (state, Vec::new());
            }
            state.totals.pages_harvested += 1;
            state.totals.absorb(&stats);
            vec![next_after_page(&mut state, page)]
        }
        RunMsg::PageSkipped { page, reason: _ } => {
            if !state.awaiting_page() {
                return (state, Vec::new());
            }
            state.totals.pages_skipped += 1;
            vec![next_after_page(&mut state, page)]
        }
        RunMsg::PageFailed {
            page,
            stats,
            reason,
        } => {
            if !state.awaiting_page() {
                return (state, Vec::new());
            }
            state.totals.absorb(&stats);
            state.pending_abort = Some(AbortReason::StructuralMismatch {
                page,
                message: reason,
            });
            vec![RunEffect::Commit]
        }
        RunMsg::Committed { records } => {
            if state.status == RunStatus::Running {
                state.totals.committed_records = Some(records);
                state.status = match state.pending_abort.take() {
                    Some(reason) => RunStatus::Aborted { reason },
                    None => RunStatus::Completed,
                };
            }
            Vec::new()
        }
        RunMsg::CommitFailed { message } => {
            if state.status == RunStatus::Running {
                state.pending_abort = None;
                state.status = RunStatus::Aborted {
                    reason: AbortReason::Persistence { message },
                };
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn next_after_page(state: &mut RunState, page: u32) -> RunEffect {
    if state.cancel_requested {
        state.pending_abort = Some(AbortReason::Cancelled);
        return RunEffect::Commit;
    }
    if page < state.page_count {
        RunEffect::FetchListing { page: page + 1 }
    } else {
        RunEffect::Commit
    }
}
