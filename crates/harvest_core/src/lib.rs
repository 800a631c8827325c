//! Harvest core: pure record model, identity, ordering and the run state machine.
mod effect;
mod fingerprint;
mod freshness;
mod msg;
mod published;
mod record;
mod record_set;
mod state;
mod update;

pub use effect::RunEffect;
pub use fingerprint::fingerprint;
pub use freshness::{assess_freshness, Freshness};
pub use msg::RunMsg;
pub use published::{parse_published, DateParseError};
pub use record::Record;
pub use record_set::{most_recent, RecordSet, Upsert};
pub use state::{AbortReason, PageStats, RunState, RunStatus, RunTotals};
pub use update::update;
