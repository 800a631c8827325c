//! Harvest engine: fetching, extraction, storage and run execution.
mod config;
mod decode;
mod extract;
mod fetch;
mod harvest;
mod locate;
mod persist;
mod schedule;
mod store;

pub use config::{ConfigError, DetailFailurePolicy, HarvestConfig, MalformedItemPolicy};
pub use decode::{decode_html, decode_output, DecodeError, DecodedHtml};
pub use extract::{DetailExtractor, ExtractError, ListingExtractor, ListingItem, ListingLayout};
pub use fetch::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, FetchSettings, Fetcher, ReqwestFetcher,
};
pub use harvest::{Clock, HarvestError, Harvester, RunReport};
pub use locate::{FieldLocation, LocateError};
pub use persist::{AtomicFileWriter, PersistError};
pub use schedule::{run_periodic, Schedule};
pub use store::{JsonFileBackend, ReadModel, SqliteBackend, Store, StoreBackend, StoreError};
