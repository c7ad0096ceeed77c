//! Asset reconciliation for the mach5 document database.
//!
//! Every `asset` record points at a blob on the asset host. This crate finds
//! records whose blob is gone and removes them in two operator-driven stages:
//!
//! - **Scan**: page through all assets, probe each locator, and write the
//!   missing ones to a JSON artifact for human review.
//! - **Delete**: after typed confirmation, remove the assets listed in a
//!   reviewed artifact in bounded batches.
//!
//! The database, the asset host, the artifact file, the clock and the operator
//! prompt are all reached through traits so the stages run against in-memory
//! stand-ins in tests.

pub mod artifact;
mod config;
pub mod delete;
mod error;
pub mod locator;
pub mod operator;
pub mod probe;
mod record;
pub mod scan;
pub mod store;

pub use artifact::{
    ArtifactFile, ArtifactSink, ArtifactWriter, DirectorySink, artifact_file_name,
};
pub use config::{
    DEFAULT_DELETE_BATCH_SIZE, DEFAULT_PROBE_TIMEOUT, DEFAULT_SCAN_PAGE_SIZE, Environment,
    ReconcileConfig,
};
pub use delete::{DeleteOutcome, DeleteStage, DeleteSummary};
pub use error::{ConfigError, DeleteError, ScanError, StoreError};
pub use locator::LocatorFormatter;
pub use operator::{
    Clock, Confirmation, StdinConfirmation, SystemClock, is_affirmative, is_exact_yes,
};
pub use probe::{ExistenceProbe, HttpProbe};
pub use record::{AssetRecord, MissingAssetEntry};
pub use scan::{ScanStage, ScanSummary};
pub use store::{
    ASSET_COLLECTION, AssetId, AssetStore, MemoryAssetStore, MongoAssetStore, connect_database,
    parse_asset_id,
};
