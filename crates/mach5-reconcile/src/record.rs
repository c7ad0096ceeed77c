//! Asset records and the snapshot entries written to scan artifacts.

use serde::{Deserialize, Serialize};

/// An `asset` document, reduced to the fields reconciliation reads.
///
/// Identifiers are carried in their string form; the store converts them
/// back to its native id type only when deleting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub asset_type: String,
    pub parent_collection: String,
    pub parent_id: String,
}

impl AssetRecord {
    pub fn new(
        id: impl Into<String>,
        asset_type: impl Into<String>,
        parent_collection: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            asset_type: asset_type.into(),
            parent_collection: parent_collection.into(),
            parent_id: parent_id.into(),
        }
    }
}

/// One element of a scan artifact.
///
/// A snapshot taken at scan time; the live record may have changed or been
/// removed by the time the delete stage reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingAssetEntry {
    pub id: String,
    pub url: String,
    pub asset_type: String,
    pub parent_collection: String,
}

impl MissingAssetEntry {
    pub fn from_record(record: &AssetRecord, url: impl Into<String>) -> Self {
        Self {
            id: record.id.clone(),
            url: url.into(),
            asset_type: record.asset_type.clone(),
            parent_collection: record.parent_collection.clone(),
        }
    }
}
