//! Access to the `asset` collection.

mod memory;
mod mongo;

use async_trait::async_trait;
use mongodb::bson::oid::{self, ObjectId};

use crate::{AssetRecord, StoreError};

pub use memory::MemoryAssetStore;
pub use mongo::{ASSET_COLLECTION, MongoAssetStore, connect_database};

/// Native identifier of an asset document.
pub type AssetId = ObjectId;

/// Parse an artifact id back into the store's id type.
pub fn parse_asset_id(raw: &str) -> Result<AssetId, oid::Error> {
    ObjectId::parse_str(raw)
}

/// The primitives reconciliation needs from the database.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Number of asset documents.
    async fn count_assets(&self) -> Result<u64, StoreError>;

    /// Up to `limit` assets starting at `offset`, newest first.
    ///
    /// The order must be total so that consecutive pages neither overlap
    /// nor skip records while the collection is unchanged.
    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<AssetRecord>, StoreError>;

    /// Delete every asset whose id is in `ids`; returns how many were removed.
    async fn delete_assets(&self, ids: &[AssetId]) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_asset_id() {
        let id = parse_asset_id("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        assert_eq!(id.to_hex(), "65a1f0c2e4b0a1b2c3d4e5f6");

        assert!(parse_asset_id("not-an-id").is_err());
        assert!(parse_asset_id("").is_err());
        assert!(parse_asset_id("65a1f0c2e4b0a1b2c3d4e5f").is_err());
    }
}
