//! MongoDB-backed asset store.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::{Client, Collection, Database};
use tracing::debug;

use crate::{AssetId, AssetRecord, AssetStore, StoreError};

/// Collection holding asset documents.
pub const ASSET_COLLECTION: &str = "asset";

/// Connect to `uri` and select `database`.
///
/// The driver connects lazily, so an unreachable server surfaces on the first
/// operation rather than here.
pub async fn connect_database(uri: &str, database: &str) -> Result<Database, StoreError> {
    let client = Client::with_uri_str(uri).await?;
    debug!(database = %database, "MongoDB client created");
    Ok(client.database(database))
}

/// [`AssetStore`] over the `asset` collection.
pub struct MongoAssetStore {
    collection: Collection<Document>,
}

impl MongoAssetStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(ASSET_COLLECTION),
        }
    }
}

#[async_trait]
impl AssetStore for MongoAssetStore {
    async fn count_assets(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<AssetRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "created_at": -1, "_id": -1 })
            .skip(offset)
            .limit(limit)
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents.iter().map(record_from_document).collect())
    }

    async fn delete_assets(&self, ids: &[AssetId]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = self
            .collection
            .delete_many(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }
}

fn record_from_document(document: &Document) -> AssetRecord {
    AssetRecord {
        id: plain_string(document.get("_id")),
        asset_type: plain_string(document.get("asset_type")),
        parent_collection: plain_string(document.get("parent_collection")),
        parent_id: plain_string(document.get("parent_id")),
    }
}

/// String form of a field as it appears in a locator.
///
/// ObjectIds become bare hex and strings are unquoted. Missing or null
/// fields become empty.
fn plain_string(value: Option<&Bson>) -> String {
    match value {
        None | Some(Bson::Null) => String::new(),
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
