//! In-process asset store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{AssetId, AssetRecord, AssetStore, StoreError};

#[derive(Debug, Clone)]
struct StoredAsset {
    record: AssetRecord,
    created_at: DateTime<Utc>,
}

/// [`AssetStore`] held in memory, ordered like the MongoDB backend
/// (`created_at` descending, then id descending).
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: RwLock<Vec<StoredAsset>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets(assets: impl IntoIterator<Item = (AssetRecord, DateTime<Utc>)>) -> Self {
        let mut stored: Vec<StoredAsset> = assets
            .into_iter()
            .map(|(record, created_at)| StoredAsset { record, created_at })
            .collect();
        sort_newest_first(&mut stored);
        Self {
            assets: RwLock::new(stored),
        }
    }

    pub async fn insert(&self, record: AssetRecord, created_at: DateTime<Utc>) {
        let mut assets = self.assets.write().await;
        assets.push(StoredAsset { record, created_at });
        sort_newest_first(&mut assets);
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.assets.read().await.iter().any(|a| a.record.id == id)
    }

    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }
}

fn sort_newest_first(assets: &mut [StoredAsset]) {
    assets.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.record.id.cmp(&a.record.id))
    });
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn count_assets(&self) -> Result<u64, StoreError> {
        Ok(self.assets.read().await.len() as u64)
    }

    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<AssetRecord>, StoreError> {
        let assets = self.assets.read().await;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(assets
            .iter()
            .skip(offset)
            .take(limit)
            .map(|a| a.record.clone())
            .collect())
    }

    async fn delete_assets(&self, ids: &[AssetId]) -> Result<u64, StoreError> {
        let wanted: Vec<String> = ids.iter().map(|id| id.to_hex()).collect();
        let mut assets = self.assets.write().await;
        let before = assets.len();
        assets.retain(|a| !wanted.contains(&a.record.id));
        Ok((before - assets.len()) as u64)
    }
}
