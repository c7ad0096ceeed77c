//! Asset host locators.

use crate::{AssetRecord, ReconcileConfig};

/// Builds the URL an asset's blob is expected at:
/// `<base>/assets/{parent_collection}/{parent_id}/{asset_type}/{id}`.
///
/// Fields are inserted verbatim. A record with odd field values yields an odd
/// URL, which the probe will then report as missing.
#[derive(Debug, Clone)]
pub struct LocatorFormatter {
    base_url: String,
}

impl LocatorFormatter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self::new(config.asset_base_url.clone())
    }

    pub fn format(&self, record: &AssetRecord) -> String {
        format!(
            "{}/assets/{}/{}/{}/{}",
            self.base_url, record.parent_collection, record.parent_id, record.asset_type, record.id
        )
    }
}
