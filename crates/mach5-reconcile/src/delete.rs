//! Delete stage: remove the assets listed in a reviewed artifact.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::{
    AssetStore, Confirmation, DeleteError, MissingAssetEntry, ReconcileConfig, parse_asset_id,
};

/// Final tally of a delete run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Entries in the artifact.
    pub total: usize,
    pub deleted: u64,
    /// Valid ids that were no longer in the store.
    pub not_found: u64,
    /// Entries whose id could not be parsed; never sent to the store.
    pub parse_errors: usize,
}

/// How a delete run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The operator declined; nothing was touched.
    Cancelled,
    Completed(DeleteSummary),
}

/// Deletes artifact entries in fixed-size batches, one bulk request each.
///
/// Re-running against an already processed artifact is safe: every entry is
/// then reported as not found.
pub struct DeleteStage<'a> {
    store: &'a dyn AssetStore,
    batch_size: usize,
}

impl<'a> DeleteStage<'a> {
    pub fn new(config: &ReconcileConfig, store: &'a dyn AssetStore) -> Self {
        Self {
            store,
            batch_size: config.delete_batch_size.max(1),
        }
    }

    pub async fn run(
        &self,
        artifact_path: &Path,
        confirmation: &dyn Confirmation,
    ) -> Result<DeleteOutcome, DeleteError> {
        if !artifact_path.exists() {
            return Err(DeleteError::ArtifactNotFound(artifact_path.to_path_buf()));
        }

        let prompt = format!(
            "This will DELETE assets listed in {}. Continue? (yes/no): ",
            artifact_path.display()
        );
        if !confirmation.confirm(&prompt) {
            info!("delete cancelled by operator");
            return Ok(DeleteOutcome::Cancelled);
        }

        let entries = load_entries(artifact_path)?;
        info!(count = entries.len(), "found assets to delete");

        let mut summary = DeleteSummary {
            total: entries.len(),
            ..DeleteSummary::default()
        };

        for (batch_index, batch) in entries.chunks(self.batch_size).enumerate() {
            let first = batch_index * self.batch_size;
            let mut ids = Vec::with_capacity(batch.len());

            for (i, entry) in batch.iter().enumerate() {
                match parse_asset_id(&entry.id) {
                    Ok(id) => ids.push(id),
                    Err(e) => {
                        summary.parse_errors += 1;
                        warn!(n = first + i + 1, id = %entry.id, error = %e, "invalid asset id");
                    }
                }
            }

            if ids.is_empty() {
                continue;
            }

            let deleted = self.store.delete_assets(&ids).await?;
            let not_found = (ids.len() as u64).saturating_sub(deleted);
            summary.deleted += deleted;
            summary.not_found += not_found;

            info!(
                batch = batch_index + 1,
                requested = ids.len(),
                deleted,
                not_found,
                "deleted batch"
            );
        }

        info!(
            total = summary.total,
            deleted = summary.deleted,
            not_found = summary.not_found,
            parse_errors = summary.parse_errors,
            "delete complete"
        );

        Ok(DeleteOutcome::Completed(summary))
    }
}

fn load_entries(path: &Path) -> Result<Vec<MissingAssetEntry>, DeleteError> {
    let text = fs::read_to_string(path).map_err(|source| DeleteError::ReadArtifact {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DeleteError::Artifact {
        path: path.to_path_buf(),
        source,
    })
}
