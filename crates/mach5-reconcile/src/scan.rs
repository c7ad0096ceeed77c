//! Scan stage: find assets whose blob is missing from the asset host.

use std::io;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::{
    ArtifactSink, ArtifactWriter, AssetStore, Clock, ExistenceProbe, LocatorFormatter,
    MissingAssetEntry, ReconcileConfig, ScanError, StoreError, artifact_file_name,
};

/// Counters reported by a completed scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub artifact_path: PathBuf,
    /// Asset count reported by the store when the scan started.
    pub total_records: u64,
    /// Records probed by this run (from the start offset onwards).
    pub processed: u64,
    pub valid: u64,
    pub missing: u64,
}

/// Walks every asset page by page, probes its locator, and writes the
/// missing ones to a new artifact.
///
/// Runs strictly one probe at a time. A failed run can be resumed by passing
/// the offset carried in the [`ScanError`]; entries already in the earlier
/// artifact are not deduplicated against the resumed run.
pub struct ScanStage<'a> {
    store: &'a dyn AssetStore,
    probe: &'a dyn ExistenceProbe,
    locator: LocatorFormatter,
    page_size: u64,
}

impl<'a> ScanStage<'a> {
    pub fn new(
        config: &ReconcileConfig,
        store: &'a dyn AssetStore,
        probe: &'a dyn ExistenceProbe,
    ) -> Self {
        Self {
            store,
            probe,
            locator: LocatorFormatter::from_config(config),
            page_size: config.scan_page_size.max(1),
        }
    }

    /// Scan from `start_offset` to the end of the collection.
    pub async fn run<K: ArtifactSink>(
        &self,
        sink: &K,
        clock: &dyn Clock,
        start_offset: u64,
    ) -> Result<ScanSummary, ScanError> {
        let file_name = artifact_file_name(clock.now());
        let (artifact_path, writer) =
            sink.create(&file_name).map_err(|source| ScanError::Artifact {
                offset: start_offset,
                path: PathBuf::from(&file_name),
                source,
            })?;
        let artifact_error = |offset: u64, source: io::Error| ScanError::Artifact {
            offset,
            path: artifact_path.clone(),
            source,
        };
        let store_error = |offset: u64, source: StoreError| ScanError::Store {
            offset,
            artifact: artifact_path.clone(),
            source,
        };

        // Dropping the writer on any early return closes the array.
        let mut artifact =
            ArtifactWriter::begin(writer).map_err(|e| artifact_error(start_offset, e))?;

        info!(
            artifact = %artifact_path.display(),
            offset = start_offset,
            "scanning assets for missing files"
        );

        let total_records = self
            .store
            .count_assets()
            .await
            .map_err(|e| store_error(start_offset, e))?;
        info!(total_records, "found assets to process");

        let mut processed = 0u64;
        let mut valid = 0u64;
        let mut missing = 0u64;
        let mut offset = start_offset;

        loop {
            let page = self
                .store
                .fetch_page(offset, self.page_size)
                .await
                .map_err(|e| store_error(offset, e))?;
            if page.is_empty() {
                break;
            }

            for (position, record) in (offset..).zip(&page) {
                processed += 1;
                let url = self.locator.format(record);

                if self.probe.exists(&url).await {
                    valid += 1;
                } else {
                    artifact
                        .append(&MissingAssetEntry::from_record(record, url.as_str()))
                        .map_err(|e| artifact_error(position, e))?;
                    missing += 1;
                    warn!(n = position + 1, id = %record.id, url = %url, "asset file not found");
                }
            }

            let reached = offset + page.len() as u64;
            info!(
                reached,
                total_records,
                percent = %format!("{:.2}", percent(reached, total_records)),
                valid,
                missing,
                "scan progress"
            );

            offset += self.page_size;
        }

        artifact
            .finish()
            .map_err(|e| artifact_error(start_offset + processed, e))?;

        info!(
            processed,
            valid,
            missing,
            artifact = %artifact_path.display(),
            "scan complete"
        );

        Ok(ScanSummary {
            artifact_path,
            total_records,
            processed,
            valid,
            missing,
        })
    }
}

/// Share of the collection up to `reached`, counting records skipped by a
/// resume offset as done.
fn percent(reached: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        reached.min(total) as f64 / total as f64 * 100.0
    }
}
