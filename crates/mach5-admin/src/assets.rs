//! `scan-assets` and `delete-assets` command handlers.

use std::path::PathBuf;

use miette::Result;
use mongodb::Database;

use mach5_reconcile::{
    DeleteOutcome, DeleteStage, DirectorySink, HttpProbe, MongoAssetStore, ReconcileConfig,
    ScanError, ScanStage, StdinConfirmation, SystemClock,
};

/// Scan every asset from `offset` and write the missing ones to an artifact.
pub async fn scan(config: &ReconcileConfig, db: &Database, offset: u64) -> Result<()> {
    let store = MongoAssetStore::new(db);
    let probe = HttpProbe::new(config.probe_timeout)
        .map_err(|e| miette::miette!("failed to build HTTP client: {}", e))?;
    let sink = DirectorySink::new(config.output_dir.clone());

    println!("Scanning assets for missing files...");

    let summary = match ScanStage::new(config, &store, &probe)
        .run(&sink, &SystemClock, offset)
        .await
    {
        Ok(summary) => summary,
        Err(e) => {
            let (offset, artifact) = match &e {
                ScanError::Store {
                    offset, artifact, ..
                } => (*offset, artifact),
                ScanError::Artifact { offset, path, .. } => (*offset, path),
            };
            println!(
                "Scan interrupted. Entries found so far are in {}",
                artifact.display()
            );
            println!("Resume with: scan-assets --offset {}", offset);
            return Err(miette::miette!("{}", e));
        }
    };

    println!("Scan complete. Checked {} assets.", summary.processed);
    println!(
        "Found {} assets without files, written to {}",
        summary.missing,
        summary.artifact_path.display()
    );
    println!("Found {} assets with valid files.", summary.valid);

    Ok(())
}

/// Delete the assets listed in `artifact`, prompting for the path if absent.
pub async fn delete(
    config: &ReconcileConfig,
    db: &Database,
    artifact: Option<PathBuf>,
) -> Result<()> {
    let artifact = match artifact {
        Some(path) => path,
        None => StdinConfirmation::read_line(
            "Enter the path to the JSON file containing assets to delete: ",
        )
        .map(PathBuf::from)
        .map_err(|e| miette::miette!("failed to read artifact path: {}", e))?,
    };

    let store = MongoAssetStore::new(db);
    let outcome = DeleteStage::new(config, &store)
        .run(&artifact, &StdinConfirmation::new())
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    match outcome {
        DeleteOutcome::Cancelled => println!("Operation cancelled"),
        DeleteOutcome::Completed(summary) => {
            println!(
                "Deletion complete. Deleted {} assets out of {}",
                summary.deleted, summary.total
            );
            println!("  Not found: {}", summary.not_found);
            println!("  Invalid ids: {}", summary.parse_errors);
        }
    }

    Ok(())
}
