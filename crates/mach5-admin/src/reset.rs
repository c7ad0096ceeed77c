//! `reset-db`: clear the application collections.

use miette::Result;
use mongodb::Database;
use mongodb::bson::{Document, doc};
use tracing::info;

use mach5_reconcile::Confirmation;

/// Collections emptied by a reset. `package` is deliberately kept.
pub const COLLECTIONS_TO_CLEAR: &[&str] = &[
    "account",
    "account_customer",
    "asset",
    "customer",
    "frame_design",
    "job",
    "job_shipment",
    "line_item",
    "shipment",
    "stripe_payment_session",
];

/// Delete every document in [`COLLECTIONS_TO_CLEAR`] once the operator
/// confirms. Returns whether the reset ran.
///
/// `main` passes an exact-match [`mach5_reconcile::StdinConfirmation`], so
/// only a literal `yes` goes ahead.
pub async fn run(db: &Database, confirmation: &dyn Confirmation) -> Result<bool> {
    if !confirmation.confirm("Are you sure you want to reset the database? (yes/no): ") {
        println!("Reset cancelled");
        return Ok(false);
    }

    for name in COLLECTIONS_TO_CLEAR {
        let result = db
            .collection::<Document>(name)
            .delete_many(doc! {})
            .await
            .map_err(|e| miette::miette!("failed to clear {}: {}", name, e))?;
        info!(collection = %name, deleted = result.deleted_count, "cleared collection");
    }

    println!("Database reset");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::Client;
    use mongodb::options::ClientOptions;

    struct Declined;

    impl Confirmation for Declined {
        fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_package_collection_is_kept() {
        assert!(COLLECTIONS_TO_CLEAR.contains(&"asset"));
        assert!(!COLLECTIONS_TO_CLEAR.contains(&"package"));
    }

    #[tokio::test]
    async fn test_declined_reset_never_contacts_server() {
        // The driver connects lazily; nothing listens here, so any
        // operation would fail.
        let options = ClientOptions::parse("mongodb://127.0.0.1:9/?serverSelectionTimeoutMS=100")
            .await
            .unwrap();
        let db = Client::with_options(options).unwrap().database("mach5");

        let ran = run(&db, &Declined).await.unwrap();
        assert!(!ran);
    }
}
