//! Named data migrations for the mach5 collections.
//!
//! Each migration is a one-off patch selected by name on the command line.
//! There is no record of which migrations have run and no ordering between
//! them; the operator decides what to run and when.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use miette::Result;
use mongodb::bson::{Bson, DateTime, Document, doc};
use mongodb::{Collection, Database};
use tracing::{info, warn};

const ACCOUNT_COLLECTION: &str = "account";
const CUSTOMER_COLLECTION: &str = "customer";
const JOB_COLLECTION: &str = "job";
const JOB_ACCOUNT_COLLECTION: &str = "job_account";
const NOTIFICATION_CATEGORY_COLLECTION: &str = "notification_category";

// =============================================================================
// Migration Framework Types
// =============================================================================

/// Result of applying a migration.
pub struct MigrationResult {
    /// Number of documents written.
    pub records_updated: u64,
    /// Errors encountered (non-fatal, migration continued).
    pub errors: Vec<String>,
}

impl MigrationResult {
    fn updated(records_updated: u64) -> Self {
        Self {
            records_updated,
            errors: Vec::new(),
        }
    }
}

/// A migration that can be applied to the database.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Unique name for this migration.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Apply the migration.
    async fn apply(&self, db: &Database) -> Result<MigrationResult>;
}

// =============================================================================
// Helper Functions
// =============================================================================

fn collection(db: &Database, name: &str) -> Collection<Document> {
    db.collection(name)
}

fn db_err(e: mongodb::error::Error) -> miette::Report {
    miette::miette!("{}", e)
}

/// Column visibility defaults for the job table.
fn default_job_preferences() -> Document {
    doc! {
        "show_column_p_o_number": true,
        "show_column_job_number": true,
        "show_column_job_name": true,
        "show_column_status": true,
        "show_column_payment_status": true,
        "show_column_ship_date": true,
        "show_column_tracking_info": true,
        "show_column_project_manager": true,
        "default_row_count": 25,
    }
}

/// Desktop preferences carry over an account's existing settings and add the
/// show-name column, hidden.
fn desktop_job_preferences(existing: Option<&Document>) -> Document {
    let mut prefs = existing.cloned().unwrap_or_default();
    prefs.insert("show_column_show_name", false);
    prefs
}

fn mobile_job_preferences() -> Document {
    doc! {
        "show_column_p_o_number": true,
        "show_column_job_number": false,
        "show_column_job_name": false,
        "show_column_status": true,
        "show_column_payment_status": false,
        "show_column_ship_date": false,
        "show_column_tracking_info": true,
        "show_column_project_manager": false,
        "show_column_show_name": false,
        "default_row_count": 10,
    }
}

fn account_preferences(show_splash: bool) -> Document {
    doc! {
        "show_splash": show_splash,
        "mach5_enabled": false,
        "show_my_jobs_on_load": false,
    }
}

/// Initial payment status for a job, from its customer's prepay flag.
fn payment_status(prepay_required: bool) -> &'static str {
    if prepay_required {
        "awaiting_payment"
    } else {
        "not_invoiced"
    }
}

// =============================================================================
// Account migrations
// =============================================================================

/// Migration: Add default job table preferences to every account.
struct AddJobPreferencesToAccount;

#[async_trait]
impl Migration for AddJobPreferencesToAccount {
    fn name(&self) -> &'static str {
        "add-job-preferences-to-account"
    }

    fn description(&self) -> &'static str {
        "Set default job_preferences on every account"
    }

    async fn apply(&self, db: &Database) -> Result<MigrationResult> {
        let result = collection(db, ACCOUNT_COLLECTION)
            .update_many(
                doc! {},
                doc! { "$set": { "job_preferences": default_job_preferences() } },
            )
            .await
            .map_err(db_err)?;
        Ok(MigrationResult::updated(result.modified_count))
    }
}

/// Migration: Split job preferences into desktop and mobile variants.
struct SplitJobPreferences;

#[async_trait]
impl Migration for SplitJobPreferences {
    fn name(&self) -> &'static str {
        "split-job-preferences-into-desktop-and-mobile"
    }

    fn description(&self) -> &'static str {
        "Derive job_preferences_desktop and job_preferences_mobile from job_preferences"
    }

    async fn apply(&self, db: &Database) -> Result<MigrationResult> {
        let accounts = collection(db, ACCOUNT_COLLECTION);
        let mut cursor = accounts.find(doc! {}).await.map_err(db_err)?;
        let mut updated = 0;
        let mut errors = Vec::new();

        while let Some(account) = cursor.try_next().await.map_err(db_err)? {
            let Some(id) = account.get("_id").cloned() else {
                errors.push("Account without _id skipped".to_string());
                continue;
            };
            let existing = account.get_document("job_preferences").ok();

            accounts
                .update_one(
                    doc! { "_id": id },
                    doc! { "$set": {
                        "job_preferences_desktop": desktop_job_preferences(existing),
                        "job_preferences_mobile": mobile_job_preferences(),
                    } },
                )
                .await
                .map_err(db_err)?;
            updated += 1;
        }

        Ok(MigrationResult {
            records_updated: updated,
            errors,
        })
    }
}

/// Migration: Drop the superseded single job_preferences field.
struct RemoveJobPreferencesFromAccount;

#[async_trait]
impl Migration for RemoveJobPreferencesFromAccount {
    fn name(&self) -> &'static str {
        "remove-job-preferences-from-account"
    }

    fn description(&self) -> &'static str {
        "Unset job_preferences on every account"
    }

    async fn apply(&self, db: &Database) -> Result<MigrationResult> {
        let result = collection(db, ACCOUNT_COLLECTION)
            .update_many(doc! {}, doc! { "$unset": { "job_preferences": "" } })
            .await
            .map_err(db_err)?;
        Ok(MigrationResult::updated(result.modified_count))
    }
}

/// Migration: Move the top-level show_splash flag into a preferences document.
struct AddPreferencesToAccount;

#[async_trait]
impl Migration for AddPreferencesToAccount {
    fn name(&self) -> &'static str {
        "add-preferences-to-account"
    }

    fn description(&self) -> &'static str {
        "Create account preferences from show_splash and remove the old field"
    }

    async fn apply(&self, db: &Database) -> Result<MigrationResult> {
        let accounts = collection(db, ACCOUNT_COLLECTION);
        let mut cursor = accounts.find(doc! {}).await.map_err(db_err)?;
        let mut updated = 0;
        let mut errors = Vec::new();

        while let Some(account) = cursor.try_next().await.map_err(db_err)? {
            let Some(id) = account.get("_id").cloned() else {
                errors.push("Account without _id skipped".to_string());
                continue;
            };
            let show_splash = account.get_bool("show_splash").unwrap_or(true);

            accounts
                .update_one(
                    doc! { "_id": id },
                    doc! {
                        "$set": { "preferences": account_preferences(show_splash) },
                        "$unset": { "show_splash": "" },
                    },
                )
                .await
                .map_err(db_err)?;
            updated += 1;
        }

        Ok(MigrationResult {
            records_updated: updated,
            errors,
        })
    }
}

// =============================================================================
// Job migrations
// =============================================================================

/// Migration: Derive each job's payment status from its customer.
struct AddPaymentStatusToJobs;

#[async_trait]
impl Migration for AddPaymentStatusToJobs {
    fn name(&self) -> &'static str {
        "add-payment-status-to-jobs"
    }

    fn description(&self) -> &'static str {
        "Set payment_status from the customer's prepay_required flag"
    }

    async fn apply(&self, db: &Database) -> Result<MigrationResult> {
        let jobs = collection(db, JOB_COLLECTION);
        let customers = collection(db, CUSTOMER_COLLECTION);
        let mut prepay_jobs: Vec<Bson> = Vec::new();
        let mut other_jobs: Vec<Bson> = Vec::new();
        let mut errors = Vec::new();

        let mut cursor = jobs.find(doc! {}).await.map_err(db_err)?;
        while let Some(job) = cursor.try_next().await.map_err(db_err)? {
            let (Some(job_id), Some(customer_id)) =
                (job.get("_id").cloned(), job.get("customer_id").cloned())
            else {
                errors.push(format!("Job {:?}: no customer_id", job.get("_id")));
                continue;
            };

            let customer = customers
                .find_one(doc! { "_id": customer_id.clone() })
                .await
                .map_err(db_err)?;
            match customer {
                Some(customer) => {
                    if customer.get_bool("prepay_required").unwrap_or(false) {
                        prepay_jobs.push(job_id);
                    } else {
                        other_jobs.push(job_id);
                    }
                }
                None => errors.push(format!("Job {}: customer {} not found", job_id, customer_id)),
            }
        }

        let mut updated = 0;
        for (ids, prepay_required) in [(prepay_jobs, true), (other_jobs, false)] {
            if ids.is_empty() {
                continue;
            }
            let status = payment_status(prepay_required);
            let result = jobs
                .update_many(
                    doc! { "_id": { "$in": ids } },
                    doc! { "$set": { "payment_status": status } },
                )
                .await
                .map_err(db_err)?;
            info!(status, jobs = result.modified_count, "set payment status");
            updated += result.modified_count;
        }

        Ok(MigrationResult {
            records_updated: updated,
            errors,
        })
    }
}

/// Migration: Stamp every job with a submission time.
struct AddSubmittedAtToJobs;

#[async_trait]
impl Migration for AddSubmittedAtToJobs {
    fn name(&self) -> &'static str {
        "add-submitted-at-to-jobs"
    }

    fn description(&self) -> &'static str {
        "Set submitted_at to the current time on every job"
    }

    async fn apply(&self, db: &Database) -> Result<MigrationResult> {
        let result = collection(db, JOB_COLLECTION)
            .update_many(doc! {}, doc! { "$set": { "submitted_at": DateTime::now() } })
            .await
            .map_err(db_err)?;
        Ok(MigrationResult::updated(result.modified_count))
    }
}

/// Migration: Default notification priority where missing.
struct AddNotificationPriorityToJobs;

#[async_trait]
impl Migration for AddNotificationPriorityToJobs {
    fn name(&self) -> &'static str {
        "add-notification-priority-to-jobs"
    }

    fn description(&self) -> &'static str {
        "Set notification_priority to \"standard\" on jobs that have none"
    }

    async fn apply(&self, db: &Database) -> Result<MigrationResult> {
        let result = collection(db, JOB_COLLECTION)
            .update_many(
                doc! { "notification_priority": { "$exists": false } },
                doc! { "$set": { "notification_priority": "standard" } },
            )
            .await
            .map_err(db_err)?;
        Ok(MigrationResult::updated(result.modified_count))
    }
}

/// Migration: Move job creators into the job_account join collection.
struct JobCreatorToJoinTable;

#[async_trait]
impl Migration for JobCreatorToJoinTable {
    fn name(&self) -> &'static str {
        "migrate-job-creator-to-join-table"
    }

    fn description(&self) -> &'static str {
        "Create job_account entries from job.creator, then remove the creator field"
    }

    async fn apply(&self, db: &Database) -> Result<MigrationResult> {
        let jobs = collection(db, JOB_COLLECTION);
        let accounts = collection(db, ACCOUNT_COLLECTION);
        let job_accounts = collection(db, JOB_ACCOUNT_COLLECTION);
        let with_creator = doc! { "creator": { "$exists": true, "$ne": Bson::Null } };

        let total = jobs
            .count_documents(with_creator.clone())
            .await
            .map_err(db_err)?;
        info!(total, "jobs with creator field to process");

        let mut processed = 0u64;
        let mut created = 0u64;
        let mut skipped = 0u64;
        let mut errors = Vec::new();

        let mut cursor = jobs.find(with_creator).await.map_err(db_err)?;
        while let Some(job) = cursor.try_next().await.map_err(db_err)? {
            processed += 1;
            let (Some(job_id), Some(creator_id)) =
                (job.get("_id").cloned(), job.get("creator").cloned())
            else {
                skipped += 1;
                continue;
            };

            match link_creator(&accounts, &job_accounts, &job_id, &creator_id).await {
                Ok(true) => created += 1,
                Ok(false) => skipped += 1,
                Err(e) => {
                    warn!(job = %job_id, error = %e, "failed to link job creator");
                    errors.push(format!("Job {}: {}", job_id, e));
                }
            }

            if processed % 100 == 0 {
                info!(processed, total, "job creator progress");
            }
        }

        info!(processed, created, skipped, errors = errors.len(), "job_account entries created");

        let removed = jobs
            .update_many(
                doc! { "creator": { "$exists": true } },
                doc! { "$unset": { "creator": "" } },
            )
            .await
            .map_err(db_err)?;
        info!(jobs = removed.modified_count, "removed creator field");

        Ok(MigrationResult {
            records_updated: created,
            errors,
        })
    }
}

/// Insert the job/creator pair unless the account is gone or the pair exists.
/// Returns whether an entry was created.
async fn link_creator(
    accounts: &Collection<Document>,
    job_accounts: &Collection<Document>,
    job_id: &Bson,
    creator_id: &Bson,
) -> std::result::Result<bool, mongodb::error::Error> {
    if accounts
        .find_one(doc! { "_id": creator_id.clone() })
        .await?
        .is_none()
    {
        warn!(job = %job_id, creator = %creator_id, "creator account not found");
        return Ok(false);
    }

    let pair = doc! { "job_id": job_id.clone(), "account_id": creator_id.clone() };
    if job_accounts.find_one(pair.clone()).await?.is_some() {
        info!(job = %job_id, account = %creator_id, "relationship already exists");
        return Ok(false);
    }

    let mut entry = pair;
    entry.insert("created_at", DateTime::now());
    job_accounts.insert_one(entry).await?;
    Ok(true)
}

// =============================================================================
// Notification category migrations
// =============================================================================

/// Migration: Flag every notification category as not job related.
struct AddJobRelatedToNotificationCategories;

#[async_trait]
impl Migration for AddJobRelatedToNotificationCategories {
    fn name(&self) -> &'static str {
        "add-job-related-to-notification-categories"
    }

    fn description(&self) -> &'static str {
        "Set job_related to false on every notification category"
    }

    async fn apply(&self, db: &Database) -> Result<MigrationResult> {
        let result = collection(db, NOTIFICATION_CATEGORY_COLLECTION)
            .update_many(doc! {}, doc! { "$set": { "job_related": false } })
            .await
            .map_err(db_err)?;
        Ok(MigrationResult::updated(result.modified_count))
    }
}

// =============================================================================
// Migration Registry
// =============================================================================

/// Get all available migrations.
pub fn available_migrations() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(AddJobPreferencesToAccount),
        Box::new(SplitJobPreferences),
        Box::new(RemoveJobPreferencesFromAccount),
        Box::new(AddPreferencesToAccount),
        Box::new(AddPaymentStatusToJobs),
        Box::new(AddSubmittedAtToJobs),
        Box::new(AddNotificationPriorityToJobs),
        Box::new(JobCreatorToJoinTable),
        Box::new(AddJobRelatedToNotificationCategories),
    ]
}

fn find_migration(name: &str) -> Option<Box<dyn Migration>> {
    available_migrations().into_iter().find(|m| m.name() == name)
}

// =============================================================================
// Command Handler
// =============================================================================

/// Run the migrate command with the given options.
pub async fn run_migrate_command(
    db: &Database,
    migration_name: Option<&str>,
    list: bool,
) -> Result<()> {
    if list {
        println!("Available migrations:\n");
        for m in available_migrations() {
            println!("  {}", m.name());
            println!("      {}\n", m.description());
        }
        return Ok(());
    }

    let name = migration_name
        .ok_or_else(|| miette::miette!("Specify a migration name or --list"))?;
    let m = find_migration(name).ok_or_else(|| miette::miette!("Unknown migration: {}", name))?;

    println!("\n=== {} ===", m.name());
    println!("{}\n", m.description());

    let result = m.apply(db).await?;
    println!("Applied: {} record(s) updated", result.records_updated);
    for err in &result.errors {
        println!("  Warning: {}", err);
    }

    Ok(())
}
