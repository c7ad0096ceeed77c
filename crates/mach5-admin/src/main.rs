//! mach5-admin: administrative commands for the mach5 database
//!
//! Subcommands:
//! - `scan-assets`: find assets whose file is missing from the asset host
//! - `delete-assets`: delete the assets listed in a reviewed scan artifact
//! - `migrate`: run a named data migration
//! - `reset-db`: clear the application collections
//! - `export-components`: dump frame system components for the web app

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mach5_reconcile::{Environment, ReconcileConfig};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod assets;
mod export;
mod migrate;
mod reset;

/// Parse the deployment environment, accepting `dev` or `prod` in any case.
fn parse_environment(s: &str) -> Result<Environment, String> {
    s.parse::<Environment>().map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "mach5-admin")]
#[command(about = "Administrative commands for the mach5 database", long_about = None)]
struct Cli {
    /// Target environment (dev or prod)
    #[arg(long, env = "MACH5_ENV", value_parser = parse_environment)]
    env: Environment,

    /// MongoDB connection string
    #[arg(long, env = "MACH5_MONGO_URI", hide_env_values = true)]
    mongo_uri: String,

    /// Database name
    #[arg(long, env = "MACH5_DATABASE", default_value = "mach5")]
    database: String,

    /// Override the environment's asset host (e.g. http://localhost:9000)
    #[arg(long, env = "MACH5_ASSET_BASE_URL")]
    asset_base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan all assets and write those without a file to a JSON artifact
    ScanAssets {
        /// Offset to resume a previously interrupted scan from
        #[arg(long, default_value = "0")]
        offset: u64,

        /// Directory to write the artifact to
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Delete the assets listed in a scan artifact (prompts for confirmation)
    DeleteAssets {
        /// Artifact path; prompted for when omitted
        #[arg(value_name = "ARTIFACT")]
        artifact: Option<PathBuf>,
    },

    /// Run data migrations
    Migrate {
        /// Migration name to run
        #[arg(value_name = "MIGRATION")]
        migration: Option<String>,

        /// List available migrations
        #[arg(long)]
        list: bool,
    },

    /// Delete every document in the application collections (prompts for confirmation)
    ResetDb,

    /// Export frame system components to JSON for the web app
    ExportComponents {
        /// Output file (defaults to the web app's ComponentMenu directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "mach5_admin=info,mach5_reconcile=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = ReconcileConfig::new(cli.env);
    if let Some(url) = cli.asset_base_url {
        config = config.with_asset_base_url(url);
    }

    tracing::info!(
        env = %config.environment,
        asset_host = %config.asset_base_url,
        database = %cli.database,
        "connecting to MongoDB"
    );
    let db = mach5_reconcile::connect_database(&cli.mongo_uri, &cli.database)
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    match cli.command {
        Commands::ScanAssets { offset, output_dir } => {
            assets::scan(&config.with_output_dir(output_dir), &db, offset).await
        }

        Commands::DeleteAssets { artifact } => assets::delete(&config, &db, artifact).await,

        Commands::Migrate { migration, list } => {
            migrate::run_migrate_command(&db, migration.as_deref(), list).await
        }

        Commands::ResetDb => {
            reset::run(&db, &mach5_reconcile::StdinConfirmation::exact()).await?;
            Ok(())
        }

        Commands::ExportComponents { output } => {
            let output = match output {
                Some(path) => path,
                None => export::default_output_path()?,
            };
            export::run(&db, &output).await?;
            Ok(())
        }
    }
}
