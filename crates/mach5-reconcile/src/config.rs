//! Runtime configuration threaded into each reconciliation component.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::ConfigError;

/// Timeout for a single existence probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Records fetched per scan page.
pub const DEFAULT_SCAN_PAGE_SIZE: u64 = 1000;

/// Artifact entries per bulk delete.
pub const DEFAULT_DELETE_BATCH_SIZE: usize = 100;

const DEV_ASSET_BASE_URL: &str = "https://dev.api.fiveincportal.com";
const PROD_ASSET_BASE_URL: &str = "https://api.fiveincportal.com";

/// Deployment the commands run against. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }

    /// Base URL of the asset host for this environment.
    pub fn asset_base_url(self) -> &'static str {
        match self {
            Environment::Dev => DEV_ASSET_BASE_URL,
            Environment::Prod => PROD_ASSET_BASE_URL,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

/// Settings shared by the scan and delete stages.
///
/// Built once at startup and passed to each component's constructor.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub environment: Environment,
    /// Asset host base URL, without a trailing slash.
    pub asset_base_url: String,
    pub probe_timeout: Duration,
    pub scan_page_size: u64,
    pub delete_batch_size: usize,
    /// Directory scan artifacts are written to.
    pub output_dir: PathBuf,
}

impl ReconcileConfig {
    /// Defaults for the given environment.
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            asset_base_url: environment.asset_base_url().to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
            delete_batch_size: DEFAULT_DELETE_BATCH_SIZE,
            output_dir: PathBuf::from("."),
        }
    }

    /// Override the environment's asset host.
    pub fn with_asset_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.asset_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the scan page size. Zero is raised to one.
    pub fn with_scan_page_size(mut self, size: u64) -> Self {
        self.scan_page_size = size.max(1);
        self
    }

    /// Set the delete batch size. Zero is raised to one.
    pub fn with_delete_batch_size(mut self, size: usize) -> Self {
        self.delete_batch_size = size.max(1);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}
