//! Existence checks against the asset host.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, redirect};
use tracing::debug;

/// Answers whether a blob exists at a locator.
///
/// Implementations never fail: anything short of a positive answer is
/// reported as absent. Transient network trouble therefore shows up as
/// missing assets, which the artifact review step is there to catch.
#[async_trait]
pub trait ExistenceProbe: Send + Sync {
    async fn exists(&self, url: &str) -> bool;
}

/// Probe that issues an HTTP `HEAD` and accepts only `200 OK`.
///
/// Redirects are not followed; a `3xx` counts as absent.
pub struct HttpProbe {
    http: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ExistenceProbe for HttpProbe {
    async fn exists(&self, url: &str) -> bool {
        match self.http.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status != StatusCode::OK {
                    debug!(url = %url, status = %status, "asset probe returned non-200");
                }
                status == StatusCode::OK
            }
            Err(e) => {
                debug!(url = %url, error = %e, "asset probe failed");
                false
            }
        }
    }
}
