use crate::config::ExporterConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::form_urlencoded;

const REPORTING_WINDOW: &str = "last-24-hours";

/// Where the collector gets raw workflow metric pages from.
#[async_trait]
pub trait InsightsSource: Send + Sync {
    async fn fetch_workflow_metrics(&self, page_token: Option<&str>) -> Result<Vec<u8>>;
}

pub struct InsightsClient {
    config: ExporterConfig,
    client: Client,
}

impl InsightsClient {
    pub fn new(config: ExporterConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| Error::Internal(format!("building HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// The token travels as the `circle-token` query parameter, which is what
    /// the Insights API expects. Page tokens are opaque base64 and get encoded.
    pub fn workflows_url(&self, page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}/workflows?circle-token={}&reporting-window={}&branch={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_slug,
            self.config.token,
            REPORTING_WINDOW,
            self.config.vcs_branch,
        );
        if let Some(token) = page_token {
            url.push_str("&page-token=");
            url.extend(form_urlencoded::byte_serialize(token.as_bytes()));
        }
        url
    }

    /// Same as [`workflows_url`](Self::workflows_url) but safe to log.
    pub fn redacted_url(&self, page_token: Option<&str>) -> String {
        let url = self.workflows_url(page_token);
        if self.config.token.is_empty() {
            return url;
        }
        url.replacen(
            &format!("circle-token={}", self.config.token),
            "circle-token=REDACTED",
            1,
        )
    }
}

#[async_trait]
impl InsightsSource for InsightsClient {
    async fn fetch_workflow_metrics(&self, page_token: Option<&str>) -> Result<Vec<u8>> {
        log::debug!("Fetching {}", self.redacted_url(page_token));

        let res = self.client.get(self.workflows_url(page_token)).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::UpstreamStatus(status));
        }

        let body = res.bytes().await?;
        log::debug!("Upstream body length: {} bytes", body.len());
        Ok(body.to_vec())
    }
}
