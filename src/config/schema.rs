use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

pub const DEFAULT_INSIGHTS_URL: &str = "https://circleci.com/api/v2/insights";

/// Environment variable holding the CircleCI API token.
pub const TOKEN_ENV: &str = "CIRCLECI_TOKEN";

/// Everything the exporter needs to reach the Insights API.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct ExporterConfig {
    #[serde(default = "default_base_url")]
    #[validate(url)]
    pub base_url: String,

    /// Project slug in the form vcs-slug/org-name/repo-name.
    #[serde(default)]
    #[validate(length(min = 1, message = "project-slug must not be empty"))]
    pub project_slug: String,

    #[serde(default = "default_branch")]
    #[validate(length(min = 1))]
    pub vcs_branch: String,

    /// Upstream request timeout; 0 waits forever.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on pages followed through `next_page_token`.
    #[serde(default = "default_max_pages")]
    #[validate(range(min = 1))]
    pub max_pages: u32,

    /// Only ever read from the environment.
    #[serde(skip)]
    pub token: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_slug: String::new(),
            vcs_branch: default_branch(),
            timeout_secs: default_timeout_secs(),
            max_pages: default_max_pages(),
            token: String::new(),
        }
    }
}

impl fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("base_url", &self.base_url)
            .field("project_slug", &self.project_slug)
            .field("vcs_branch", &self.vcs_branch)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_pages", &self.max_pages)
            .field("token", &if self.token.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WebConfig {
    #[serde(default = "default_listen_address")]
    #[validate(length(min = 1))]
    pub listen_address: String,

    #[serde(default = "default_telemetry_path")]
    #[validate(custom = "validate_telemetry_path")]
    pub telemetry_path: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            telemetry_path: default_telemetry_path(),
        }
    }
}

impl WebConfig {
    /// Go-style `:9101` means every interface.
    pub fn socket_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }
}

/// On-disk layout of the optional settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    #[validate]
    pub exporter: ExporterConfig,

    #[serde(default)]
    #[validate]
    pub web: WebConfig,
}

/// Must be a plain absolute route: no root, no captures or wildcards.
fn validate_telemetry_path(path: &str) -> Result<(), ValidationError> {
    if !path.starts_with('/') || path == "/" {
        return Err(ValidationError::new("telemetry_path"));
    }
    let has_route_syntax = path.contains(['{', '}'])
        || path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'));
    if has_route_syntax {
        return Err(ValidationError::new("telemetry_path"));
    }
    Ok(())
}

fn default_base_url() -> String {
    DEFAULT_INSIGHTS_URL.to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_pages() -> u32 {
    1
}

fn default_listen_address() -> String {
    ":9101".to_string()
}

fn default_telemetry_path() -> String {
    "/metrics".to_string()
}
