use crate::config::schema::Settings;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use validator::Validate;

/// Values given on the command line. `None` leaves the file or default value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen_address: Option<String>,
    pub telemetry_path: Option<String>,
    pub project_slug: Option<String>,
    pub vcs_branch: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_pages: Option<u32>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Builds the process settings: defaults, then the optional file, then
    /// command line overrides. The token always comes from the caller.
    pub fn resolve(path: Option<&Path>, overrides: Overrides, token: String) -> Result<Settings> {
        let base = match path {
            Some(path) => Self::load_file(path)?,
            None => Settings::default(),
        };

        let mut settings = Self::apply_overrides(base, overrides);
        settings.exporter.token = token;

        settings.validate().map_err(Error::Validation)?;
        Ok(settings)
    }

    pub fn load_file(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }

    fn apply_overrides(mut settings: Settings, overrides: Overrides) -> Settings {
        if let Some(listen_address) = overrides.listen_address {
            settings.web.listen_address = listen_address;
        }
        if let Some(telemetry_path) = overrides.telemetry_path {
            settings.web.telemetry_path = telemetry_path;
        }
        if let Some(project_slug) = overrides.project_slug {
            settings.exporter.project_slug = project_slug;
        }
        if let Some(vcs_branch) = overrides.vcs_branch {
            settings.exporter.vcs_branch = vcs_branch;
        }
        if let Some(base_url) = overrides.base_url {
            settings.exporter.base_url = base_url;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            settings.exporter.timeout_secs = timeout_secs;
        }
        if let Some(max_pages) = overrides.max_pages {
            settings.exporter.max_pages = max_pages;
        }
        settings
    }
}
