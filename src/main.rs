use circleci_exporter::config::{ConfigLoader, Overrides, TOKEN_ENV};
use circleci_exporter::{server, Collector, InsightsClient};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "circleci-exporter")]
#[command(version)]
#[command(about = "Prometheus exporter for CircleCI Insights workflow metrics", long_about = None)]
struct Cli {
    /// Address on which to expose metrics and web interface [default: :9101]
    #[arg(long = "web.listen-address", visible_alias = "listen-address")]
    listen_address: Option<String>,

    /// Path under which to expose metrics [default: /metrics]
    #[arg(long = "web.telemetry-path", visible_alias = "telemetry-path")]
    telemetry_path: Option<String>,

    /// Project slug in the form vcs-slug/org-name/repo-name
    #[arg(long)]
    project_slug: Option<String>,

    /// VCS branch name [default: master]
    #[arg(long)]
    vcs_branch: Option<String>,

    /// Optional settings file (JSON/YAML/TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upstream request timeout in seconds, 0 disables it [default: 10]
    #[arg(long)]
    upstream_timeout: Option<u64>,

    /// Maximum number of result pages fetched per scrape [default: 1]
    #[arg(long)]
    max_pages: Option<u32>,

    /// Base URL of the Insights API
    #[arg(long)]
    insights_url: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            listen_address: self.listen_address.clone(),
            telemetry_path: self.telemetry_path.clone(),
            project_slug: self.project_slug.clone(),
            vcs_branch: self.vcs_branch.clone(),
            base_url: self.insights_url.clone(),
            timeout_secs: self.upstream_timeout,
            max_pages: self.max_pages,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let token = std::env::var(TOKEN_ENV).unwrap_or_default();
    let settings = match ConfigLoader::resolve(cli.config.as_deref(), cli.overrides(), token) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("[FATAL] {}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Starting CircleCI Insights Exporter for {} (branch {}) on {}",
        settings.exporter.project_slug,
        settings.exporter.vcs_branch,
        settings.web.listen_address
    );
    if settings.exporter.token.is_empty() {
        log::warn!("{} is not set; upstream requests are unauthenticated", TOKEN_ENV);
    }

    let max_pages = settings.exporter.max_pages;
    let client = InsightsClient::new(settings.exporter.clone())?;
    let collector = Arc::new(Collector::new(Arc::new(client), max_pages));

    if let Err(e) = server::serve(&settings.web, collector).await {
        log::error!("[FATAL] {}", e);
        std::process::exit(1);
    }

    Ok(())
}
