pub mod loader;
pub mod schema;

pub use loader::{ConfigLoader, Overrides};
pub use schema::{ExporterConfig, Settings, WebConfig, DEFAULT_INSIGHTS_URL, TOKEN_ENV};
