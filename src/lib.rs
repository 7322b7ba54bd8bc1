pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod response;
pub mod server;

pub use client::{InsightsClient, InsightsSource};
pub use config::{ConfigLoader, ExporterConfig, Settings, WebConfig};
pub use error::{Error, Result};
pub use metrics::{Collector, MetricSample};
pub use response::{WorkflowMetricItem, WorkflowsPage};
