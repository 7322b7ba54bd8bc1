//! Decoding of the Insights "project workflow metrics" payload.
//!
//! Upstream omits or nulls fields for workflows with sparse history, so every
//! field decodes leniently to its zero value. Only malformed JSON or a value
//! of the wrong shape fails.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// One page of `GET /insights/{slug}/workflows`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkflowsPage {
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<WorkflowMetricItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub next_page_token: Option<String>,
}

impl WorkflowsPage {
    /// Token for the following page; upstream sends an empty string on the last one.
    pub fn next_page(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkflowMetricItem {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub window_start: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub window_end: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_as_default")]
    pub metrics: MetricBlock,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricBlock {
    #[serde(deserialize_with = "lenient_f64")]
    pub success_rate: f64,
    #[serde(deserialize_with = "lenient_i64")]
    pub total_runs: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub failed_runs: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub successful_runs: i64,
    #[serde(deserialize_with = "lenient_f64")]
    pub throughput: f64,
    /// Seconds.
    #[serde(deserialize_with = "lenient_i64")]
    pub mttr: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub total_credits_used: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub duration_metrics: DurationStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DurationStats {
    #[serde(deserialize_with = "lenient_i64")]
    pub min: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub max: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub median: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub mean: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub p95: i64,
    #[serde(deserialize_with = "lenient_f64")]
    pub standard_deviation: f64,
}

pub fn decode(body: &[u8]) -> Result<WorkflowsPage> {
    Ok(serde_json::from_slice(body)?)
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(number
        .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)))
        .unwrap_or_default())
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(number.and_then(|n| n.as_f64()).unwrap_or_default())
}

fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}
