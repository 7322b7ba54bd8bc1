//! Static gauge descriptors exported by the collector.

use crate::response::MetricBlock;

pub const NAMESPACE: &str = "circleci";

/// Name, help text and label schema of one exported metric.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

/// A per-workflow gauge and how to read its value out of a metric block.
pub struct WorkflowGauge {
    pub desc: MetricDesc,
    pub value: fn(&MetricBlock) -> f64,
}

pub const WORKFLOW_LABEL: &str = "name";

const WORKFLOW_LABELS: &[&str] = &[WORKFLOW_LABEL];

pub static UP: MetricDesc = MetricDesc {
    name: "circleci_up",
    help: "Was the last query of CircleCI successful.",
    labels: &[],
};

macro_rules! workflow_gauge {
    ($name:literal, $help:literal, |$m:ident| $value:expr) => {
        WorkflowGauge {
            desc: MetricDesc {
                name: concat!("circleci_", $name),
                help: $help,
                labels: WORKFLOW_LABELS,
            },
            value: |$m: &MetricBlock| $value,
        }
    };
}

pub static WORKFLOW_GAUGES: [WorkflowGauge; 12] = [
    workflow_gauge!("success_rate", "Success builds' rate.", |m| m.success_rate),
    workflow_gauge!("total_runs", "Total number of running builds.", |m| m.total_runs as f64),
    workflow_gauge!("failed_runs", "Total number of failed builds.", |m| m.failed_runs as f64),
    workflow_gauge!(
        "successful_runs",
        "Total number of successful builds.",
        |m| m.successful_runs as f64
    ),
    workflow_gauge!("throughput", "Builds' throughput metric.", |m| m.throughput),
    workflow_gauge!("mttr", "Mean time to recovery.", |m| m.mttr as f64),
    workflow_gauge!(
        "duration_min",
        "Minimal duration of builds.",
        |m| m.duration_metrics.min as f64
    ),
    workflow_gauge!(
        "duration_max",
        "Maximal duration of builds.",
        |m| m.duration_metrics.max as f64
    ),
    workflow_gauge!(
        "duration_median",
        "Median duration of builds.",
        |m| m.duration_metrics.median as f64
    ),
    workflow_gauge!(
        "duration_mean",
        "Mean duration of builds.",
        |m| m.duration_metrics.mean as f64
    ),
    workflow_gauge!(
        "duration_p95",
        "95th percentile duration of builds.",
        |m| m.duration_metrics.p95 as f64
    ),
    workflow_gauge!(
        "duration_standard_deviation",
        "Duration standard deviation of builds.",
        |m| m.duration_metrics.standard_deviation
    ),
];

/// The descriptor set a collector emits against.
#[derive(Clone, Copy)]
pub struct Catalog {
    pub up: &'static MetricDesc,
    pub workflow: &'static [WorkflowGauge],
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            up: &UP,
            workflow: &WORKFLOW_GAUGES,
        }
    }
}

impl Catalog {
    pub fn descriptors(&self) -> impl Iterator<Item = &'static MetricDesc> + '_ {
        std::iter::once(self.up).chain(self.workflow.iter().map(|g| &g.desc))
    }
}
