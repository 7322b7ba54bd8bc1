use crate::metrics::catalog::MetricDesc;

/// A single gauge reading produced during one scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub desc: &'static MetricDesc,
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl MetricSample {
    pub fn unlabeled(desc: &'static MetricDesc, value: f64) -> Self {
        Self {
            desc,
            labels: Vec::new(),
            value,
        }
    }

    /// Pairs `label_values` with the descriptor's label names, in order.
    pub fn labeled(desc: &'static MetricDesc, label_values: &[&str], value: f64) -> Self {
        debug_assert_eq!(desc.labels.len(), label_values.len());
        Self {
            desc,
            labels: desc
                .labels
                .iter()
                .copied()
                .zip(label_values.iter().map(|v| v.to_string()))
                .collect(),
            value,
        }
    }

    pub fn name(&self) -> &'static str {
        self.desc.name
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}
