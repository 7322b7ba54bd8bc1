use crate::client::InsightsSource;
use crate::error::Result;
use crate::metrics::catalog::{Catalog, WORKFLOW_LABEL};
use crate::metrics::sample::MetricSample;
use crate::response::{self, WorkflowMetricItem};
use std::sync::Arc;

/// Turns one Insights fetch into gauge samples. Holds no per-scrape state, so
/// a single instance serves concurrent scrapes.
pub struct Collector {
    source: Arc<dyn InsightsSource>,
    catalog: Catalog,
    max_pages: u32,
}

impl Collector {
    pub fn new(source: Arc<dyn InsightsSource>, max_pages: u32) -> Self {
        Self {
            source,
            catalog: Catalog::default(),
            max_pages: max_pages.max(1),
        }
    }

    /// Runs a full fetch-decode-emit cycle. Never fails: upstream problems are
    /// logged and reported through `circleci_up`, with no workflow samples.
    pub async fn collect(&self) -> Vec<MetricSample> {
        let (up, items) = match self.fetch_items().await {
            Ok(items) => (1.0, items),
            Err(e) if e.is_transport() => {
                log::error!("Failed to query CircleCI Insights: {}", e);
                (0.0, Vec::new())
            }
            Err(e) => {
                log::error!("Failed to decode CircleCI Insights response: {}", e);
                (1.0, Vec::new())
            }
        };

        let mut samples = Vec::with_capacity(1 + self.catalog.workflow.len() * items.len());
        samples.push(MetricSample::unlabeled(self.catalog.up, up));

        for gauge in self.catalog.workflow {
            for item in &items {
                samples.push(MetricSample::labeled(
                    &gauge.desc,
                    &[item.name.as_str()],
                    (gauge.value)(&item.metrics),
                ));
            }
        }

        log::debug!("Collected {} workflows into {} samples", items.len(), samples.len());
        samples
    }

    async fn fetch_items(&self) -> Result<Vec<WorkflowMetricItem>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0;

        loop {
            let body = self
                .source
                .fetch_workflow_metrics(page_token.as_deref())
                .await?;
            let page = response::decode(&body)?;
            pages += 1;

            let next = page.next_page().map(str::to_string);
            items.extend(page.items);

            match next {
                Some(token) if pages < self.max_pages => page_token = Some(token),
                Some(_) => {
                    log::warn!(
                        "Insights result truncated after {} page(s); raise max-pages to follow the rest",
                        pages
                    );
                    break;
                }
                None => break,
            }
        }

        log::debug!("Fetched {} workflow(s) over {} page(s)", items.len(), pages);
        Ok(items)
    }
}
