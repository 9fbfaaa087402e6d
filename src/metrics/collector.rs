use crate::domain::Collector;
use crate::metrics::registry::{BusinessMetrics, GaugeDefinition};
use crate::metrics::util::encode;
use anyhow::Context;
use futures::StreamExt;
use prometheus::proto::MetricFamily;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_workers: usize,
    pub isolate_failures: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: 5,
            isolate_failures: false,
        }
    }
}

/// Samples every registered business metric on each scrape.
///
/// Producers run on blocking worker threads with at most `max_workers` of
/// them in flight, and a collection only finishes once every producer has
/// returned. Unless failures are isolated, the first failure in registry
/// order fails the whole collection.
pub struct BusinessMetricsCollector {
    config: Config,
    registry: Arc<BusinessMetrics>,
}

impl BusinessMetricsCollector {
    pub fn new(config: Config, registry: Arc<BusinessMetrics>) -> Self {
        Self { config, registry }
    }

    fn workers(&self) -> usize {
        self.config.max_workers.max(1)
    }
}

/// Evaluates one gauge on a blocking thread. A family the text encoder
/// would refuse counts as a failure of that gauge alone.
async fn evaluate_on_worker(gauge: GaugeDefinition) -> anyhow::Result<MetricFamily> {
    let name = gauge.name().to_owned();

    let family = tokio::task::spawn_blocking(move || gauge.evaluate())
        .await
        .with_context(|| format!("Business metric [{}] panicked", name))?
        .with_context(|| format!("Failed to evaluate business metric [{}]", name))?;

    encode(std::slice::from_ref(&family))
        .with_context(|| format!("Cannot encode business metric [{}]", name))?;

    Ok(family)
}

#[async_trait::async_trait]
impl Collector for BusinessMetricsCollector {
    #[tracing::instrument(level = "debug", skip_all, fields(gauges = self.registry.len()))]
    async fn collect(&self) -> anyhow::Result<Vec<MetricFamily>> {
        let gauges = self.registry.gauges().cloned().collect::<Vec<_>>();
        let mut families = Vec::with_capacity(gauges.len());
        let mut first_error = None;

        let mut results = futures::stream::iter(gauges)
            .map(evaluate_on_worker)
            .buffered(self.workers());

        // Drained to the end even after a failure: no producer outlives the scrape.
        while let Some(result) = results.next().await {
            match result {
                Ok(family) => families.push(family),

                Err(error) if self.config.isolate_failures => {
                    tracing::error!(?error, "A business metric failed and was skipped");
                }

                Err(error) => {
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }

        tracing::debug!("Collected {} business metrics", families.len());
        Ok(families)
    }
}
