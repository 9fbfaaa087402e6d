use crate::config::Configuration;
use crate::datasource::FsReader;
use crate::datasource::passwd::Passwd;
use crate::domain::Collector;
use crate::metrics::collector::BusinessMetricsCollector;
use crate::metrics::registry::BusinessMetrics;
use crate::metrics::users::UserCount;
use std::sync::Arc;

/// Registers the business metrics that ship with the service.
pub fn init_business_metrics(config: &Configuration, registry: &mut BusinessMetrics) {
    let data_source = Passwd::new(FsReader::new(), config.users.passwd_file.clone());
    UserCount::new(config.users.clone(), data_source).register(registry);
}

pub fn init_collector(config: &Configuration, registry: BusinessMetrics) -> Arc<dyn Collector> {
    tracing::info!(
        gauges = ?registry.names().collect::<Vec<_>>(),
        max_workers = config.business_metrics.max_workers,
        isolate_failures = config.business_metrics.isolate_failures,
        "Registered {} business metrics",
        registry.len()
    );

    Arc::new(BusinessMetricsCollector::new(
        config.business_metrics.clone(),
        Arc::new(registry),
    ))
}
