use num_traits::ToPrimitive;
use prometheus::proto::MetricFamily;

/// A zero-argument callable sampled at scrape time.
pub trait Producer: Send + Sync + 'static {
    fn produce(&self) -> anyhow::Result<f64>;
}

impl<F, T> Producer for F
where
    F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    T: ToPrimitive,
{
    fn produce(&self) -> anyhow::Result<f64> {
        let value = self()?;
        Ok(value.to_f64().unwrap_or(f64::NAN))
    }
}

#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    async fn collect(&self) -> anyhow::Result<Vec<MetricFamily>>;
}
