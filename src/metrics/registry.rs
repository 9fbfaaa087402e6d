use crate::domain::Producer;
use crate::metrics::util::gauge;
use prometheus::proto::MetricFamily;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A named gauge whose value is sampled from its producer at scrape time.
#[derive(Clone)]
pub struct GaugeDefinition {
    name: String,
    documentation: String,
    producer: Arc<dyn Producer>,
}

impl GaugeDefinition {
    pub fn new(
        name: impl Into<String>,
        documentation: impl Into<String>,
        producer: impl Producer,
    ) -> Self {
        Self {
            name: name.into(),
            documentation: documentation.into(),
            producer: Arc::new(producer),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// Calls the producer once and packages the value as a gauge family.
    ///
    /// Blocks for as long as the producer does.
    pub fn evaluate(&self) -> anyhow::Result<MetricFamily> {
        let value = self.producer.produce()?;
        Ok(gauge(&self.name, &self.documentation, value))
    }
}

impl fmt::Debug for GaugeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaugeDefinition")
            .field("name", &self.name)
            .field("documentation", &self.documentation)
            .finish_non_exhaustive()
    }
}

/// The set of business metrics exposed by the service, keyed by name.
///
/// Registration needs exclusive access, so the registry is populated during
/// start-up and then shared read-only with the collector.
#[derive(Debug, Clone, Default)]
pub struct BusinessMetrics {
    gauges: BTreeMap<String, GaugeDefinition>,
}

impl BusinessMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `producer` as a gauge and hands it back unchanged.
    ///
    /// When `name` is `None` it is derived from the producer's identifier,
    /// i.e. the function name for fn items. Closures do not have one and
    /// end up named after the enclosing function, so give them a name.
    /// A later registration under the same name replaces the earlier one.
    #[must_use = "use `register` when the producer is not needed back"]
    pub fn add<F, T>(&mut self, name: Option<&str>, documentation: &str, producer: F) -> F
    where
        F: Fn() -> anyhow::Result<T> + Clone + Send + Sync + 'static,
        T: num_traits::ToPrimitive,
    {
        let name = match name {
            Some(name) => name.to_owned(),
            None => derive_name::<F>(),
        };

        self.register(&name, documentation, producer.clone());
        producer
    }

    /// Registers `producer` under `name`, replacing any gauge of that name.
    pub fn register<F, T>(&mut self, name: &str, documentation: &str, producer: F)
    where
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
        T: num_traits::ToPrimitive,
    {
        self.add_gauge(GaugeDefinition::new(name, documentation, producer));
    }

    pub fn add_gauge(&mut self, gauge: GaugeDefinition) {
        if let Some(previous) = self.gauges.insert(gauge.name.clone(), gauge) {
            tracing::debug!(name = previous.name(), "Replaced business metric");
        }
    }

    pub fn get(&self, name: &str) -> Option<&GaugeDefinition> {
        self.gauges.get(name)
    }

    pub fn gauges(&self) -> impl ExactSizeIterator<Item = &GaugeDefinition> {
        self.gauges.values()
    }

    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.gauges.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }
}

fn derive_name<F>() -> String {
    let type_name = std::any::type_name::<F>();
    let path = match type_name.split_once('<') {
        Some((path, _generics)) => path,
        None => type_name,
    };

    path.rsplit("::")
        .find(|segment| !segment.is_empty() && !segment.starts_with('{'))
        .unwrap_or(type_name)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_subscriptions() -> anyhow::Result<u32> {
        Ok(7)
    }

    trait Store {
        fn count() -> usize;
    }

    struct Users;

    impl Store for Users {
        fn count() -> usize {
            3
        }
    }

    fn generic_count<S: Store>() -> anyhow::Result<usize> {
        Ok(S::count())
    }

    #[test]
    fn test_add_returns_the_producer() {
        let mut registry = BusinessMetrics::new();
        let producer = registry.add(Some("answer"), "The answer", || Ok(42u8));

        assert_eq!(42, producer().unwrap());
        assert_eq!(1, registry.len());
    }

    #[test]
    fn test_add_derives_name_from_function() {
        let mut registry = BusinessMetrics::new();
        let producer = registry.add(None, "Active subscriptions", active_subscriptions);
        assert_eq!(7, producer().unwrap());

        let gauge = registry
            .get("active_subscriptions")
            .expect("gauge should be registered under the function name");
        assert_eq!("Active subscriptions", gauge.documentation());
    }

    #[test]
    fn test_add_derives_name_from_generic_function() {
        let mut registry = BusinessMetrics::new();
        let producer = registry.add(None, "Users in the store", generic_count::<Users>);
        assert_eq!(3, producer().unwrap());

        assert_eq!(vec!["generic_count"], registry.names().collect::<Vec<_>>());
    }

    #[test]
    fn test_add_names_closures_after_enclosing_function() {
        let mut registry = BusinessMetrics::new();
        let producer = registry.add(None, "", || Ok(1));
        assert_eq!(1, producer().unwrap());

        assert_eq!(
            vec!["test_add_names_closures_after_enclosing_function"],
            registry.names().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = BusinessMetrics::new();
        registry.register("users_total", "First", || Ok(1));
        registry.register("users_total", "Second", || Ok(2));

        assert_eq!(1, registry.len());
        let gauge = registry.get("users_total").unwrap();
        assert_eq!("Second", gauge.documentation());

        let text = crate::metrics::util::encode(&[gauge.evaluate().unwrap()]).unwrap();
        assert_eq!(
            Some(2.0),
            crate::metrics::util::sample_value(&text, "users_total")
        );
    }

    #[test]
    fn test_registration_is_not_validated() {
        let mut registry = BusinessMetrics::new();
        registry.register("", "", || Ok(0));
        registry.register("not a metric name", "", || Ok(0));

        assert_eq!(2, registry.len());
    }

    #[test]
    fn test_names_are_iterated_in_order() {
        let mut registry = BusinessMetrics::new();
        registry.register("b", "", || Ok(2));
        registry.register("a", "", || Ok(1));
        registry.register("c", "", || Ok(3));

        assert_eq!(vec!["a", "b", "c"], registry.names().collect::<Vec<_>>());
    }

    #[test]
    fn test_evaluate_propagates_producer_error() {
        let gauge = GaugeDefinition::new("broken", "", || -> anyhow::Result<f64> {
            anyhow::bail!("database is down")
        });

        let error = gauge.evaluate().unwrap_err();
        assert_eq!("database is down", error.to_string());
    }

    #[test]
    fn test_unrepresentable_value_becomes_nan() {
        struct Opaque;

        impl num_traits::ToPrimitive for Opaque {
            fn to_i64(&self) -> Option<i64> {
                None
            }

            fn to_u64(&self) -> Option<u64> {
                None
            }

            fn to_f64(&self) -> Option<f64> {
                None
            }
        }

        let gauge = GaugeDefinition::new("opaque", "", || anyhow::Ok(Opaque));
        let text = crate::metrics::util::encode(&[gauge.evaluate().unwrap()]).unwrap();

        let value = crate::metrics::util::sample_value(&text, "opaque").unwrap();
        assert!(value.is_nan());
    }
}
