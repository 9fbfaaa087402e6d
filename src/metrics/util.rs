use prometheus::proto::{MetricFamily, MetricType};

pub fn gauge(name: &str, help: &str, value: f64) -> MetricFamily {
    let mut mf = MetricFamily::default();
    mf.set_name(name.to_owned());
    mf.set_help(help.to_owned());
    mf.set_field_type(MetricType::GAUGE);

    let mut m = prometheus::proto::Metric::default();

    let mut g = prometheus::proto::Gauge::default();
    g.set_value(value);
    m.set_gauge(g);

    mf.set_metric(vec![m]);
    mf
}

pub fn encode(families: &[MetricFamily]) -> anyhow::Result<String> {
    let encoder = prometheus::TextEncoder::new();
    Ok(encoder.encode_to_string(families)?)
}

/// Value of the first unlabelled sample called `name` in an exposition body.
#[cfg(test)]
pub(crate) fn sample_value(text: &str, name: &str) -> Option<f64> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once(' '))
        .find(|(metric, _)| *metric == name)
        .and_then(|(_, value)| value.trim().parse().ok())
}
