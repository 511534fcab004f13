//! Normalized metric model produced by the mapper and consumed by the encoder.

/// Prometheus metric type of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    StateSet,
}

impl MetricKind {
    /// TYPE keyword in the Prometheus 0.0.4 text format.
    ///
    /// That format has no state sets, so they are exposed as gauges.
    pub fn prometheus_type(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge | MetricKind::StateSet => "gauge",
        }
    }

    /// TYPE keyword in the OpenMetrics text format.
    pub fn openmetrics_type(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::StateSet => "stateset",
        }
    }
}

/// Value of a single sample.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Number(f64),
    /// Ordered `(state, active)` pairs; at most one is active.
    States(Vec<(&'static str, bool)>),
}

/// One sample: label values (matching the family's label names) and a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Vec<String>,
    pub value: SampleValue,
}

/// All samples of one metric name for one scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    /// Base name. Counters get their `_total` suffix at encoding time.
    pub name: &'static str,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: &'static [&'static str],
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(
        name: &'static str,
        help: impl Into<String>,
        kind: MetricKind,
        label_names: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help: help.into(),
            kind,
            label_names,
            samples: Vec::new(),
        }
    }

    pub fn add(&mut self, labels: Vec<String>, value: SampleValue) {
        self.samples.push(Sample { labels, value });
    }

    pub fn with_sample(mut self, labels: Vec<String>, value: SampleValue) -> Self {
        self.add(labels, value);
        self
    }

    /// Name written on sample lines: counters carry a `_total` suffix.
    pub fn sample_name(&self) -> String {
        match self.kind {
            MetricKind::Counter => format!("{}_total", self.name),
            MetricKind::Gauge | MetricKind::StateSet => self.name.to_string(),
        }
    }

    /// Whether `name` refers to this family, by base or sample name.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.sample_name() == name
    }
}

/// Keep only the families named in `names`, in their original order.
///
/// An empty list keeps everything.
pub fn restrict(families: Vec<MetricFamily>, names: &[String]) -> Vec<MetricFamily> {
    if names.is_empty() {
        return families;
    }
    families
        .into_iter()
        .filter(|family| names.iter().any(|name| family.is_named(name)))
        .collect()
}
