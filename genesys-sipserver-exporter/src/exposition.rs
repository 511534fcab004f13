//! Prometheus and OpenMetrics text exposition.

use std::fmt::Write;

use crate::error::EncodingError;
use crate::metric::{MetricFamily, Sample, SampleValue};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Exposition format of a scrape response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Prometheus text format 0.0.4.
    #[default]
    Prometheus,
    /// OpenMetrics text format 1.0.0.
    OpenMetrics,
}

impl Format {
    /// Pick the format from an `Accept` header.
    ///
    /// OpenMetrics is used only when the client lists it; everything else,
    /// including a missing header, gets the Prometheus text format.
    pub fn negotiate(accept: Option<&str>) -> Self {
        let Some(accept) = accept else {
            return Format::Prometheus;
        };

        let wants_openmetrics = accept.split(',').any(|range| {
            range
                .split(';')
                .next()
                .is_some_and(|media| media.trim() == "application/openmetrics-text")
        });

        if wants_openmetrics {
            Format::OpenMetrics
        } else {
            Format::Prometheus
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Prometheus => PROMETHEUS_CONTENT_TYPE,
            Format::OpenMetrics => OPENMETRICS_CONTENT_TYPE,
        }
    }
}

/// Render metric families in the given format.
pub fn encode(families: &[MetricFamily], format: Format) -> Result<String, EncodingError> {
    let mut output = String::with_capacity(families.len() * 200);

    for family in families {
        let sample_name = family.sample_name();

        // 0.0.4 describes counters by their sample name, OpenMetrics by the base name.
        let (meta_name, type_str, help) = match format {
            Format::Prometheus => (
                sample_name.as_str(),
                family.kind.prometheus_type(),
                escape_help(&family.help, false),
            ),
            Format::OpenMetrics => (
                family.name,
                family.kind.openmetrics_type(),
                escape_help(&family.help, true),
            ),
        };

        writeln!(output, "# HELP {} {}", meta_name, help).ok();
        writeln!(output, "# TYPE {} {}", meta_name, type_str).ok();

        for sample in &family.samples {
            write_sample(&mut output, family, &sample_name, sample)?;
        }
    }

    if format == Format::OpenMetrics {
        writeln!(output, "# EOF").ok();
    }

    Ok(output)
}

fn write_sample(
    output: &mut String,
    family: &MetricFamily,
    sample_name: &str,
    sample: &Sample,
) -> Result<(), EncodingError> {
    if sample.labels.len() != family.label_names.len() {
        return Err(EncodingError::LabelArity {
            name: family.name.to_string(),
            expected: family.label_names.len(),
            actual: sample.labels.len(),
        });
    }

    let mut labels: Vec<(&str, &str)> = family
        .label_names
        .iter()
        .copied()
        .zip(sample.labels.iter().map(String::as_str))
        .collect();

    match &sample.value {
        SampleValue::Number(value) => {
            writeln!(
                output,
                "{}{} {}",
                sample_name,
                format_labels(&labels),
                format_value(*value)
            )
            .ok();
        }
        SampleValue::States(states) => {
            // Each state is its own line, keyed by a label named after the family.
            for (state, active) in states {
                labels.push((family.name, *state));
                writeln!(
                    output,
                    "{}{} {}",
                    sample_name,
                    format_labels(&labels),
                    if *active { 1 } else { 0 }
                )
                .ok();
                labels.pop();
            }
        }
    }

    Ok(())
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape HELP text. OpenMetrics additionally escapes double quotes.
fn escape_help(help: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(help.len());
    for c in help.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '"' if escape_quotes => result.push_str("\\\""),
            _ => result.push(c),
        }
    }
    result
}

/// Format a floating point value for Prometheus.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Format labels for the exposition format, in the given order.
fn format_labels(labels: &[(&str, &str)]) -> String {
    if labels.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    format!("{{{}}}", parts.join(","))
}
