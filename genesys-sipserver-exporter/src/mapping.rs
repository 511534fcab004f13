//! Mapping from a SIP Server status document to Prometheus metric families.
//!
//! Mapping is all-or-nothing: any required node that is missing or holds an
//! unexpected value fails the whole document, so a scrape never exports a
//! half-populated or inconsistently labelled set of series.

use crate::document::{Element, StatusDocument};
use crate::error::MappingError;
use crate::metric::{MetricFamily, MetricKind, SampleValue};
use crate::schema::{
    APP_LABELS, APP_NAME, APP_VERSION, HA_ROLE, HA_ROLE_STATES, HELP_ATTRIBUTE, SCALAR_SERIES,
    ScalarSeries, TRUNK_CALLS, TRUNK_CAPACITY, TRUNK_CAPACITY_SERIES, TRUNK_CURRENT_CALLS,
    TRUNK_IN_SERVICE, TRUNK_IN_SERVICE_SERIES, TRUNK_LABELS, TRUNK_NAME, TRUNK_ROW, TRUNK_TABLE,
    UNKNOWN_HA_ROLE,
};

/// Label values shared by every sample of one scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLabels {
    pub name: String,
    pub version: String,
    pub ha_role: String,
}

impl AppLabels {
    /// Read the application identity from the document.
    pub fn from_document(root: &Element) -> Result<Self, MappingError> {
        let ha_role = ha_role_label(root.text_at(HA_ROLE)?).unwrap_or(UNKNOWN_HA_ROLE);

        Ok(Self {
            name: root.text_at(APP_NAME)?.to_string(),
            version: root.text_at(APP_VERSION)?.to_string(),
            ha_role: ha_role.to_string(),
        })
    }

    /// Values in [`APP_LABELS`] order.
    pub fn values(&self) -> Vec<String> {
        vec![self.name.clone(), self.version.clone(), self.ha_role.clone()]
    }

    /// Values in [`TRUNK_LABELS`] order.
    pub fn with_trunk(&self, trunk_name: &str) -> Vec<String> {
        let mut values = self.values();
        values.push(trunk_name.to_string());
        values
    }
}

/// State label for an HA role text, if it is one of the known roles.
pub fn ha_role_label(text: &str) -> Option<&'static str> {
    HA_ROLE_STATES
        .iter()
        .find(|(raw, _)| *raw == text)
        .map(|(_, label)| *label)
}

/// Build a state set from raw text.
///
/// The state whose raw text equals `text` exactly is active. Unknown text
/// leaves every state inactive.
pub fn map_states(
    text: &str,
    states: &'static [(&'static str, &'static str)],
) -> Vec<(&'static str, bool)> {
    states
        .iter()
        .map(|(raw, label)| (*label, *raw == text))
        .collect()
}

/// Map a whole status document.
///
/// Families come out in a fixed order: the scalar series in
/// [`SCALAR_SERIES`] order, then trunk calls, capacity and in-service.
pub fn map_document(doc: &StatusDocument) -> Result<Vec<MetricFamily>, MappingError> {
    let root = doc.root();
    let labels = AppLabels::from_document(root)?;

    let mut families = Vec::with_capacity(SCALAR_SERIES.len() + 3);
    for series in SCALAR_SERIES {
        families.push(map_scalar(root, series, &labels)?);
    }

    let table = root.node(TRUNK_TABLE)?;
    families.extend(map_trunks(table, &labels)?);

    Ok(families)
}

fn map_scalar(
    root: &Element,
    series: &ScalarSeries,
    labels: &AppLabels,
) -> Result<MetricFamily, MappingError> {
    let help = root.attr_at(series.path, HELP_ATTRIBUTE)?;

    let value = match series.kind {
        MetricKind::StateSet => {
            SampleValue::States(map_states(root.text_at(series.path)?, series.states))
        }
        MetricKind::Counter | MetricKind::Gauge => {
            SampleValue::Number(root.number_at(series.path)?)
        }
    };

    Ok(MetricFamily::new(series.name, help, series.kind, APP_LABELS)
        .with_sample(labels.values(), value))
}

/// Map the rows of the trunk table into the calls, capacity and in-service
/// families.
///
/// Rows keep document order. Repeated trunk names are passed through as-is.
pub fn map_trunks(table: &Element, labels: &AppLabels) -> Result<[MetricFamily; 3], MappingError> {
    let mut calls = MetricFamily::new(TRUNK_CALLS, "Calls", MetricKind::Gauge, TRUNK_LABELS);
    let mut capacity = MetricFamily::new(
        TRUNK_CAPACITY_SERIES,
        "Capacity",
        MetricKind::Gauge,
        TRUNK_LABELS,
    );
    let mut in_service = MetricFamily::new(
        TRUNK_IN_SERVICE_SERIES,
        "In Service",
        MetricKind::Gauge,
        TRUNK_LABELS,
    );

    for row in table.children_named(TRUNK_ROW) {
        let trunk = row.text_at(TRUNK_NAME)?;
        let current_calls = row.number_at(TRUNK_CURRENT_CALLS)?;
        let trunk_capacity = row.number_at(TRUNK_CAPACITY)?;
        let trunk_in_service = row.flag_at(TRUNK_IN_SERVICE)?;

        calls.add(labels.with_trunk(trunk), SampleValue::Number(current_calls));
        capacity.add(labels.with_trunk(trunk), SampleValue::Number(trunk_capacity));
        in_service.add(
            labels.with_trunk(trunk),
            SampleValue::Number(if trunk_in_service { 1.0 } else { 0.0 }),
        );
    }

    Ok([calls, capacity, in_service])
}
