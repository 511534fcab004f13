//! Static description of the exported series and where they come from in
//! the SIP Server status document.

use crate::document::NodePath;
use crate::metric::MetricKind;

/// Labels shared by every target-derived sample.
pub const APP_LABELS: &[&str] = &["app_name", "app_version", "app_ha_role"];

/// Labels of the per-trunk series.
pub const TRUNK_LABELS: &[&str] = &["app_name", "app_version", "app_ha_role", "trunk_name"];

/// Attribute carrying a node's human-readable description.
pub const HELP_ATTRIBUTE: &str = "rem";

pub const APP_NAME: NodePath = NodePath::new("sipServer/NAME");
pub const APP_VERSION: NodePath = NodePath::new("version");
pub const HA_ROLE: NodePath = NodePath::new("sipServer/HA_ROLE");

/// `(status text, state label)` pairs of the HA role state set.
pub const HA_ROLE_STATES: &[(&str, &str)] =
    &[("Primary (Active)", "primary"), ("Backup (Passive)", "backup")];

/// `app_ha_role` label value when the role text is not recognized.
pub const UNKNOWN_HA_ROLE: &str = "unknown";

/// A series read from one node, exported with [`APP_LABELS`].
#[derive(Debug, Clone, Copy)]
pub struct ScalarSeries {
    pub name: &'static str,
    pub path: NodePath,
    pub kind: MetricKind,
    /// `(node text, state label)` pairs; empty unless `kind` is a state set.
    pub states: &'static [(&'static str, &'static str)],
}

const fn gauge(name: &'static str, path: &'static str) -> ScalarSeries {
    ScalarSeries {
        name,
        path: NodePath::new(path),
        kind: MetricKind::Gauge,
        states: &[],
    }
}

const fn counter(name: &'static str, path: &'static str) -> ScalarSeries {
    ScalarSeries {
        name,
        path: NodePath::new(path),
        kind: MetricKind::Counter,
        states: &[],
    }
}

const fn state_set(
    name: &'static str,
    path: &'static str,
    states: &'static [(&'static str, &'static str)],
) -> ScalarSeries {
    ScalarSeries {
        name,
        path: NodePath::new(path),
        kind: MetricKind::StateSet,
        states,
    }
}

/// Scalar series in exposition order.
///
/// `TRASNPORT` and `NGREATINGS` are the SIP Server's own spellings.
pub const SCALAR_SERIES: &[ScalarSeries] = &[
    gauge("genesys_sipserver_thread_count", "sipServer/CORE_THREADS_COUNT"),
    gauge("genesys_sipserver_memory_usage", "sipServer/SIPS_MEMORY_USAGE"),
    gauge("genesys_sipserver_cpu_usage", "sipServer/SIPS_CPU_USAGE"),
    state_set(
        "genesys_sipserver_ha_role",
        "sipServer/HA_ROLE",
        HA_ROLE_STATES,
    ),
    counter("genesys_sipserver_calls_created", "sipCallManager/NCALLSCREATED"),
    gauge("genesys_sipserver_calls", "sipCallManager/NCALLS"),
    gauge("genesys_sipserver_parties", "sipCallManager/NPARTIES"),
    gauge("genesys_sipserver_connections", "sipCallManager/NCONNECTIONS"),
    gauge("genesys_sipserver_operators", "sipCallManager/NOPERATIONS"),
    gauge("genesys_sipserver_music_services", "sipCallManager/NMUSICSERVICES"),
    gauge("genesys_sipserver_treatments", "sipCallManager/NTREATMENTS"),
    gauge("genesys_sipserver_greetings", "sipCallManager/NGREATINGS"),
    gauge("genesys_sipserver_recorders", "sipCallManager/NRECORDERS"),
    gauge("genesys_sipserver_mcu_channels", "sipCallManager/NMCUCHANNELS"),
    counter("genesys_sipserver_calls_abandoned", "sipCallManager/NCALLSABANDONED"),
    gauge("genesys_sipserver_logged_on_agents", "sipCallManager/NLOGGEDAGENTS"),
    gauge("genesys_sipserver_ntlibclients", "sipCallManager/NTLIBCLIENTS"),
    gauge("genesys_sipserver_nregistereddns", "sipCallManager/NREGISTEREDDNS"),
    gauge("genesys_sipserver_nsipregisteredep", "sipCallManager/NSIPREGISTEREDEP"),
    gauge("genesys_sipserver_nsipexpiredregs", "sipCallManager/NSIPEXPIREDREGS"),
    gauge(
        "genesys_sipserver_pm_nactive_registrations",
        "sipPresenceManager/PM_NACTIVE_REGISTRATIONS",
    ),
    gauge("genesys_sipserver_tl_ntransports", "sipTransportLayer/TL_NTRANSPORTS"),
    gauge("genesys_sipserver_sips_process_id", "sipServer/SIPS_PROCESS_ID"),
    gauge("genesys_sipserver_queue_main_cm", "sipServer/QUEUE_MAIN_CM"),
    gauge("genesys_sipserver_queue_cm_main", "sipServer/QUEUE_CM_MAIN"),
    gauge("genesys_sipserver_queue_from_trasnport", "sipServer/QUEUE_FROM_TRASNPORT"),
    gauge("genesys_sipserver_queue_to_trasnport", "sipServer/QUEUE_TO_TRASNPORT"),
    gauge("genesys_sipserver_readiness_switchover", "sipServer/READINESS_SWITCHOVER"),
    gauge("genesys_sipserver_readiness_upgrade", "sipServer/READINESS_UPGRADE"),
    gauge("genesys_sipserver_num_sipps", "sipServer/NUM_SIPPS"),
    gauge("genesys_sipserver_num_msmls", "sipServer/NUM_MSMLS"),
    gauge("genesys_sipserver_num_trunks", "sipServer/NUM_TRUNKS"),
    gauge("genesys_sipserver_num_softswitches", "sipServer/NUM_SOFTSWITCHES"),
    gauge("genesys_sipserver_ha_link", "sipServer/HA_LINK"),
    gauge("genesys_sipserver_connection_to_scs", "sipServer/CONNECTION_TO_SCS"),
    gauge("genesys_sipserver_application_service", "sipServer/APPLICATION_SERVICE"),
    counter(
        "genesys_sipserver_call_recording_failed",
        "sipCallManager/NCALLRECORDINGFAILED",
    ),
];

pub const TRUNK_TABLE: NodePath =
    NodePath::new(r#"sipTrunkStatistics/sipTrunkStatistics[@id="sipTrunkTable"]"#);
pub const TRUNK_ROW: &str = "sipTrunkData";
pub const TRUNK_NAME: NodePath = NodePath::new("TRUNK");
pub const TRUNK_CURRENT_CALLS: NodePath = NodePath::new("CURRENT_CALLS");
pub const TRUNK_CAPACITY: NodePath = NodePath::new("CAPACITY");
pub const TRUNK_IN_SERVICE: NodePath = NodePath::new("IN_SERVICE");

pub const TRUNK_CALLS: &str = "genesys_sipserver_trunk_calls";
pub const TRUNK_CAPACITY_SERIES: &str = "genesys_sipserver_trunk_capacity";
pub const TRUNK_IN_SERVICE_SERIES: &str = "genesys_sipserver_trunk_in_service";

/// Exporter-owned series describing the scrape itself.
pub const UP: &str = "genesys_sipserver_up";
pub const SCRAPE_DURATION: &str = "genesys_sipserver_scrape_duration_seconds";
