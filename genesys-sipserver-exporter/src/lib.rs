//! Prometheus exporter for Genesys SIP Server.
//!
//! Each scrape names the SIP Server to report on with a `target` query
//! parameter. The exporter fetches that server's `/serverx` status page,
//! maps its fields to a fixed set of metric families and renders them in the
//! Prometheus (or OpenMetrics) text format. Nothing is kept between scrapes.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  GET /metrics?target=sips01:8080  ┌───────────────┐
//! │ Prometheus │──────────────────────────────────>│  HTTP Server  │
//! └────────────┘                                   └───────┬───────┘
//!                                                          │
//!        ┌──────────────┐     ┌──────────────┐     ┌───────▼───────┐
//!        │  Exposition  │<────│   Mapping    │<────│    Fetcher    │──> GET /serverx
//!        └──────────────┘     └──────────────┘     └───────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! genesys-sipserver-exporter --config config.json5
//! curl 'http://localhost:8001/metrics?target=sips01:8080'
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod config;
pub mod document;
pub mod error;
pub mod exposition;
pub mod fetch;
pub mod http;
pub mod mapping;
pub mod metric;
pub mod schema;
pub mod scrape;

pub use config::ExporterConfig;
pub use document::StatusDocument;
pub use exposition::Format;
pub use fetch::StatusFetcher;
pub use http::HttpServer;
pub use mapping::map_document;
pub use metric::{MetricFamily, MetricKind, Sample, SampleValue};
pub use scrape::{Scraper, SharedScraper};
