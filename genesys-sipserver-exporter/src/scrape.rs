//! One scrape: fetch a target's status document and turn it into metric
//! families.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::fetch::StatusFetcher;
use crate::mapping::map_document;
use crate::metric::{MetricFamily, MetricKind, SampleValue};
use crate::schema::{SCRAPE_DURATION, UP};

/// Runs scrapes against the target named in each request.
///
/// Holds no per-target state, so concurrent scrapes of the same or
/// different targets never interact.
#[derive(Debug, Clone)]
pub struct Scraper {
    fetcher: StatusFetcher,
}

/// Create a shareable scraper handle.
pub type SharedScraper = Arc<Scraper>;

impl Scraper {
    pub fn new(fetcher: StatusFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch and map one target, failing on the first problem.
    pub async fn collect(&self, target: &str) -> Result<Vec<MetricFamily>, ScrapeError> {
        let doc = self.fetcher.fetch_document(target).await?;
        Ok(map_document(&doc)?)
    }

    /// Scrape a target, absorbing failures.
    ///
    /// Without a target nothing is fetched and nothing is returned. With a
    /// target, the target's families (all of them or none) are followed by
    /// the `up` and scrape duration series.
    pub async fn scrape(&self, target: Option<&str>) -> Vec<MetricFamily> {
        let Some(target) = target else {
            return Vec::new();
        };

        let started = Instant::now();
        let (mut families, up) = match self.collect(target).await {
            Ok(families) => {
                debug!(instance = %target, families = families.len(), "Scrape succeeded");
                (families, true)
            }
            Err(e) => {
                warn!(instance = %target, error = %e, "Scrape failed");
                (Vec::new(), false)
            }
        };

        families.push(
            MetricFamily::new(
                UP,
                "Whether the SIP Server status page was fetched and mapped successfully",
                MetricKind::Gauge,
                &[],
            )
            .with_sample(Vec::new(), SampleValue::Number(if up { 1.0 } else { 0.0 })),
        );
        families.push(
            MetricFamily::new(
                SCRAPE_DURATION,
                "Time spent fetching and mapping the SIP Server status page",
                MetricKind::Gauge,
                &[],
            )
            .with_sample(
                Vec::new(),
                SampleValue::Number(started.elapsed().as_secs_f64()),
            ),
        );

        families
    }
}
