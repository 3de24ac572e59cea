use crate::config::{Region, Registry};
use crate::error::{ConfigError, FetchCause, FetchError, RegionError, Stage};
use crate::fetch::{FeedFetcher, FeedSource};
use crate::model::{Event, RegionReport, RunOutcome};
use crate::parser::parse_rows;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub reference: DateTime<Utc>,
    pub run_timeout: Duration,
}

impl RunOptions {
    pub fn for_registry(registry: &Registry) -> Self {
        Self {
            reference: Utc::now(),
            run_timeout: registry.fetch().run_timeout(),
        }
    }
}

pub struct Pipeline<S> {
    regions: Vec<Region>,
    source: Arc<S>,
    options: RunOptions,
}

impl Pipeline<FeedFetcher> {
    pub fn from_registry(registry: &Registry) -> Result<Self, ConfigError> {
        let fetcher = FeedFetcher::new(registry.fetch())?;
        Ok(Self::new(registry, fetcher, RunOptions::for_registry(registry)))
    }
}

impl<S: FeedSource + 'static> Pipeline<S> {
    pub fn new(registry: &Registry, source: S, options: RunOptions) -> Self {
        Self {
            regions: registry.regions().to_vec(),
            source: Arc::new(source),
            options,
        }
    }

    pub fn with_reference(mut self, reference: DateTime<Utc>) -> Self {
        self.options.reference = reference;
        self
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Runs one task per region and waits for all of them. Always returns a
    /// collection; regions that failed are present with no events and have
    /// a matching entry in `errors`.
    pub async fn run(&self) -> RunOutcome {
        let reference = self.options.reference;
        let deadline = Instant::now() + self.options.run_timeout;

        info!(
            regions = self.regions.len(),
            reference = %reference,
            timeout_secs = self.options.run_timeout.as_secs_f64(),
            "pipeline run start"
        );

        let handles = self
            .regions
            .iter()
            .cloned()
            .map(|region| {
                let source = Arc::clone(&self.source);
                tokio::spawn(async move {
                    run_region(source.as_ref(), &region, reference, deadline).await
                })
            })
            .collect::<Vec<_>>();

        let results = join_all(handles).await;

        let mut outcome = RunOutcome::default();
        for (region, result) in self.regions.iter().zip(results) {
            let region_outcome = result.unwrap_or_else(|err| {
                RegionOutcome::failed(
                    region,
                    RegionError {
                        region_id: region.id.clone(),
                        stage: Stage::Parse,
                        message: format!("region task did not complete: {err}"),
                    },
                )
            });

            info!(
                region = %region.id,
                rows = region_outcome.report.rows,
                parsed = region_outcome.report.parsed,
                skipped = region_outcome.report.skipped,
                "region summary"
            );

            if let Some(error) = region_outcome.error {
                warn!(
                    region = %error.region_id,
                    stage = %error.stage,
                    error = %error.message,
                    "region failed"
                );
                outcome.errors.push(error);
            }
            outcome.events.insert(region.id.clone(), region_outcome.events);
            outcome.reports.push(region_outcome.report);
        }

        info!(
            events = outcome.events.total_events(),
            failed_regions = outcome.errors.len(),
            "pipeline run complete"
        );

        outcome
    }
}

struct RegionOutcome {
    events: Vec<Event>,
    report: RegionReport,
    error: Option<RegionError>,
}

impl RegionOutcome {
    fn failed(region: &Region, error: RegionError) -> Self {
        Self {
            events: Vec::new(),
            report: RegionReport {
                region_id: region.id.clone(),
                ..RegionReport::default()
            },
            error: Some(error),
        }
    }
}

async fn run_region<S: FeedSource + ?Sized>(
    source: &S,
    region: &Region,
    reference: DateTime<Utc>,
    deadline: Instant,
) -> RegionOutcome {
    let rows = match timeout_at(deadline, source.fetch(region)).await {
        Ok(Ok(rows)) => rows,
        Ok(Err(err)) => return RegionOutcome::failed(region, err.into()),
        Err(_) => {
            let err = FetchError::new(&region.id, FetchCause::Timeout);
            return RegionOutcome::failed(region, err.into());
        }
    };

    let parsed = parse_rows(&rows, region, reference);
    if !parsed.errors.is_empty() {
        warn!(
            region = %region.id,
            skipped = parsed.errors.len(),
            first_error = %parsed.errors[0],
            "dropped unparseable rows"
        );
    }

    RegionOutcome {
        report: RegionReport {
            region_id: region.id.clone(),
            rows: rows.len(),
            parsed: parsed.events.len(),
            skipped: parsed.errors.len(),
        },
        events: parsed.events,
        error: None,
    }
}
