use crate::config::Registry;
use crate::fetch::FeedSource;
use crate::model::EventCollection;
use crate::pipeline::Pipeline;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub regions: usize,
    pub region_errors: usize,
    pub first_run_events: usize,
    pub second_run_events: usize,
    pub first_digest: String,
    pub second_digest: String,
    pub identical: bool,
}

pub async fn run_harness(registry: &Registry, reference: DateTime<Utc>) -> Result<HarnessReport> {
    let pipeline = Pipeline::from_registry(registry)
        .context("failed to build feed fetcher")?
        .with_reference(reference);
    compare_runs(&pipeline).await
}

pub async fn compare_runs<S: FeedSource + 'static>(pipeline: &Pipeline<S>) -> Result<HarnessReport> {
    let first = pipeline.run().await;
    let second = pipeline.run().await;

    let first_digest = digest(&first.events)?;
    let second_digest = digest(&second.events)?;
    let identical = first_digest == second_digest;

    info!(
        first = %first_digest,
        second = %second_digest,
        identical,
        "harness comparison"
    );

    Ok(HarnessReport {
        regions: pipeline.regions().len(),
        region_errors: first.errors.len().max(second.errors.len()),
        first_run_events: first.events.total_events(),
        second_run_events: second.events.total_events(),
        first_digest,
        second_digest,
        identical,
    })
}

pub fn digest(collection: &EventCollection) -> Result<String> {
    let bytes = serde_json::to_vec(collection).context("failed to serialize event collection")?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_tracks_content() -> Result<()> {
        let mut a = EventCollection::default();
        a.insert("Texas", Vec::new());
        let mut b = EventCollection::default();
        b.insert("Iowa", Vec::new());

        assert_eq!(digest(&a)?, digest(&a.clone())?);
        assert_ne!(digest(&a)?, digest(&b)?);
        assert_eq!(digest(&a)?.len(), 64);
        Ok(())
    }
}
