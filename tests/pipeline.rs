use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use revents::config::Registry;
use revents::error::Stage;
use revents::harness::run_harness;
use revents::pipeline::Pipeline;
use revents::store::write_json;
use revents::summary::summarize;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture_registry() -> Result<Registry> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/regions.toml");
    Ok(Registry::load(&path)?)
}

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

#[tokio::test]
async fn missing_feed_fails_only_its_region() -> Result<()> {
    let registry = fixture_registry()?;
    let outcome = Pipeline::from_registry(&registry)?
        .with_reference(reference())
        .run()
        .await;

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].region_id, "Texas");
    assert_eq!(outcome.errors[0].stage, Stage::Fetch);
    assert_eq!(outcome.events.get("Texas").map(<[_]>::len), Some(0));

    let bay = outcome.events.get("BayArea").unwrap();
    assert_eq!(bay.len(), 2);
    assert_eq!(bay[0].name, "Warehouse Party");
    assert_eq!(bay[0].timestamp_start, at(2024, 8, 11, 5));
    assert_eq!(bay[0].timestamp_end, Some(at(2024, 8, 11, 11)));
    assert_eq!(bay[0].location.city.as_deref(), Some("Oakland"));
    assert_eq!(
        bay[0].ticket_link.as_deref(),
        Some("https://tickets.example.com/1")
    );

    assert_eq!(bay[1].name, "Winter Show");
    assert_eq!(bay[1].timestamp_start, at(2025, 1, 6, 5));
    assert_eq!(bay[1].timestamp_end, None);
    assert_eq!(bay[1].genres, vec!["dubstep", "bass music", "drum and bass"]);
    assert_eq!(bay[1].ticket_link, None);
    assert_eq!(bay[1].event_link, None);

    let seattle = outcome.events.get("Seattle").unwrap();
    assert_eq!(seattle.len(), 1);
    assert_eq!(seattle[0].timestamp_start, at(2024, 8, 10, 1));
    assert_eq!(seattle[0].timestamp_end, Some(at(2024, 8, 10, 6)));

    let skipped: Vec<(&str, usize)> = outcome
        .reports
        .iter()
        .map(|r| (r.region_id.as_str(), r.skipped))
        .collect();
    assert_eq!(skipped, vec![("BayArea", 1), ("Seattle", 1), ("Texas", 0)]);

    Ok(())
}

#[tokio::test]
async fn repeated_runs_write_identical_files() -> Result<()> {
    let registry = fixture_registry()?;
    let pipeline = Pipeline::from_registry(&registry)?.with_reference(reference());
    let dir = tempdir()?;
    let first = dir.path().join("first/events.json");
    let second = dir.path().join("second/events.json");

    write_json(&first, &pipeline.run().await.events)?;
    write_json(&second, &pipeline.run().await.events)?;

    let written = fs::read(&first)?;
    assert_eq!(written, fs::read(&second)?);

    let json: serde_json::Value = serde_json::from_slice(&written)?;
    let winter = &json["BayArea"][1];
    assert_eq!(winter["timestamp_start"], "2025-01-06T05:00:00Z");
    assert!(winter["timestamp_end"].is_null());
    assert!(winter["ticket_link"].is_null());
    assert_eq!(json["Texas"], serde_json::json!([]));

    Ok(())
}

#[tokio::test]
async fn harness_reports_identical_runs() -> Result<()> {
    let registry = fixture_registry()?;
    let report = run_harness(&registry, reference()).await?;

    assert!(report.identical);
    assert_eq!(report.first_digest, report.second_digest);
    assert_eq!(report.regions, 3);
    assert_eq!(report.region_errors, 1);
    assert_eq!(report.first_run_events, 3);
    assert_eq!(report.second_run_events, 3);

    Ok(())
}

#[tokio::test]
async fn summary_counts_fixture_events() -> Result<()> {
    let registry = fixture_registry()?.retain("BayArea")?;
    let outcome = Pipeline::from_registry(&registry)?
        .with_reference(reference())
        .run()
        .await;

    let summary = summarize(&outcome.events);
    assert_eq!(summary.events, 2);
    assert_eq!(summary.genres.get("techno"), Some(&1));
    assert_eq!(summary.genres.get("drum and bass"), Some(&1));
    assert_eq!(summary.cities.all.get("San Francisco"), Some(&1));
    assert_eq!(summary.cities.by_region["BayArea"].len(), 2);
    assert_eq!(summary.minimum_ages.get(&21), Some(&1));
    assert_eq!(summary.minimum_ages.get(&18), Some(&1));

    Ok(())
}
