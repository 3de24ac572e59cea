use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use revents::config::Registry;
use revents::fetch::FeedFetcher;
use revents::harness::run_harness;
use revents::pipeline::Pipeline;
use revents::store::write_json;
use revents::summary::summarize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "revents", about = "Regional event feed ingestion")]
struct Cli {
    /// Region registry to use instead of the bundled one.
    #[arg(long)]
    regions: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run {
        #[arg(long)]
        region: Option<String>,
        #[arg(long, value_parser = parse_reference)]
        reference: Option<DateTime<Utc>>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Summary {
        #[arg(long)]
        region: Option<String>,
        #[arg(long, value_parser = parse_reference)]
        reference: Option<DateTime<Utc>>,
    },
    Validate,
    Harness {
        #[arg(long, value_parser = parse_reference)]
        reference: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let registry = load_registry(cli.regions.as_deref())?;

    match cli.command {
        Commands::Run {
            region,
            reference,
            out,
        } => {
            let registry = narrow(registry, region.as_deref())?;
            let outcome = pipeline(&registry, reference)?.run().await;

            match out {
                Some(path) => {
                    write_json(&path, &outcome.events)?;
                    info!(
                        path = %path.display(),
                        events = outcome.events.total_events(),
                        "wrote event collection"
                    );
                }
                None => println!("{}", serde_json::to_string_pretty(&outcome.events)?),
            }
        }
        Commands::Summary { region, reference } => {
            let registry = narrow(registry, region.as_deref())?;
            let outcome = pipeline(&registry, reference)?.run().await;
            println!("{}", serde_json::to_string_pretty(&summarize(&outcome.events))?);
        }
        Commands::Validate => {
            for region in registry.regions() {
                println!(
                    "ok: {} ({}) tz={} source={}",
                    region.id, region.name, region.timezone, region.source_locator
                );
            }
            println!("{} regions valid", registry.regions().len());
        }
        Commands::Harness { reference } => {
            let report = run_harness(&registry, reference.unwrap_or_else(Utc::now)).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_registry(path: Option<&Path>) -> Result<Registry> {
    match path {
        Some(path) => Registry::load(path)
            .with_context(|| format!("failed to load region registry {}", path.display())),
        None => Registry::builtin().context("bundled region registry is invalid"),
    }
}

fn narrow(registry: Registry, region: Option<&str>) -> Result<Registry> {
    match region {
        Some(id) => Ok(registry.retain(id)?),
        None => Ok(registry),
    }
}

fn pipeline(
    registry: &Registry,
    reference: Option<DateTime<Utc>>,
) -> Result<Pipeline<FeedFetcher>> {
    let pipeline = Pipeline::from_registry(registry).context("failed to build feed fetcher")?;
    Ok(match reference {
        Some(reference) => pipeline.with_reference(reference),
        None => pipeline,
    })
}

fn parse_reference(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("expected an RFC 3339 instant: {err}"))
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}
