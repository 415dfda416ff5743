use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::Value;
use tracing::warn;

use vbdb::config::DEFAULT_DB_PATH;
use vbdb::league::{EntityKind, League};
use vbdb::logging;
use vbdb::normalize::{KeyPolicy, LeagueRules};
use vbdb::pipeline::import_records;
use vbdb::record::RawRecord;
use vbdb::store::Store;

/// Loads a saved JSON array of scraped results into one league's results
/// table. NCAA match ids come from each entry's `box_score` URL.
#[derive(Debug, Parser)]
#[command(name = "import_results")]
struct Cli {
    /// JSON file holding an array of result objects
    input: PathBuf,
    #[arg(long, default_value = "ncaaw")]
    league: League,
    #[arg(long, env = "VBDB_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,
    #[arg(long = "strict-keys", env = "VBDB_STRICT_KEYS")]
    strict_keys: bool,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init("info")?;

    let cli = Cli::parse();
    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("read {}", cli.input.display()))?;
    let records = load_records(&raw)?;

    let policy = if cli.strict_keys {
        KeyPolicy::RejectEmpty
    } else {
        KeyPolicy::Lenient
    };
    let mut store = Store::open(&cli.db_path)?;
    let counts = import_records(
        &mut store,
        cli.league,
        &LeagueRules::for_league(cli.league),
        EntityKind::Results,
        &records,
        policy,
    )?;
    store.close()?;

    println!("Results import complete");
    println!("DB: {}", cli.db_path.display());
    println!("League: {}", cli.league);
    println!(
        "Records: {} upserted={} skipped={}",
        records.len(),
        counts.written,
        counts.skipped
    );
    Ok(())
}

fn load_records(raw: &str) -> Result<Vec<RawRecord>> {
    let parsed: Value = serde_json::from_str(raw).context("parse results json")?;
    let Value::Array(items) = parsed else {
        bail!("expected a JSON array of results");
    };
    let total = items.len();
    let records = items
        .into_iter()
        .filter_map(RawRecord::from_value)
        .collect::<Vec<_>>();
    if records.len() < total {
        warn!(
            ignored = total - records.len(),
            "ignored non-object entries in results file"
        );
    }
    Ok(records)
}
