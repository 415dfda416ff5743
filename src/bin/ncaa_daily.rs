use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use clap::Parser;

use vbdb::config::{DEFAULT_DB_PATH, NcaaSeasons};
use vbdb::league::{EntityKind, League};
use vbdb::logging;
use vbdb::ncaa_fetch;
use vbdb::normalize::{KeyPolicy, LeagueRules};
use vbdb::pipeline::import_records;
use vbdb::store::Store;

/// Daily NCAA men's results update: scrapes one day's scoreboard into an
/// existing database.
#[derive(Debug, Parser)]
#[command(name = "ncaa_daily")]
struct Cli {
    #[arg(long, env = "VBDB_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,
    /// Day to import (YYYY-MM-DD); yesterday when omitted
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init("info")?;

    let cli = Cli::parse();
    let day = match cli.date {
        Some(day) => day,
        None => Local::now()
            .date_naive()
            .pred_opt()
            .ok_or_else(|| anyhow!("no day before today"))?,
    };

    let seasons = NcaaSeasons::men()?.only_day(day);
    let records = ncaa_fetch::fetch_schedule(&seasons)
        .with_context(|| format!("fetch NCAAM results for {day}"))?;

    let mut store = Store::open(&cli.db_path)?;
    let league = League::Ncaam;
    let counts = import_records(
        &mut store,
        league,
        &LeagueRules::for_league(league),
        EntityKind::Results,
        &records,
        KeyPolicy::default(),
    )?;
    let total = store.count(league, EntityKind::Results)?;
    store.close()?;

    println!("NCAAM daily update complete");
    println!("DB: {}", cli.db_path.display());
    println!("Day: {day}");
    println!("Results upserted: {} (skipped {})", counts.written, counts.skipped);
    println!("Results in table: {total}");
    Ok(())
}
