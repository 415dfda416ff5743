use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use vbdb::config::{BuildConfig, DEFAULT_DB_PATH, SourceConfig};
use vbdb::league::{EntityKind, League, parse_leagues};
use vbdb::logging;
use vbdb::normalize::KeyPolicy;
use vbdb::pipeline::{BuildSummary, SliceStatus, run_build};
use vbdb::registry::Registry;

#[derive(Debug, Parser)]
#[command(name = "vbdb", about = "Build the volleyball teams/players/results database")]
struct Cli {
    /// Leagues to import (comma-separated: lovb, pvf, ncaam, ncaaw or all)
    #[arg(long, value_delimiter = ',', default_value = "all")]
    leagues: Vec<String>,
    /// SQLite file to build
    #[arg(long, env = "VBDB_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,
    /// Import team tables
    #[arg(long, action = ArgAction::SetTrue)]
    teams: bool,
    /// Import player rosters
    #[arg(long, action = ArgAction::SetTrue)]
    rosters: bool,
    /// Import schedules and results
    #[arg(long, action = ArgAction::SetTrue)]
    schedules: bool,
    /// Copy the finished database to these paths (comma-separated)
    #[arg(long = "replica", env = "VBDB_REPLICAS", value_delimiter = ',')]
    replicas: Vec<PathBuf>,
    /// Skip copying to replicas
    #[arg(long = "no-replicate", action = ArgAction::SetTrue)]
    no_replicate: bool,
    /// Skip records whose derived key is empty instead of writing them
    #[arg(long = "strict-keys", env = "VBDB_STRICT_KEYS", action = ArgAction::SetTrue)]
    strict_keys: bool,
    /// Only scrape NCAA seasons labelled with this year
    #[arg(long, env = "VBDB_NCAA_YEAR")]
    ncaa_year: Option<String>,
}

impl Cli {
    fn kinds(&self) -> Vec<EntityKind> {
        let picked = [
            (self.teams, EntityKind::Teams),
            (self.rosters, EntityKind::Players),
            (self.schedules, EntityKind::Results),
        ]
        .into_iter()
        .filter_map(|(on, kind)| on.then_some(kind))
        .collect::<Vec<_>>();
        if picked.is_empty() {
            EntityKind::ALL.to_vec()
        } else {
            picked
        }
    }

    fn build_config(&self) -> Result<BuildConfig> {
        let mut cfg = BuildConfig::new(self.db_path.clone());
        cfg.leagues = parse_leagues(&self.leagues)?;
        cfg.kinds = self.kinds();
        if !self.no_replicate {
            cfg.replicas = self.replicas.clone();
        }
        if self.strict_keys {
            cfg.key_policy = KeyPolicy::RejectEmpty;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init("info")?;

    let cli = Cli::parse();
    let cfg = cli.build_config()?;
    let sources = SourceConfig::standard()?.with_ncaa_year(cli.ncaa_year.as_deref());
    let registry = Registry::standard(&sources);

    let summary = run_build(&cfg, &registry)
        .with_context(|| format!("build {}", cfg.db_path.display()))?;
    print_summary(&summary, &cfg.leagues);
    Ok(())
}

fn print_summary(summary: &BuildSummary, leagues: &[League]) {
    println!("Build complete");
    println!(
        "{:<8} {:>8} {:>8} {:>8}",
        "league", "teams", "players", "results"
    );
    for &league in leagues {
        println!(
            "{:<8} {:>8} {:>8} {:>8}",
            league.tag(),
            summary.count(league, EntityKind::Teams),
            summary.count(league, EntityKind::Players),
            summary.count(league, EntityKind::Results)
        );
    }
    println!(
        "{:<8} {:>8} {:>8} {:>8}",
        "total",
        summary.total(EntityKind::Teams),
        summary.total(EntityKind::Players),
        summary.total(EntityKind::Results)
    );
    println!("Rows written: {}", summary.grand_total());

    let failed = summary.failures().collect::<Vec<_>>();
    if !failed.is_empty() {
        println!("  failed slices: {}", failed.len());
        for slice in failed {
            if let SliceStatus::Failed(err) = &slice.status {
                println!("   - {} {}: {err}", slice.league, slice.kind);
            }
        }
    }

    println!("DB: {}", display_absolute(&summary.db_path));
    for replica in &summary.replicas {
        match &replica.result {
            Ok(_) => println!("Replica: {}", display_absolute(&replica.target)),
            Err(err) => println!("Replica failed: {} ({err})", replica.target.display()),
        }
    }
}

fn display_absolute(path: &std::path::Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
