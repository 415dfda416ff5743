//! Build orchestration: fetch, normalize, validate and upsert each
//! (league, entity) slice in turn. A failing slice becomes a zero-count
//! report; it never stops the run.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::config::BuildConfig;
use crate::league::{EntityKind, League};
use crate::normalize::{KeyPolicy, LeagueRules, normalize_batch};
use crate::record::RawRecord;
use crate::registry::Registry;
use crate::replicate::{ReplicaOutcome, replicate};
use crate::store::Store;
use crate::validate::retain_known_teams;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub written: usize,
    pub skipped: usize,
    pub dropped: usize,
    pub collisions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceStatus {
    Imported,
    /// No fetcher registered for the slice.
    NoSource,
    /// Full error chain of the failure.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SliceReport {
    pub league: League,
    pub kind: EntityKind,
    pub counts: ImportCounts,
    pub elapsed: Duration,
    pub status: SliceStatus,
}

impl SliceReport {
    pub fn count(&self) -> usize {
        self.counts.written
    }
}

#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub db_path: PathBuf,
    pub slices: Vec<SliceReport>,
    pub replicas: Vec<ReplicaOutcome>,
}

impl BuildSummary {
    pub fn count(&self, league: League, kind: EntityKind) -> usize {
        self.slices
            .iter()
            .filter(|s| s.league == league && s.kind == kind)
            .map(SliceReport::count)
            .sum()
    }

    pub fn total(&self, kind: EntityKind) -> usize {
        self.slices
            .iter()
            .filter(|s| s.kind == kind)
            .map(SliceReport::count)
            .sum()
    }

    pub fn grand_total(&self) -> usize {
        self.slices.iter().map(SliceReport::count).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SliceReport> {
        self.slices
            .iter()
            .filter(|s| matches!(s.status, SliceStatus::Failed(_)))
    }
}

/// Normalizes `records` with the league's rules and writes them. Players are
/// first checked against the team ids stored right now; if none survive the
/// slice writes nothing and that is not an error.
pub fn import_records(
    store: &mut Store,
    league: League,
    rules: &LeagueRules,
    kind: EntityKind,
    records: &[RawRecord],
    policy: KeyPolicy,
) -> Result<ImportCounts> {
    if records.is_empty() {
        info!(%league, %kind, "no {} fetched", kind.noun());
        return Ok(ImportCounts::default());
    }
    match kind {
        EntityKind::Teams => {
            let batch = normalize_batch(kind, records, policy, rules.team);
            let written = store.upsert(league, kind, &batch.rows)?;
            if let Ok(levels) = store.distinct_values(league, kind, "level") {
                debug!(%league, ?levels, "team levels");
            }
            Ok(ImportCounts {
                written,
                skipped: batch.skipped.len(),
                dropped: 0,
                collisions: batch.collisions,
            })
        }
        EntityKind::Players => {
            let batch = normalize_batch(kind, records, policy, rules.player);
            let known = store.team_ids(league)?;
            let checked = retain_known_teams(league, batch.rows, &known);
            let written = store.upsert(league, kind, &checked.accepted)?;
            Ok(ImportCounts {
                written,
                skipped: batch.skipped.len(),
                dropped: checked.dropped.len(),
                collisions: batch.collisions,
            })
        }
        EntityKind::Results => {
            let batch = normalize_batch(kind, records, policy, rules.result);
            let written = store.upsert(league, kind, &batch.rows)?;
            Ok(ImportCounts {
                written,
                skipped: batch.skipped.len(),
                dropped: 0,
                collisions: batch.collisions,
            })
        }
    }
}

/// Imports every requested slice, teams before players within a league.
pub fn run_slices(
    store: &mut Store,
    registry: &Registry,
    leagues: &[League],
    kinds: &[EntityKind],
    policy: KeyPolicy,
) -> Vec<SliceReport> {
    let ordered = EntityKind::ALL
        .into_iter()
        .filter(|kind| kinds.contains(kind))
        .collect::<Vec<_>>();

    let mut reports = Vec::new();
    for &league in leagues {
        for &kind in &ordered {
            let started = Instant::now();
            let source = registry.get(league);
            let (counts, status) = match source.and_then(|s| s.fetcher(kind).map(|f| (s, f))) {
                None => {
                    warn!(%league, %kind, "no source registered");
                    (ImportCounts::default(), SliceStatus::NoSource)
                }
                Some((source, fetcher)) => {
                    info!(%league, %kind, "importing");
                    let result = fetcher
                        .fetch()
                        .with_context(|| format!("fetch {league} {kind}"))
                        .and_then(|records| {
                            import_records(store, league, &source.rules, kind, &records, policy)
                                .with_context(|| format!("import {league} {kind}"))
                        });
                    match result {
                        Ok(counts) => (counts, SliceStatus::Imported),
                        Err(err) => {
                            error!(%league, %kind, "slice failed: {err:#}");
                            (ImportCounts::default(), SliceStatus::Failed(format!("{err:#}")))
                        }
                    }
                }
            };
            let elapsed = started.elapsed();
            info!(
                %league,
                %kind,
                written = counts.written,
                skipped = counts.skipped,
                dropped = counts.dropped,
                ?elapsed,
                "slice done"
            );
            reports.push(SliceReport {
                league,
                kind,
                counts,
                elapsed,
                status,
            });
        }
    }
    reports
}

/// One full build: open the store (the only failure that aborts), import
/// the configured slices, close, then copy the file to each replica.
pub fn run_build(cfg: &BuildConfig, registry: &Registry) -> Result<BuildSummary> {
    let mut store = Store::open(&cfg.db_path)?;
    let slices = run_slices(&mut store, registry, &cfg.leagues, &cfg.kinds, cfg.key_policy);
    store.close()?;

    let summary = BuildSummary {
        db_path: cfg.db_path.clone(),
        slices,
        replicas: replicate(&cfg.db_path, &cfg.replicas),
    };
    info!(
        teams = summary.total(EntityKind::Teams),
        players = summary.total(EntityKind::Players),
        results = summary.total(EntityKind::Results),
        total = summary.grand_total(),
        failed = summary.failures().count(),
        "build complete"
    );
    Ok(summary)
}
