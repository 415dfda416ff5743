use std::collections::{BTreeMap, HashMap};

use anyhow::Result;

use crate::config::SourceConfig;
use crate::league::{EntityKind, League};
use crate::normalize::LeagueRules;
use crate::record::RawRecord;
use crate::{lovb_fetch, ncaa_fetch, pvf_fetch};

/// A source of raw records for one (league, entity) slice.
pub trait Fetch {
    fn fetch(&self) -> Result<Vec<RawRecord>>;
}

impl<F> Fetch for F
where
    F: Fn() -> Result<Vec<RawRecord>>,
{
    fn fetch(&self) -> Result<Vec<RawRecord>> {
        self()
    }
}

/// What the orchestrator needs to know about one league: its reconciliation
/// rules and a fetcher per entity kind it can import.
pub struct LeagueSource {
    pub league: League,
    pub rules: LeagueRules,
    fetchers: HashMap<EntityKind, Box<dyn Fetch>>,
}

impl LeagueSource {
    pub fn new(league: League) -> Self {
        Self {
            league,
            rules: LeagueRules::for_league(league),
            fetchers: HashMap::new(),
        }
    }

    pub fn with(mut self, kind: EntityKind, fetcher: impl Fetch + 'static) -> Self {
        self.fetchers.insert(kind, Box::new(fetcher));
        self
    }

    pub fn fetcher(&self, kind: EntityKind) -> Option<&dyn Fetch> {
        self.fetchers.get(&kind).map(|f| f.as_ref())
    }
}

#[derive(Default)]
pub struct Registry {
    sources: BTreeMap<League, LeagueSource>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: LeagueSource) {
        self.sources.insert(source.league, source);
    }

    pub fn get(&self, league: League) -> Option<&LeagueSource> {
        self.sources.get(&league)
    }

    pub fn leagues(&self) -> impl Iterator<Item = League> + '_ {
        self.sources.keys().copied()
    }

    /// The live web sources for every league.
    pub fn standard(cfg: &SourceConfig) -> Self {
        let mut reg = Self::new();
        reg.register(
            LeagueSource::new(League::Lovb)
                .with(EntityKind::Teams, lovb_fetch::fetch_teams)
                .with(EntityKind::Players, lovb_fetch::fetch_rosters)
                .with(EntityKind::Results, lovb_fetch::fetch_schedule),
        );
        reg.register(
            LeagueSource::new(League::Pvf)
                .with(EntityKind::Teams, pvf_fetch::fetch_teams)
                .with(EntityKind::Players, pvf_fetch::fetch_rosters)
                .with(EntityKind::Results, pvf_fetch::fetch_schedule),
        );
        for (league, seasons) in [
            (League::Ncaam, cfg.ncaam.clone()),
            (League::Ncaaw, cfg.ncaaw.clone()),
        ] {
            let code = seasons.sport_code;
            reg.register(
                LeagueSource::new(league)
                    .with(EntityKind::Teams, move || ncaa_fetch::fetch_teams(code))
                    .with(EntityKind::Players, move || ncaa_fetch::fetch_rosters(code))
                    .with(EntityKind::Results, move || ncaa_fetch::fetch_schedule(&seasons)),
            );
        }
        reg
    }
}
