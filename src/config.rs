use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use crate::league::{EntityKind, League};
use crate::normalize::KeyPolicy;

pub const DEFAULT_DB_PATH: &str = "vbdb.db";

/// Everything one build run needs. Built once by the binary and handed to the
/// orchestrator; nothing here is global.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub leagues: Vec<League>,
    pub kinds: Vec<EntityKind>,
    pub db_path: PathBuf,
    pub replicas: Vec<PathBuf>,
    pub key_policy: KeyPolicy,
}

impl BuildConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            leagues: League::ALL.to_vec(),
            kinds: EntityKind::ALL.to_vec(),
            db_path: db_path.into(),
            replicas: Vec::new(),
            key_policy: KeyPolicy::default(),
        }
    }
}

/// One NCAA season division as stats.ncaa.org numbers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonMeta {
    pub year: String,
    pub season_id: String,
    /// `di`, `dii` or `diii`.
    pub division: String,
}

impl SeasonMeta {
    fn new(year: &str, season_id: &str, division: &str) -> Self {
        Self {
            year: year.to_string(),
            season_id: season_id.to_string(),
            division: division.to_string(),
        }
    }

    pub fn division_roman(&self) -> &'static str {
        match self.division.as_str() {
            "di" => "I",
            "dii" => "II",
            "diii" => "III",
            _ => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NcaaSeasons {
    /// `MVB` or `WVB` on the NCAA sites.
    pub sport_code: &'static str,
    pub seasons: Vec<SeasonMeta>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| anyhow!("invalid date {y}-{m}-{d}"))
}

impl NcaaSeasons {
    pub fn men() -> Result<Self> {
        Ok(Self {
            sport_code: "MVB",
            seasons: vec![
                SeasonMeta::new("2025", "18463", "di"),
                SeasonMeta::new("2025", "18464", "diii"),
            ],
            start: date(2024, 12, 15)?,
            end: date(2025, 5, 24)?,
        })
    }

    pub fn women() -> Result<Self> {
        Ok(Self {
            sport_code: "WVB",
            seasons: vec![
                SeasonMeta::new("2024", "18323", "di"),
                SeasonMeta::new("2024", "18324", "dii"),
                SeasonMeta::new("2024", "18325", "diii"),
            ],
            start: date(2024, 8, 15)?,
            end: date(2024, 12, 23)?,
        })
    }

    /// Keeps only the seasons labelled `year`.
    pub fn for_year(mut self, year: &str) -> Self {
        self.seasons.retain(|meta| meta.year == year);
        self
    }

    pub fn only_day(mut self, day: NaiveDate) -> Self {
        self.start = day;
        self.end = day;
        self
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|day| *day <= self.end)
    }
}

/// Source-side settings the fetchers need.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub ncaam: NcaaSeasons,
    pub ncaaw: NcaaSeasons,
}

impl SourceConfig {
    pub fn standard() -> Result<Self> {
        Ok(Self {
            ncaam: NcaaSeasons::men()?,
            ncaaw: NcaaSeasons::women()?,
        })
    }

    pub fn with_ncaa_year(self, year: Option<&str>) -> Self {
        match year {
            Some(year) => Self {
                ncaam: self.ncaam.for_year(year),
                ncaaw: self.ncaaw.for_year(year),
            },
            None => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_window_is_inclusive() {
        let day = date(2025, 3, 1).unwrap();
        let seasons = NcaaSeasons::men().unwrap().only_day(day);
        assert_eq!(seasons.days().collect::<Vec<_>>(), vec![day]);
        assert_eq!(NcaaSeasons::women().unwrap().days().count(), 131);
    }

    #[test]
    fn year_filter_and_roman_divisions() {
        let cfg = SourceConfig::standard().unwrap().with_ncaa_year(Some("2025"));
        assert_eq!(cfg.ncaam.seasons.len(), 2);
        assert!(cfg.ncaaw.seasons.is_empty());
        assert_eq!(cfg.ncaam.seasons[1].division_roman(), "III");
    }
}
