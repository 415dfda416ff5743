use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum League {
    Lovb,
    Pvf,
    Ncaam,
    Ncaaw,
}

impl League {
    pub const ALL: [League; 4] = [League::Lovb, League::Pvf, League::Ncaam, League::Ncaaw];

    pub fn tag(self) -> &'static str {
        match self {
            League::Lovb => "LOVB",
            League::Pvf => "PVF",
            League::Ncaam => "NCAAM",
            League::Ncaaw => "NCAAW",
        }
    }

    /// Prefix shared by the league's `teams`, `players` and `results` tables.
    pub fn table_prefix(self) -> &'static str {
        match self {
            League::Lovb => "lovb",
            League::Pvf => "pvf",
            League::Ncaam => "ncaam",
            League::Ncaaw => "ncaaw",
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for League {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOVB" => Ok(League::Lovb),
            "PVF" => Ok(League::Pvf),
            "NCAAM" => Ok(League::Ncaam),
            "NCAAW" => Ok(League::Ncaaw),
            other => Err(anyhow!("unknown league {other:?}")),
        }
    }
}

/// Resolves a league selection from the command line. `ALL` anywhere in the
/// list selects every league; duplicates are dropped, order is kept.
pub fn parse_leagues(raw: &[String]) -> Result<Vec<League>> {
    if raw.is_empty() || raw.iter().any(|s| s.trim().eq_ignore_ascii_case("all")) {
        return Ok(League::ALL.to_vec());
    }
    let mut out = Vec::new();
    for item in raw {
        let league = item.parse::<League>()?;
        if !out.contains(&league) {
            out.push(league);
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Teams,
    Players,
    Results,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Teams, EntityKind::Players, EntityKind::Results];

    pub fn table_suffix(self) -> &'static str {
        match self {
            EntityKind::Teams => "teams",
            EntityKind::Players => "players",
            EntityKind::Results => "results",
        }
    }

    pub fn key_column(self) -> &'static str {
        match self {
            EntityKind::Teams => "team_id",
            EntityKind::Players => "player_id",
            EntityKind::Results => "match_id",
        }
    }

    /// Plural used in log lines and the summary table.
    pub fn noun(self) -> &'static str {
        match self {
            EntityKind::Teams => "teams",
            EntityKind::Players => "players",
            EntityKind::Results => "matches",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

impl FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "teams" => Ok(EntityKind::Teams),
            "rosters" | "players" => Ok(EntityKind::Players),
            "schedules" | "results" | "matches" => Ok(EntityKind::Results),
            other => Err(anyhow!("unknown entity type {other:?}")),
        }
    }
}
