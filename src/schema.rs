use crate::league::{EntityKind, League};

const TEAM_COLUMNS: &[&str] = &[
    "team_id",
    "name",
    "short_name",
    "image_url",
    "canonical_url",
    "division",
    "conference",
    "conference_short",
    "level",
];

const PVF_TEAM_COLUMNS: &[&str] = &[
    "team_id",
    "name",
    "short_name",
    "image_url",
    "canonical_url",
    "division",
    "conference",
    "conference_short",
    "level",
    "current_roster_id",
    "current_season_id",
];

const LOVB_PLAYER_COLUMNS: &[&str] = &[
    "player_id",
    "name",
    "jersey_number",
    "profile_url",
    "team_id",
    "team_name",
    "conference",
    "level",
    "division",
    "data_source",
    "position",
    "height",
    "hometown",
];

const PVF_PLAYER_COLUMNS: &[&str] = &[
    "player_id",
    "name",
    "jersey_number",
    "profile_url",
    "team_id",
    "team_name",
    "conference",
    "level",
    "division",
    "data_source",
    "position",
    "height",
    "hometown",
    "college",
    "pro_experience",
];

const NCAA_PLAYER_COLUMNS: &[&str] = &[
    "player_id",
    "name",
    "jersey_number",
    "profile_url",
    "team_id",
    "team_name",
    "team_short",
    "data_source",
    "position",
    "height",
    "hometown",
    "high_school",
    "class_year",
    "year",
    "season_id",
];

const LOVB_RESULT_COLUMNS: &[&str] = &[
    "match_id",
    "date",
    "home_team_id",
    "home_team_name",
    "away_team_id",
    "away_team_name",
    "score",
    "team_stats",
    "scoreboard",
    "match_url",
];

const PVF_RESULT_COLUMNS: &[&str] = &[
    "match_id",
    "season_id",
    "date",
    "location",
    "home_team_id",
    "home_team_name",
    "home_team_score",
    "away_team_id",
    "away_team_name",
    "away_team_score",
    "score",
    "team_stats",
    "scoreboard",
    "video",
    "volley_station_match_id",
    "status",
    "title",
];

const NCAA_RESULT_COLUMNS: &[&str] = &[
    "match_id",
    "date",
    "time",
    "location",
    "home_team_id",
    "home_team_name",
    "away_team_id",
    "away_team_name",
    "score",
    "attendance",
    "box_score",
    "officials",
    "pbp",
    "individual_stats",
    "division",
    "division_roman",
    "year",
    "status",
];

const TEAM_INDEXES: &[&str] = &["conference", "conference_short", "division", "level"];
const PLAYER_INDEXES: &[&str] = &["team_id"];
const RESULT_INDEXES: &[&str] = &["date", "status", "home_team_id", "away_team_id"];

/// One (league, entity) table: its natural key, the columns written by an
/// upsert (key included), the teams table its `team_id` points at, and the
/// columns that get a secondary index.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    pub key: &'static str,
    pub columns: &'static [&'static str],
    pub parent: Option<String>,
    pub indexes: Vec<&'static str>,
}

impl TableSpec {
    pub fn for_slice(league: League, kind: EntityKind) -> Self {
        let prefix = league.table_prefix();
        let name = format!("{prefix}_{}", kind.table_suffix());
        let columns = match (league, kind) {
            (League::Pvf, EntityKind::Teams) => PVF_TEAM_COLUMNS,
            (_, EntityKind::Teams) => TEAM_COLUMNS,
            (League::Lovb, EntityKind::Players) => LOVB_PLAYER_COLUMNS,
            (League::Pvf, EntityKind::Players) => PVF_PLAYER_COLUMNS,
            (League::Ncaam | League::Ncaaw, EntityKind::Players) => NCAA_PLAYER_COLUMNS,
            (League::Lovb, EntityKind::Results) => LOVB_RESULT_COLUMNS,
            (League::Pvf, EntityKind::Results) => PVF_RESULT_COLUMNS,
            (League::Ncaam | League::Ncaaw, EntityKind::Results) => NCAA_RESULT_COLUMNS,
        };
        let (parent, wanted) = match kind {
            EntityKind::Teams => (None, TEAM_INDEXES),
            EntityKind::Players => (Some(format!("{prefix}_teams")), PLAYER_INDEXES),
            EntityKind::Results => (None, RESULT_INDEXES),
        };
        let indexes = wanted
            .iter()
            .copied()
            .filter(|col| columns.contains(col))
            .collect();
        Self {
            name,
            key: kind.key_column(),
            columns,
            parent,
            indexes,
        }
    }

    pub fn create_sql(&self) -> String {
        let mut defs = vec![
            "id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            format!("{} TEXT UNIQUE NOT NULL", self.key),
        ];
        for col in self.columns.iter().filter(|col| **col != self.key) {
            defs.push(format!("{col} TEXT"));
        }
        if let Some(parent) = &self.parent {
            defs.push(format!("FOREIGN KEY (team_id) REFERENCES {parent}(team_id)"));
        }

        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);\n",
            self.name,
            defs.join(",\n    ")
        );
        for col in &self.indexes {
            sql.push_str(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{name}_{col} ON {name}({col});\n",
                name = self.name
            ));
        }
        sql
    }

    pub fn upsert_sql(&self) -> String {
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            self.name,
            self.columns.join(", "),
            placeholders
        )
    }
}

/// Every table in the store, teams first so player references resolve.
pub fn all_tables() -> Vec<TableSpec> {
    let mut out = Vec::new();
    for kind in EntityKind::ALL {
        for league in League::ALL {
            out.push(TableSpec::for_slice(league, kind));
        }
    }
    out
}
