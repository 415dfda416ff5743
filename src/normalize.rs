//! Source record → normalized row reconciliation, one rule per
//! (league, entity). Rules are plain functions chosen once per league via
//! [`LeagueRules::for_league`]; a batch is folded with [`normalize_batch`].

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::ids;
use crate::league::{EntityKind, League};
use crate::record::{RawRecord, value_text};
use crate::rows::{PlayerRow, ResultRow, Row, TeamRow};

const LOVB_SITE: &str = "https://www.lovb.com";
const LOVB_MATCH_ROOT: &str = "https://lovb.com";
const LOVB_TEAM_SUFFIX: &str = "-volleyball";
const PVF_SITE: &str = "https://provolleyball.com";
const NCAA_STATS: &str = "https://stats.ncaa.org";
const VOLLEYSTATION_WIDGETS: &str = "https://widgets.volleystation.com";

const LOVB_NAME_NOISE: &[&str] = &["Founding Athlete", "NEW", "-founding-athlete"];

const PVF_PLACEHOLDER_TEAMS: &[&str] = &["Dallas Team", "Team Collier", "Team Shondell", "Kansas City"];

// The API banner images for these clubs are marketing art, not logos.
const PVF_IMAGE_OVERRIDES: &[(&str, &str)] = &[
    (
        "Atlanta Vibe",
        "https://provolleyball.com/imgproxy/2GZgtgfNWw2chjNPpcVCUF7fV9uxge23mL1mkSJMPs4/rs:fit:2000:0:0/g:ce/q:90/aHR0cHM6Ly9zdG9yYWdlLmdvb2dsZWFwaXMuY29tL3Byb3ZvbGxleWJhbGwtcHJvZC91cGxvYWQvMjAyMy8xMC8xNi8wZTA5NDIxMC1kZTc0LTQ2NjEtOWZkMS1iMzE1YzZkNmNjYmQucG5n.png",
    ),
    (
        "Columbus Fury",
        "https://provolleyball.com/imgproxy/XQDp1AoZT1R8ptzTTRirUYe_pahz-0ouEEYodr98_jk/rs:fit:1200:0:0/g:ce/q:90/aHR0cHM6Ly9zdG9yYWdlLmdvb2dsZWFwaXMuY29tL3Byb3ZvbGxleWJhbGwtcHJvZC91cGxvYWQvMjAyNC8wMi8xMy83MzM2NzU1NC0wOGRhLTQ5MWEtOWYzNC00ZjFiMjkwNzc3MTIucG5n.png",
    ),
    (
        "Grand Rapids Rise",
        "https://provolleyball.com/imgproxy/Irfvk-mphkux4FUquretSCe9nsnAVjhxPsV4EmZ4dhM/rs:fit:1200:0:0/g:ce/q:90/aHR0cHM6Ly9zdG9yYWdlLmdvb2dsZWFwaXMuY29tL3Byb3ZvbGxleWJhbGwtcHJvZC91cGxvYWQvMjAyMy8xMi8xNC82ZDMxYjIxZS1kNGYxLTQ3MWMtOTI0OS1iYzBkOGFkYzJhMmEucG5n.png",
    ),
    (
        "Indy Ignite",
        "https://provolleyball.com/imgproxy/a4i1u6Y3QD4kBQNnWp4_6TTaxWL1-K-hKMsamRdfXU8/rs:fit:1200:0:0/g:ce/q:90/aHR0cHM6Ly9zdG9yYWdlLmdvb2dsZWFwaXMuY29tL3Byb3ZvbGxleWJhbGwtcHJvZC91cGxvYWQvMjAyNC8wNi8xMS9jMDk2MjRkYS0yOWM2LTRjNjQtOGUzOC0zNWMwYWEzOTcwMWQud2VicA.webp",
    ),
    (
        "Omaha Supernovas",
        "https://provolleyball.com/imgproxy/VHOKO7ucv3wcLbqSZQ4TUL8QTZ0pYUEaTNKgRjzMTMo/rs:fit:1200:0:0/g:ce/q:90/aHR0cHM6Ly9zdG9yYWdlLmdvb2dsZWFwaXMuY29tL3Byb3ZvbGxleWJhbGwtcHJvZC91cGxvYWQvMjAyNC8wMi8yMy9kZTA4NGQ1Yy04MDExLTQyMDktOTc2Ni02MjVhZjExYWZjY2EucG5n.png",
    ),
    (
        "Orlando Valkyries",
        "https://provolleyball.com/imgproxy/DY9GotrQGEDAj_zyS91egcAUGg6dAS6ZgTc5m1mVBLc/rs:fit:1200:0:0/g:ce/q:90/aHR0cHM6Ly9zdG9yYWdlLmdvb2dsZWFwaXMuY29tL3Byb3ZvbGxleWJhbGwtcHJvZC91cGxvYWQvMjAyMy8xMC8xNi83NTJjZTk5MC0wMTE5LTQ3MDAtOTFjZi1mNjJmNGQxYmRjYzIucG5n.png",
    ),
    (
        "San Diego Mojo",
        "https://storage.googleapis.com/provolleyball-prod/upload/2024/10/25/f683092e-3a8a-48e1-ae57-fe9d0acb287a.gif",
    ),
    (
        "Vegas Thrill",
        "https://provolleyball.com/imgproxy/YD9xIuMCP74IIGg25RouNto7VIppHdWA0SZH_QflEeM/rs:fit:1200:0:0/g:ce/q:90/aHR0cHM6Ly9zdG9yYWdlLmdvb2dsZWFwaXMuY29tL3Byb3ZvbGxleWJhbGwtcHJvZC91cGxvYWQvMjAyMy8xMS8yMi8yNTM3ZDFmMC1iMjgwLTQ0ZjctOWExNC1lNzhlY2RmODRlYWQucG5n.png",
    ),
];

const PVF_TITLE_FIXES: &[(&str, &str)] =
    &[("Indy Ignite at Orlando Valkryies", "Indy Ignite at Orlando Valkyries")];

// NCAA roster headers drift between pages and seasons.
const NAME_HEADERS: &[&str] = &["name", "player"];
const JERSEY_HEADERS: &[&str] = &["#", "no.", "jersey", "number"];
const POSITION_HEADERS: &[&str] = &["position", "pos", "pos."];
const HEIGHT_HEADERS: &[&str] = &["height", "ht", "ht."];
const HOMETOWN_HEADERS: &[&str] = &["hometown", "home town"];
const HIGH_SCHOOL_HEADERS: &[&str] = &["high school", "previous school"];
const CLASS_HEADERS: &[&str] = &["class", "yr", "cl.", "year"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome<T> {
    Row(T),
    Skipped { reason: String },
}

impl<T> RecordOutcome<T> {
    fn skip(reason: impl Into<String>) -> Self {
        RecordOutcome::Skipped {
            reason: reason.into(),
        }
    }
}

/// What to do with a row whose derived natural key is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Keep it. Empty keys collide and the last write wins.
    #[default]
    Lenient,
    /// Turn it into a skipped record.
    RejectEmpty,
}

#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub rows: Vec<T>,
    pub skipped: Vec<String>,
    /// Rows whose key repeats an earlier row of the same batch.
    pub collisions: usize,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            skipped: Vec::new(),
            collisions: 0,
        }
    }
}

pub type Rule<T> = fn(&RawRecord) -> RecordOutcome<T>;

#[derive(Clone, Copy)]
pub struct LeagueRules {
    pub team: Rule<TeamRow>,
    pub player: Rule<PlayerRow>,
    pub result: Rule<ResultRow>,
}

impl LeagueRules {
    pub fn for_league(league: League) -> Self {
        match league {
            League::Lovb => Self {
                team: lovb_team,
                player: lovb_player,
                result: lovb_result,
            },
            League::Pvf => Self {
                team: pvf_team,
                player: pvf_player,
                result: pvf_result,
            },
            League::Ncaam => Self {
                team: ncaam_team,
                player: ncaa_player,
                result: ncaa_result,
            },
            League::Ncaaw => Self {
                team: ncaaw_team,
                player: ncaa_player,
                result: ncaa_result,
            },
        }
    }
}

pub fn normalize_batch<T: Row>(
    kind: EntityKind,
    records: &[RawRecord],
    policy: KeyPolicy,
    rule: Rule<T>,
) -> Normalized<T> {
    let mut out = Normalized::default();
    let mut seen = HashSet::new();
    for record in records {
        match rule(record) {
            RecordOutcome::Row(row) => {
                let key = row.natural_key();
                if key.is_empty() && policy == KeyPolicy::RejectEmpty {
                    out.skipped.push(format!(
                        "{}: empty {}",
                        row.display_name(),
                        kind.key_column()
                    ));
                    continue;
                }
                if !seen.insert(key.to_string()) {
                    out.collisions += 1;
                    warn!(
                        key,
                        name = row.display_name(),
                        "duplicate {} in batch, later row wins",
                        kind.key_column()
                    );
                }
                out.rows.push(row);
            }
            RecordOutcome::Skipped { reason } => {
                debug!(%reason, "skipped {} record", kind.noun());
                out.skipped.push(reason);
            }
        }
    }
    out
}

pub fn normalize_teams(league: League, records: &[RawRecord], policy: KeyPolicy) -> Normalized<TeamRow> {
    normalize_batch(EntityKind::Teams, records, policy, LeagueRules::for_league(league).team)
}

pub fn normalize_players(
    league: League,
    records: &[RawRecord],
    policy: KeyPolicy,
) -> Normalized<PlayerRow> {
    normalize_batch(EntityKind::Players, records, policy, LeagueRules::for_league(league).player)
}

pub fn normalize_results(
    league: League,
    records: &[RawRecord],
    policy: KeyPolicy,
) -> Normalized<ResultRow> {
    normalize_batch(EntityKind::Results, records, policy, LeagueRules::for_league(league).result)
}

fn lovb_team(rec: &RawRecord) -> RecordOutcome<TeamRow> {
    let Some(name) = rec.text("name") else {
        return RecordOutcome::skip("LOVB team without a name");
    };
    let team_id = rec
        .text_any(&["team_id", "slug"])
        .unwrap_or_else(|| format!("{}{LOVB_TEAM_SUFFIX}", ids::slug(&name)));
    let short_name = rec
        .text("name_short")
        .or_else(|| name.strip_prefix("LOVB ").map(str::to_string));
    RecordOutcome::Row(TeamRow {
        team_id,
        short_name,
        image_url: rec.text("img"),
        canonical_url: rec.text("url"),
        division: Some("Pro Women".to_string()),
        conference: Some("LOVB".to_string()),
        conference_short: Some("pro".to_string()),
        level: Some("Pro".to_string()),
        name,
        ..TeamRow::default()
    })
}

fn pvf_team(rec: &RawRecord) -> RecordOutcome<TeamRow> {
    let name = rec.text("name").unwrap_or_default();
    if PVF_PLACEHOLDER_TEAMS.contains(&name.as_str()) {
        return RecordOutcome::skip(format!("placeholder PVF team {name}"));
    }
    let team_id = rec.text("slug").unwrap_or_default();
    let image_url = PVF_IMAGE_OVERRIDES
        .iter()
        .find(|(team, _)| *team == name)
        .map(|(_, url)| url.to_string())
        .or_else(|| rec.text_path(&["featured_banner_image", "src"]));
    RecordOutcome::Row(TeamRow {
        short_name: Some(team_id.clone()).filter(|s| !s.is_empty()),
        team_id,
        image_url,
        canonical_url: Some(format!(
            "{PVF_SITE}{}",
            rec.text("permalink").unwrap_or_default()
        )),
        division: Some("Pro Women".to_string()),
        conference: Some("PVF".to_string()),
        conference_short: Some("pro".to_string()),
        level: Some("Pro".to_string()),
        current_roster_id: rec.text("current_roster_id"),
        current_season_id: rec.text("current_season_id"),
        name,
    })
}

fn ncaam_team(rec: &RawRecord) -> RecordOutcome<TeamRow> {
    ncaa_team(rec, "NCAA M")
}

fn ncaaw_team(rec: &RawRecord) -> RecordOutcome<TeamRow> {
    ncaa_team(rec, "NCAA W")
}

fn ncaa_team(rec: &RawRecord, level: &str) -> RecordOutcome<TeamRow> {
    let Some(team_id) = rec.text_any(&["team_id", "orgId"]) else {
        return RecordOutcome::skip("NCAA member without an orgId");
    };
    RecordOutcome::Row(TeamRow {
        team_id,
        name: rec.text_any(&["nameOfficial", "name"]).unwrap_or_default(),
        short_name: rec.text_any(&["name_short", "nameShort"]),
        image_url: rec.text("img"),
        canonical_url: rec.text_any(&["athleticWebUrl", "url"]),
        division: rec.text_any(&["divisionRoman", "division"]),
        conference: rec.text_any(&["conferenceName", "conference"]),
        conference_short: rec.text("conference_short"),
        level: Some(level.to_string()),
        ..TeamRow::default()
    })
}

/// Strips roster badges ("Founding Athlete", "NEW") that the LOVB pages glue
/// onto player names, then collapses whitespace.
pub fn clean_player_name(raw: &str) -> String {
    let mut name = collapse_whitespace(raw);
    for noise in LOVB_NAME_NOISE {
        name = name.replace(noise, "");
    }
    collapse_whitespace(&name)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn lovb_position(raw: &str) -> &str {
    match raw {
        "Opposite Hitter" => "OPP",
        "Middle Blocker" => "MB",
        "Setter" => "S",
        "Outside Hitter" => "OH",
        "Libero" => "L",
        other => other,
    }
}

fn lovb_player(rec: &RawRecord) -> RecordOutcome<PlayerRow> {
    let name = clean_player_name(&rec.text_any(&["Name", "name"]).unwrap_or_default());
    if name.is_empty() {
        return RecordOutcome::skip("LOVB roster row without a name");
    }
    let team_id = rec
        .text("team_id")
        .or_else(|| {
            let roster_url = rec.text("url")?;
            ids::segment_after(&roster_url, "teams").map(str::to_string)
        })
        .unwrap_or_default();
    let player_id = ids::slug(&name);
    let profile_url = (!team_id.is_empty())
        .then(|| format!("{LOVB_SITE}/teams/{team_id}/athletes/{player_id}"));

    RecordOutcome::Row(PlayerRow {
        jersey_number: Some(
            rec.text_any(&["Player Number", "jersey"])
                .unwrap_or_else(|| "Staff".to_string()),
        ),
        profile_url,
        team_name: rec.text("team"),
        conference: Some("LOVB".to_string()),
        level: Some("Pro Women".to_string()),
        division: Some("Pro".to_string()),
        data_source: Some("LOVB".to_string()),
        position: rec
            .text_any(&["Position", "Title"])
            .map(|p| lovb_position(&p).to_string()),
        height: rec.text("Height"),
        hometown: rec.text("College / Home Club"),
        player_id,
        team_id,
        name,
        ..PlayerRow::default()
    })
}

fn pvf_player(rec: &RawRecord) -> RecordOutcome<PlayerRow> {
    let first = rec.text_path(&["player", "first_name"]).unwrap_or_default();
    let last = rec.text_path(&["player", "last_name"]).unwrap_or_default();
    let name = rec
        .text_path(&["player", "full_name"])
        .unwrap_or_else(|| format!("{first} {last}").trim().to_string());
    if name.is_empty() {
        return RecordOutcome::skip("PVF roster entry without a player");
    }
    let height = match (
        rec.text_path(&["player", "height_feet"]),
        rec.text_path(&["player", "height_inches"]),
    ) {
        (Some(feet), Some(inches)) => Some(format!("{feet}'{inches}")),
        _ => None,
    };
    let positions = rec
        .array("player_positions")
        .iter()
        .filter_map(|pos| pos.get("name").and_then(value_text))
        .collect::<Vec<_>>()
        .join(", ");

    RecordOutcome::Row(PlayerRow {
        player_id: ids::first_last(&first, &last),
        jersey_number: rec.text_path(&["player", "jersey_number"]),
        profile_url: rec
            .text_path(&["player", "permalink"])
            .map(|p| format!("{PVF_SITE}{p}")),
        team_id: rec.text("team_id").unwrap_or_default(),
        team_name: rec.text("team_name"),
        conference: Some("PVF".to_string()),
        level: Some("Pro Women".to_string()),
        division: Some("Pro".to_string()),
        data_source: Some("PVF".to_string()),
        position: Some(positions).filter(|p| !p.is_empty()),
        height,
        hometown: rec.text_path(&["player", "hometown"]),
        college: rec.text_path(&["player", "college"]),
        pro_experience: rec.text_path(&["player", "pro_experience"]),
        name,
        ..PlayerRow::default()
    })
}

fn ncaa_player(rec: &RawRecord) -> RecordOutcome<PlayerRow> {
    let name = rec.text_any(NAME_HEADERS).unwrap_or_default();
    let player_url = rec.text("Player URL");
    if name.is_empty() && player_url.is_none() {
        return RecordOutcome::skip("NCAA roster row without a player");
    }
    let player_id = player_url
        .as_deref()
        .map(ids::trailing_segment)
        .unwrap_or_default()
        .to_string();
    let profile_url = player_url.map(|url| {
        if url.starts_with("http") {
            url
        } else {
            format!("{NCAA_STATS}{url}")
        }
    });

    RecordOutcome::Row(PlayerRow {
        player_id,
        jersey_number: rec.text_any(JERSEY_HEADERS),
        profile_url,
        team_id: rec.text("team_id").unwrap_or_default(),
        team_name: rec.text("team_name"),
        team_short: rec.text("team_short"),
        data_source: Some("NCAA".to_string()),
        position: rec.text_any(POSITION_HEADERS),
        height: rec.text_any(HEIGHT_HEADERS),
        hometown: rec.text_any(HOMETOWN_HEADERS),
        high_school: rec.text_any(HIGH_SCHOOL_HEADERS),
        class_year: rec.text_any(CLASS_HEADERS),
        year: rec.text("season_year"),
        season_id: rec
            .text("season_id")
            .map(|s| ids::trailing_segment(&s).to_string()),
        name,
        ..PlayerRow::default()
    })
}

fn lovb_team_id(name: &str) -> String {
    format!("{}{LOVB_TEAM_SUFFIX}", ids::slug(name))
}

fn lovb_result(rec: &RawRecord) -> RecordOutcome<ResultRow> {
    let (Some(first), Some(second)) = (rec.text("first_team"), rec.text("second_team")) else {
        return RecordOutcome::skip("LOVB match without two teams");
    };
    let first_points = rec.texts("first_set_scores");
    let second_points = rec.texts("second_set_scores");
    let score = (!first_points.is_empty() && !second_points.is_empty()).then(|| {
        ids::set_score(
            &rec.text("first_sets_won").unwrap_or_else(|| "0".to_string()),
            &rec.text("second_sets_won").unwrap_or_else(|| "0".to_string()),
            &first_points,
            &second_points,
        )
    });

    // The embedded play-by-play widget URL names the sibling widgets.
    let (team_stats, scoreboard) = rec
        .text("iframe_src")
        .map(|src| {
            let base = src.split("?side").next().unwrap_or_default();
            (
                base.replace("play-by-play", "team-stats"),
                base.replace("play-by-play", "scoreboard"),
            )
        })
        .unzip();
    let match_id = scoreboard
        .as_deref()
        .map(ids::trailing_segment)
        .unwrap_or_default()
        .to_string();
    let match_url = rec.text("details_link").map(|link| {
        let link = ids::repair_salt_lake(&link);
        if link.starts_with("http") {
            link
        } else {
            format!("{LOVB_MATCH_ROOT}{link}")
        }
    });

    // The second listed team hosts.
    RecordOutcome::Row(ResultRow {
        match_id,
        date: rec.text("date"),
        home_team_id: Some(lovb_team_id(&second)),
        home_team_name: Some(second),
        away_team_id: Some(lovb_team_id(&first)),
        away_team_name: Some(first),
        score,
        team_stats,
        scoreboard,
        match_url,
        ..ResultRow::default()
    })
}

#[derive(Debug, Clone, Default)]
struct Side {
    id: String,
    name: String,
    score: Option<String>,
}

impl Side {
    fn from_record(rec: &RawRecord, prefix: &str) -> Self {
        let name = rec.text(&format!("{prefix}_name")).unwrap_or_default();
        Self {
            id: name.to_lowercase().replace(' ', "-"),
            score: rec.text(&format!("{prefix}_score")),
            name,
        }
    }

    fn or_name(mut self, fallback: &str) -> Self {
        if self.name.is_empty() {
            self.name = fallback.to_string();
        }
        self
    }

    fn title_only(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// `(home, away)` from "Away at Home" or "Home vs Away" titles.
fn split_title(title: &str) -> Option<(String, String)> {
    if let Some((away, home)) = title.split_once(" at ") {
        return Some((home.trim().to_string(), away.trim().to_string()));
    }
    for sep in [" vs ", " vs. "] {
        if let Some((home, away)) = title.split_once(sep) {
            return Some((home.trim().to_string(), away.trim().to_string()));
        }
    }
    None
}

fn names_overlap(api: &str, title: &str) -> bool {
    let (api, title) = (api.to_lowercase(), title.to_lowercase());
    title.contains(&api) || api.contains(&title)
}

fn pvf_result(rec: &RawRecord) -> RecordOutcome<ResultRow> {
    let raw_title = rec.text("title").unwrap_or_default();
    if raw_title.contains("All-Star") {
        return RecordOutcome::skip(format!("all-star event {raw_title}"));
    }
    let title = PVF_TITLE_FIXES
        .iter()
        .find(|(bad, _)| *bad == raw_title)
        .map(|(_, good)| good.to_string())
        .unwrap_or(raw_title);
    let Some((title_home, title_away)) = split_title(&title) else {
        return RecordOutcome::skip(format!("unrecognised PVF title {title:?}"));
    };

    let first = Side::from_record(rec, "first_team");
    let second = Side::from_record(rec, "second_team");
    let (home, away) = if names_overlap(&first.name, &title_home) {
        (first.or_name(&title_home), second.or_name(&title_away))
    } else if names_overlap(&second.name, &title_home) {
        (second.or_name(&title_home), first.or_name(&title_away))
    } else {
        warn!(
            %title,
            first = %first.name,
            second = %second.name,
            "PVF team names disagree with the title"
        );
        match rec.text("venue_type").as_deref() {
            Some("home") => (first.or_name(&title_home), second.or_name(&title_away)),
            Some("away") => (second.or_name(&title_home), first.or_name(&title_away)),
            _ => (Side::title_only(&title_home), Side::title_only(&title_away)),
        }
    };

    let score = match (&home.score, &away.score) {
        (Some(h), Some(a)) => Some(format!("{h}-{a}")),
        _ => rec.text("result_text"),
    };
    let status = match rec.text("status").map(|s| s.to_lowercase()).as_deref() {
        Some("completed") => "completed".to_string(),
        Some("upcoming") => "scheduled".to_string(),
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    };
    let vs_match = rec.text("volley_station_match_id").unwrap_or_default();

    RecordOutcome::Row(ResultRow {
        match_id: rec.text("id").unwrap_or_default(),
        season_id: rec.text("season_id"),
        date: rec.text("start_datetime"),
        location: rec.text("location"),
        home_team_id: Some(home.id),
        home_team_name: Some(home.name),
        home_team_score: home.score,
        away_team_id: Some(away.id),
        away_team_name: Some(away.name),
        away_team_score: away.score,
        score,
        team_stats: Some(format!("{VOLLEYSTATION_WIDGETS}/team-stats/{vs_match}")),
        scoreboard: Some(format!("{VOLLEYSTATION_WIDGETS}/scoreboard/{vs_match}")),
        video: rec.text("presented_by_url"),
        volley_station_match_id: Some(vs_match).filter(|id| !id.is_empty()),
        status: Some(status),
        title: Some(title),
        ..ResultRow::default()
    })
}

fn ncaa_result(rec: &RawRecord) -> RecordOutcome<ResultRow> {
    let box_score = rec.text("box_score");
    let match_id = box_score
        .as_deref()
        .map(ids::contest_id)
        .unwrap_or_default();
    let sibling = |page: &str| box_score.as_ref().map(|url| url.replace("box_score", page));

    let score = rec.text("score").or_else(|| {
        let away = rec.text("away_score")?;
        let home = rec.text("home_score")?;
        Some(ids::set_score(
            &away,
            &home,
            &rec.texts("away_set_scores"),
            &rec.texts("home_set_scores"),
        ))
    });
    let status = rec.text("status").unwrap_or_else(|| {
        let status = if score.is_some() { "completed" } else { "unknown" };
        status.to_string()
    });

    RecordOutcome::Row(ResultRow {
        match_id,
        date: rec.text("date"),
        time: rec.text("time"),
        location: rec.text("location"),
        home_team_id: rec.text("home_team_id"),
        home_team_name: rec.text("home_team_name"),
        away_team_id: rec.text("away_team_id"),
        away_team_name: rec.text("away_team_name"),
        attendance: rec.text("attendance").map(|a| a.replace(',', "")),
        officials: rec.text("officials").or_else(|| sibling("officials")),
        pbp: rec.text("pbp").or_else(|| sibling("play_by_play")),
        individual_stats: rec
            .text("individual_stats")
            .or_else(|| sibling("individual_stats")),
        division: rec.text("division"),
        division_roman: rec.text("division_roman"),
        year: rec.text("year"),
        status: Some(status),
        score,
        box_score,
        ..ResultRow::default()
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row<T>(outcome: RecordOutcome<T>) -> T {
        match outcome {
            RecordOutcome::Row(row) => row,
            RecordOutcome::Skipped { reason } => panic!("unexpected skip: {reason}"),
        }
    }

    #[test]
    fn lovb_team_id_falls_back_to_name_slug() {
        let team = row(lovb_team(&RawRecord::new().with("name", "LOVB Salt Lake")));
        assert_eq!(team.team_id, "lovb-salt-lake-volleyball");
        assert_eq!(team.short_name.as_deref(), Some("Salt Lake"));

        let supplied = row(lovb_team(
            &RawRecord::new()
                .with("name", "LOVB Austin")
                .with("slug", "lovb-austin-volleyball"),
        ));
        assert_eq!(supplied.team_id, "lovb-austin-volleyball");
    }

    #[test]
    fn pvf_team_skips_placeholders_and_overrides_images() {
        let placeholder = pvf_team(&RawRecord::new().with("name", "Team Collier"));
        assert!(matches!(placeholder, RecordOutcome::Skipped { .. }));

        let rec = RawRecord::from_value(json!({
            "slug": "san-diego-mojo",
            "name": "San Diego Mojo",
            "permalink": "/teams/san-diego-mojo",
            "featured_banner_image": { "src": "https://banner" },
            "current_roster_id": 12,
        }))
        .unwrap();
        let team = row(pvf_team(&rec));
        assert_eq!(team.team_id, "san-diego-mojo");
        assert_eq!(team.short_name.as_deref(), Some("san-diego-mojo"));
        assert!(team.image_url.unwrap().ends_with(".gif"));
        assert_eq!(
            team.canonical_url.as_deref(),
            Some("https://provolleyball.com/teams/san-diego-mojo")
        );
        assert_eq!(team.current_roster_id.as_deref(), Some("12"));
    }

    #[test]
    fn ncaa_team_uses_org_id() {
        let rec = RawRecord::from_value(json!({
            "orgId": 518,
            "nameOfficial": "Ohio State University",
            "divisionRoman": "I",
            "conferenceName": "MIVA",
        }))
        .unwrap();
        let team = row(ncaam_team(&rec));
        assert_eq!(team.team_id, "518");
        assert_eq!(team.level.as_deref(), Some("NCAA M"));
        assert_eq!(team.conference.as_deref(), Some("MIVA"));
        assert!(matches!(ncaaw_team(&RawRecord::new()), RecordOutcome::Skipped { .. }));
    }

    #[test]
    fn lovb_player_reconciles_roster_row() {
        let rec = RawRecord::new()
            .with("Player Number", "")
            .with("Name", "Jordyn  Poulter Founding Athlete")
            .with("Position", "Setter")
            .with("Height", "6'2\"")
            .with("College / Home Club", "Illinois")
            .with("url", "https://www.lovb.com/teams/lovb-atlanta-volleyball/roster");
        let player = row(lovb_player(&rec));
        assert_eq!(player.name, "Jordyn Poulter");
        assert_eq!(player.player_id, "jordyn-poulter");
        assert_eq!(player.team_id, "lovb-atlanta-volleyball");
        assert_eq!(player.jersey_number.as_deref(), Some("Staff"));
        assert_eq!(player.position.as_deref(), Some("S"));
        assert_eq!(player.hometown.as_deref(), Some("Illinois"));
        assert_eq!(
            player.profile_url.as_deref(),
            Some("https://www.lovb.com/teams/lovb-atlanta-volleyball/athletes/jordyn-poulter")
        );
    }

    #[test]
    fn pvf_player_builds_first_last_key() {
        let rec = RawRecord::from_value(json!({
            "team_id": "omaha-supernovas",
            "player": {
                "first_name": "Brooke",
                "last_name": "Nuneviller",
                "full_name": "Brooke Nuneviller",
                "height_feet": 5,
                "height_inches": 10,
                "jersey_number": 7,
                "permalink": "/players/brooke-nuneviller"
            },
            "player_positions": [{ "name": "Outside Hitter" }, { "name": "Libero" }]
        }))
        .unwrap();
        let player = row(pvf_player(&rec));
        assert_eq!(player.player_id, "brooke-nuneviller");
        assert_eq!(player.height.as_deref(), Some("5'10"));
        assert_eq!(player.jersey_number.as_deref(), Some("7"));
        assert_eq!(player.position.as_deref(), Some("Outside Hitter, Libero"));
        assert_eq!(player.team_id, "omaha-supernovas");
    }

    #[test]
    fn ncaa_player_resolves_header_drift() {
        let rec = RawRecord::new()
            .with("No.", "12")
            .with("Player", "Sam Smith")
            .with("Pos", "OPP")
            .with("Ht.", "6-7")
            .with("Cl.", "Jr.")
            .with("Previous School", "Central HS")
            .with("Player URL", "/players/7654321")
            .with("team_id", "518")
            .with("season_id", "/teams/574123");
        let player = row(ncaa_player(&rec));
        assert_eq!(player.player_id, "7654321");
        assert_eq!(player.name, "Sam Smith");
        assert_eq!(player.jersey_number.as_deref(), Some("12"));
        assert_eq!(player.position.as_deref(), Some("OPP"));
        assert_eq!(player.class_year.as_deref(), Some("Jr."));
        assert_eq!(player.high_school.as_deref(), Some("Central HS"));
        assert_eq!(
            player.profile_url.as_deref(),
            Some("https://stats.ncaa.org/players/7654321")
        );
        assert_eq!(player.season_id.as_deref(), Some("574123"));
    }

    #[test]
    fn lovb_result_uses_second_team_as_home() {
        let rec = RawRecord::from_value(json!({
            "date": "Fri, Jan 10",
            "first_team": "LOVB Houston",
            "second_team": "LOVB Salt Lake",
            "first_sets_won": "1",
            "second_sets_won": "3",
            "first_set_scores": ["20", "25", "18", "19"],
            "second_set_scores": ["25", "22", "25", "25"],
            "details_link": "/teams/lovb-salt lake-volleyball/matches/42",
            "iframe_src": "https://widgets.volleystation.com/play-by-play/98765?side=home"
        }))
        .unwrap();
        let result = row(lovb_result(&rec));
        assert_eq!(result.home_team_id.as_deref(), Some("lovb-salt-lake-volleyball"));
        assert_eq!(result.away_team_id.as_deref(), Some("lovb-houston-volleyball"));
        assert_eq!(result.score.as_deref(), Some("1-3 [20-25, 25-22, 18-25, 19-25]"));
        assert_eq!(result.match_id, "98765");
        assert_eq!(
            result.scoreboard.as_deref(),
            Some("https://widgets.volleystation.com/scoreboard/98765")
        );
        assert_eq!(
            result.match_url.as_deref(),
            Some("https://lovb.com/teams/lovb-salt-lake-volleyball/matches/42")
        );
    }

    #[test]
    fn lovb_upcoming_match_has_empty_key_and_no_score() {
        let rec = RawRecord::new()
            .with("first_team", "LOVB Omaha")
            .with("second_team", "LOVB Madison");
        let result = row(lovb_result(&rec));
        assert_eq!(result.match_id, "");
        assert_eq!(result.score, None);
    }

    #[test]
    fn pvf_result_resolves_home_from_title() {
        let rec = RawRecord::from_value(json!({
            "id": 3021,
            "title": "Indy Ignite at Orlando Valkryies",
            "first_team_name": "Indy Ignite",
            "first_team_score": 1,
            "second_team_name": "Orlando Valkyries",
            "second_team_score": 3,
            "status": "Completed",
            "volley_station_match_id": 555,
            "start_datetime": "2025-02-01T19:00:00Z"
        }))
        .unwrap();
        let result = row(pvf_result(&rec));
        assert_eq!(result.match_id, "3021");
        assert_eq!(result.title.as_deref(), Some("Indy Ignite at Orlando Valkyries"));
        assert_eq!(result.home_team_id.as_deref(), Some("orlando-valkyries"));
        assert_eq!(result.away_team_id.as_deref(), Some("indy-ignite"));
        assert_eq!(result.score.as_deref(), Some("3-1"));
        assert_eq!(result.status.as_deref(), Some("completed"));
        assert_eq!(result.volley_station_match_id.as_deref(), Some("555"));
    }

    #[test]
    fn pvf_result_skips_all_star_and_bad_titles() {
        let all_star = RawRecord::new().with("title", "2025 PVF All-Star Match");
        assert!(matches!(pvf_result(&all_star), RecordOutcome::Skipped { .. }));
        let odd = RawRecord::new().with("title", "Exhibition");
        assert!(matches!(pvf_result(&odd), RecordOutcome::Skipped { .. }));
    }

    #[test]
    fn pvf_result_falls_back_to_venue_type() {
        let rec = RawRecord::new()
            .with("id", 7)
            .with("title", "Vegas at Columbus")
            .with("first_team_name", "Thrill")
            .with("second_team_name", "Fury")
            .with("venue_type", "away")
            .with("status", "upcoming");
        let result = row(pvf_result(&rec));
        assert_eq!(result.home_team_name.as_deref(), Some("Fury"));
        assert_eq!(result.status.as_deref(), Some("scheduled"));
    }

    #[test]
    fn ncaa_result_derives_ids_and_links() {
        let rec = RawRecord::from_value(json!({
            "box_score": "https://stats.ncaa.org/contests/123456/box_score",
            "away_score": "3",
            "home_score": "1",
            "away_set_scores": ["25", "22", "25", "25"],
            "home_set_scores": ["20", "25", "18", "19"],
            "attendance": "1,204"
        }))
        .unwrap();
        let result = row(ncaa_result(&rec));
        assert_eq!(result.match_id, "123456");
        assert_eq!(result.score.as_deref(), Some("3-1 [25-20, 22-25, 25-18, 25-19]"));
        assert_eq!(result.status.as_deref(), Some("completed"));
        assert_eq!(result.attendance.as_deref(), Some("1204"));
        assert_eq!(
            result.pbp.as_deref(),
            Some("https://stats.ncaa.org/contests/123456/play_by_play")
        );
    }

    #[test]
    fn strict_policy_rejects_empty_keys() {
        let records = vec![
            RawRecord::new().with("first_team", "A").with("second_team", "B"),
            RawRecord::new().with("first_team", "C").with("second_team", "D"),
        ];
        let lenient = normalize_results(League::Lovb, &records, KeyPolicy::Lenient);
        assert_eq!(lenient.rows.len(), 2);
        assert_eq!(lenient.collisions, 1);

        let strict = normalize_results(League::Lovb, &records, KeyPolicy::RejectEmpty);
        assert!(strict.rows.is_empty());
        assert_eq!(strict.skipped.len(), 2);
    }
}
