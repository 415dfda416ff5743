use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::http_client::{get_json, get_json_with};
use crate::record::RawRecord;

const PVF_TEAMS_URL: &str =
    "https://provolleyball.com/api/teams?include&sort%5B0%5D=sort&sort%5B1%5D=name";
const PVF_ROSTER_URL: &str = "https://provolleyball.com/api/rosters";
const PVF_SCHEDULE_URL: &str = "https://provolleyball.com/api/schedule-events/";

const ROSTER_QUERY: &[(&str, &str)] = &[
    ("include[1]", "headshotImage"),
    ("include[2]", "player.headshotImage"),
    ("include[3]", "positions"),
    ("sort[0]", "players.last_name"),
];

pub fn fetch_teams() -> Result<Vec<RawRecord>> {
    let body = get_json(PVF_TEAMS_URL).context("fetch PVF teams")?;
    Ok(parse_data_array(&body))
}

/// Every player on each team's current roster, tagged with the team's slug
/// and name so the normalizer can reference the teams table.
pub fn fetch_rosters() -> Result<Vec<RawRecord>> {
    let teams = fetch_teams()?;
    let mut out = Vec::new();
    for team in &teams {
        let name = team.text("name").unwrap_or_default();
        let Some(roster_id) = team.text("current_roster_id") else {
            warn!(team = %name, "no current roster id");
            continue;
        };
        let url = format!("{PVF_ROSTER_URL}/{roster_id}/player-rosters");
        // A failed roster is logged and skipped.
        match get_json_with(&url, ROSTER_QUERY) {
            Ok(body) => {
                let team_id = team.text("slug").unwrap_or_default();
                let players = parse_roster(&body, &team_id, &name);
                info!(team = %name, players = players.len(), "fetched PVF roster");
                out.extend(players);
            }
            Err(err) => warn!(team = %name, %roster_id, "PVF roster fetch failed: {err:#}"),
        }
    }
    Ok(out)
}

pub fn fetch_schedule() -> Result<Vec<RawRecord>> {
    let mut out = Vec::new();
    for state in ["past", "upcoming"] {
        let url = format!("{PVF_SCHEDULE_URL}?filter%5Bevent_state%5D={state}&per_page=500");
        let body = get_json(&url).with_context(|| format!("fetch PVF {state} events"))?;
        let events = parse_data_array(&body);
        info!(state, events = events.len(), "fetched PVF schedule events");
        out.extend(events);
    }
    Ok(out)
}

/// Objects under the top-level `data` array of a PVF API response.
pub fn parse_data_array(body: &Value) -> Vec<RawRecord> {
    body.get("data")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().cloned().filter_map(RawRecord::from_value).collect())
        .unwrap_or_default()
}

pub fn parse_roster(body: &Value, team_id: &str, team_name: &str) -> Vec<RawRecord> {
    parse_data_array(body)
        .into_iter()
        .map(|entry| entry.with("team_id", team_id).with("team_name", team_name))
        .collect()
}
