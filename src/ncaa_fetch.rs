//! stats.ncaa.org and the NCAA directory API. Network calls are thin GETs;
//! page shapes are handled by the `parse_*` functions.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{NcaaSeasons, SeasonMeta};
use crate::html::{attr, collapsed_text, first, selector};
use crate::http_client::{get_json, get_text};
use crate::ids;
use crate::record::RawRecord;

const NCAA_STATS: &str = "https://stats.ncaa.org";
const DIRECTORY_URL: &str =
    "https://web3.ncaa.org/directory/api/directory/memberList?type=12&sportCode=";
const TEAM_CODES_URL: &str = "https://stats.ncaa.org/game_upload/team_codes";
const ROSTER_DELAY: Duration = Duration::from_millis(500);

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})").expect("date pattern"));
static ATTENDANCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Attendance:\s*([\d,]+)").expect("attendance pattern"));
static PAREN_LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}/\d{4}.*?(\([^)]+\))").expect("location pattern"));
static VENUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(.*Arena.*|.*Center.*|.*Stadium.*|.*Field.*|.*Court.*)").expect("venue pattern")
});

/// Directory members for `sport_code` (`MVB` / `WVB`), with `name_short`
/// merged in from the team codes page when it is reachable.
pub fn fetch_teams(sport_code: &str) -> Result<Vec<RawRecord>> {
    let body = get_json(&format!("{DIRECTORY_URL}{sport_code}"))
        .with_context(|| format!("fetch NCAA {sport_code} member list"))?;
    let mut teams = parse_member_list(&body);

    match get_text(TEAM_CODES_URL).and_then(|html| parse_team_codes(&html)) {
        Ok(codes) => {
            for team in &mut teams {
                if let Some(org_id) = team.text("orgId")
                    && let Some(short) = codes.get(&org_id)
                {
                    team.insert("name_short", short.as_str());
                }
            }
        }
        Err(err) => warn!("NCAA team codes unavailable: {err:#}"),
    }
    info!(sport_code, teams = teams.len(), "fetched NCAA members");
    Ok(teams)
}

pub fn parse_member_list(body: &Value) -> Vec<RawRecord> {
    body.as_array()
        .map(|arr| arr.iter().cloned().filter_map(RawRecord::from_value).collect())
        .unwrap_or_default()
}

/// `orgId -> short name` from the two-column team codes table. The first two
/// rows are page headings.
pub fn parse_team_codes(html: &str) -> Result<HashMap<String, String>> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let mut out = HashMap::new();
    let Some(table) = first(doc.root_element(), &table_sel) else {
        return Ok(out);
    };
    for row in table.select(&row_sel).skip(2) {
        let cells = row.select(&cell_sel).map(collapsed_text).collect::<Vec<_>>();
        if let [org_id, short, ..] = cells.as_slice()
            && !org_id.is_empty()
            && !short.is_empty()
        {
            out.insert(org_id.clone(), short.clone());
        }
    }
    Ok(out)
}

/// Roster rows for every member team, each tagged with its team reference.
pub fn fetch_rosters(sport_code: &str) -> Result<Vec<RawRecord>> {
    let teams = fetch_teams(sport_code)?;
    let mut out = Vec::new();
    let mut with_players = 0usize;
    let mut without_players = 0usize;

    for team in &teams {
        let Some(team_id) = team.text("orgId") else {
            continue;
        };
        let name = team.text("nameOfficial").unwrap_or_default();
        thread::sleep(ROSTER_DELAY);
        match fetch_team_roster(sport_code, &team_id) {
            Ok(rows) if !rows.is_empty() => {
                with_players += 1;
                info!(team = %name, %team_id, players = rows.len(), "fetched NCAA roster");
                for row in rows {
                    let mut row = row.with("team_id", team_id.as_str()).with("team_name", name.as_str());
                    if let Some(short) = team.text("name_short") {
                        row.insert("team_short", short);
                    }
                    out.push(row);
                }
            }
            Ok(_) => {
                without_players += 1;
                warn!(team = %name, %team_id, "no players on NCAA roster");
            }
            Err(err) => {
                without_players += 1;
                warn!(team = %name, %team_id, "NCAA roster failed: {err:#}");
            }
        }
    }
    info!(
        sport_code,
        teams = teams.len(),
        with_players,
        without_players,
        players = out.len(),
        "NCAA roster pass done"
    );
    Ok(out)
}

fn fetch_team_roster(sport_code: &str, team_id: &str) -> Result<Vec<RawRecord>> {
    let history = get_text(&format!("{NCAA_STATS}/teams/history/{sport_code}/{team_id}"))?;
    let Some(season) = parse_season_link(&history)? else {
        bail!("no season link for team {team_id}");
    };

    let mut html = get_text(&format!("{NCAA_STATS}{season}/roster"))?;
    match team_picker_has(&html, team_id)? {
        Some(true) => html = get_text(&format!("{NCAA_STATS}{season}/roster/{team_id}"))?,
        Some(false) => bail!("team {team_id} missing from roster picker"),
        None => {}
    }

    let year = parse_roster_year(&html)?;
    let rows = parse_roster(&html)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let mut row = row.with("season_id", season.as_str());
            if let Some(year) = &year {
                row.insert("season_year", year.as_str());
            }
            row
        })
        .collect())
}

/// Path of the most recent season on a team history page.
pub fn parse_season_link(html: &str) -> Result<Option<String>> {
    let doc = Html::parse_document(html);
    let sel = selector("table a[href]")?;
    Ok(first(doc.root_element(), &sel)
        .and_then(|a| attr(a, "href"))
        .map(str::to_string))
}

/// `None` when the page has no team picker, otherwise whether `team_id` is
/// one of its options.
pub fn team_picker_has(html: &str, team_id: &str) -> Result<Option<bool>> {
    let doc = Html::parse_document(html);
    let picker_sel = selector(r#"select[name="id"]"#)?;
    let option_sel = selector("option")?;
    Ok(first(doc.root_element(), &picker_sel).map(|picker| {
        picker
            .select(&option_sel)
            .any(|opt| opt.value().attr("value") == Some(team_id))
    }))
}

pub fn parse_roster_year(html: &str) -> Result<Option<String>> {
    let doc = Html::parse_document(html);
    let selected = selector(r#"select[name="year_id"] option[selected]"#)?;
    let any = selector(r#"select[name="year_id"] option"#)?;
    let root = doc.root_element();
    Ok(first(root, &selected)
        .or_else(|| first(root, &any))
        .map(collapsed_text)
        .filter(|y| !y.is_empty()))
}

fn find_roster_table<'a>(root: ElementRef<'a>) -> Result<Option<ElementRef<'a>>> {
    for css in [r#"table[id^="roster_"]"#, r#"table[id^="rosters_form_players"]"#, "table.dataTable"] {
        if let Some(table) = first(root, &selector(css)?) {
            return Ok(Some(table));
        }
    }
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    Ok(root.select(&selector("table")?).find(|table| {
        table.select(&row_sel).count() > 1
            && first(*table, &cell_sel).is_some_and(|td| !collapsed_text(td).is_empty())
    }))
}

/// One record per roster row, keyed by the table's own header text plus
/// `Player URL` for the row's link.
pub fn parse_roster(html: &str) -> Result<Vec<RawRecord>> {
    let doc = Html::parse_document(html);
    let Some(table) = find_roster_table(doc.root_element())? else {
        debug!("no roster table on page");
        return Ok(Vec::new());
    };

    let header_cells = selector("th, td")?;
    let tr_sel = selector("tr")?;
    let th_sel = selector("th")?;
    let head = first(table, &selector("thead")?)
        .or_else(|| first(table, &selector("tr.heading").ok()?))
        .or_else(|| first(table, &tr_sel).filter(|row| first(*row, &th_sel).is_some()));
    let Some(head) = head else {
        debug!("roster table without a header row");
        return Ok(Vec::new());
    };
    let headers = head
        .select(&header_cells)
        .map(collapsed_text)
        .collect::<Vec<_>>();

    // html5ever wraps bare rows in a tbody, so rows are filtered against the
    // header instead of read from tbody.
    let head_rows = std::iter::once(head.id())
        .chain(head.select(&tr_sel).map(|tr| tr.id()))
        .collect::<Vec<_>>();
    let body_rows = table
        .select(&tr_sel)
        .filter(|tr| !head_rows.contains(&tr.id()))
        .collect::<Vec<_>>();

    let link_sel = selector("a[href]")?;
    let mut out = Vec::new();
    for tr in body_rows {
        let mut record = RawRecord::new();
        let mut player_url = None;
        let mut cells = 0usize;
        for (idx, cell) in tr.select(&header_cells).enumerate() {
            cells += 1;
            let text = match first(cell, &link_sel) {
                Some(link) => {
                    player_url = attr(link, "href").map(str::to_string);
                    collapsed_text(link)
                }
                None => collapsed_text(cell),
            };
            if let Some(header) = headers.get(idx)
                && !header.is_empty()
            {
                record.insert(header, text);
            }
        }
        if cells == 0 {
            continue;
        }
        if let Some(url) = player_url {
            record.insert("Player URL", url);
        }
        out.push(record);
    }
    Ok(out)
}

/// Box-score links from one day's scoreboard for a season division.
pub fn parse_scoreboard(html: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let sel = selector(r#"a[target*="box_score"]"#)?;
    Ok(doc
        .select(&sel)
        .filter_map(|a| attr(a, "href"))
        .map(|href| format!("{NCAA_STATS}{href}"))
        .collect())
}

#[derive(Debug, Default)]
struct BoxTeam {
    name: String,
    id: String,
}

fn logo_team_id(src: &str) -> &str {
    let stem = src.split(".gif").next().unwrap_or_default();
    stem.rsplit("sm//").next().unwrap_or_default()
}

/// One match record from a box-score page. The first team listed is the
/// visitor and the second the host.
pub fn parse_box_score(url: &str, html: &str) -> Result<RawRecord> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    let scope = first(root, &selector("div.table-responsive")?).unwrap_or(root);
    let mut rec = RawRecord::new().with("box_score", url);

    let name_sel = selector("td.grey_text.d-none.d-sm-table-cell")?;
    let link_sel = selector("a")?;
    let mut teams = scope
        .select(&name_sel)
        .map(|cell| BoxTeam {
            name: first(cell, &link_sel)
                .map(collapsed_text)
                .unwrap_or_else(|| collapsed_text(cell)),
            id: String::new(),
        })
        .collect::<Vec<_>>();
    let logo_sel = selector("img.large_logo_image")?;
    for (team, img) in teams.iter_mut().zip(scope.select(&logo_sel)) {
        if let Some(src) = attr(img, "src") {
            team.id = logo_team_id(src).to_string();
        }
    }

    let row_sel = selector("tr")?;
    let td_sel = selector("td")?;
    let set_sel = selector("td.grey_text")?;
    let score_rows = first(scope, &selector(r#"table[style="border-collapse: collapse"]"#)?)
        .map(|table| table.select(&row_sel).collect::<Vec<_>>())
        .unwrap_or_default();

    if score_rows.len() >= 3 {
        let row_name = |idx: usize| {
            first(score_rows[idx], &td_sel)
                .map(collapsed_text)
                .unwrap_or_default()
        };
        let (first_name, second_name) = (row_name(1), row_name(2));
        match teams.len() {
            0 => {
                teams.push(BoxTeam { name: first_name, ..BoxTeam::default() });
                teams.push(BoxTeam { name: second_name, ..BoxTeam::default() });
            }
            1 => {
                if teams[0].name == first_name {
                    teams.push(BoxTeam { name: second_name, ..BoxTeam::default() });
                } else {
                    teams.insert(0, BoxTeam { name: first_name, ..BoxTeam::default() });
                }
            }
            _ => {
                if !first_name.is_empty() {
                    teams[0].name = first_name;
                }
                if !second_name.is_empty() {
                    teams[1].name = second_name;
                }
            }
        }
    }

    match teams.as_slice() {
        [away, home, ..] => {
            rec.insert("away_team_name", away.name.as_str());
            rec.insert("away_team_id", away.id.as_str());
            rec.insert("home_team_name", home.name.as_str());
            rec.insert("home_team_id", home.id.as_str());
        }
        [only] => {
            rec.insert("home_team_name", only.name.as_str());
            rec.insert("home_team_id", only.id.as_str());
        }
        [] => warn!(%url, "no teams on box score"),
    }

    let big_score_sel = selector(r#"td[style*="font-size:36px"]"#)?;
    let totals = scope
        .select(&big_score_sel)
        .map(collapsed_text)
        .collect::<Vec<_>>();
    let mut has_score = false;
    if let [away_total, home_total, ..] = totals.as_slice()
        && score_rows.len() >= 3
    {
        let sets = |row: ElementRef<'_>| row.select(&set_sel).map(collapsed_text).collect::<Vec<_>>();
        rec.insert("away_score", away_total.as_str());
        rec.insert("home_score", home_total.as_str());
        rec.insert("away_set_scores", sets(score_rows[1]));
        rec.insert("home_set_scores", sets(score_rows[2]));
        has_score = true;

        for row in score_rows.iter().skip(3) {
            let text = collapsed_text(*row);
            let date = DATE_RE.captures(&text).map(|caps| caps[1].to_string());
            if let Some(date) = &date {
                rec.insert("date", date.as_str());
                if let Some(time) = ids::clock_24h(&text) {
                    rec.insert("time", time);
                }
            }
            if date.is_none() && !text.contains("Attendance") && !text.is_empty() {
                rec.insert("location", text.as_str());
            }
            if let Some(caps) = ATTENDANCE_RE.captures(&text) {
                rec.insert("attendance", caps[1].replace(',', ""));
            }
        }
    }

    if rec.text("date").is_none() || !has_score {
        let all_text = root.text().collect::<String>();
        if rec.text("date").is_none()
            && let Some(caps) = DATE_RE.captures(&all_text)
        {
            rec.insert("date", &caps[1]);
        }
        if rec.text("time").is_none()
            && let Some(time) = ids::clock_24h(&all_text)
        {
            rec.insert("time", time);
        }
        if rec.text("attendance").is_none()
            && let Some(caps) = ATTENDANCE_RE.captures(&all_text)
        {
            rec.insert("attendance", caps[1].replace(',', ""));
        }
        if rec.text("location").is_none() {
            let location = PAREN_LOCATION_RE
                .captures(&all_text)
                .or_else(|| VENUE_RE.captures(&all_text))
                .map(|caps| caps[1].trim().to_string());
            if let Some(location) = location {
                rec.insert("location", location);
            }
        }
    }
    Ok(rec)
}

/// Every box score in the configured window, tagged with its division.
/// A failing day or page is logged and skipped.
pub fn fetch_schedule(seasons: &NcaaSeasons) -> Result<Vec<RawRecord>> {
    let mut links: Vec<(String, &SeasonMeta)> = Vec::new();
    for meta in &seasons.seasons {
        info!(division = %meta.division, season_id = %meta.season_id, "scanning NCAA scoreboards");
        for day in seasons.days() {
            let date = day.format("%m/%d/%Y").to_string();
            let url = format!(
                "{NCAA_STATS}/season_divisions/{}/livestream_scoreboards?game_date={date}",
                meta.season_id
            );
            match get_text(&url).and_then(|html| parse_scoreboard(&html)) {
                Ok(found) => {
                    if !found.is_empty() {
                        info!(%date, division = %meta.division, matches = found.len(), "found box scores");
                    }
                    links.extend(found.into_iter().map(|link| (link, meta)));
                }
                Err(err) => warn!(%date, "scoreboard fetch failed: {err:#}"),
            }
        }
    }
    info!(links = links.len(), "collected NCAA box score links");

    let mut out = Vec::new();
    for (idx, (url, meta)) in links.iter().enumerate() {
        debug!(n = idx + 1, of = links.len(), %url, "box score");
        match get_text(url).and_then(|html| parse_box_score(url, &html)) {
            Ok(rec) => out.push(
                rec.with("division", meta.division.as_str())
                    .with("division_roman", meta.division_roman())
                    .with("year", meta.year.as_str()),
            ),
            Err(err) => warn!(%url, "box score failed: {err:#}"),
        }
    }
    Ok(out)
}
