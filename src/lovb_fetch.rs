//! lovb.com pages, fetched as served. Match pages are visited only for
//! their embedded stats widget.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{info, warn};

use crate::html::{attr, collapsed_text, first, selector, stripped_text};
use crate::http_client::get_text;
use crate::ids;
use crate::record::RawRecord;

const LOVB_SITE: &str = "https://www.lovb.com";
const LOVB_MATCH_ROOT: &str = "https://lovb.com";

static NUMBER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)([A-Za-z\s'.\-]+)").expect("roster name pattern"));

pub fn fetch_teams() -> Result<Vec<RawRecord>> {
    let html = get_text(&format!("{LOVB_SITE}/teams")).context("fetch LOVB teams page")?;
    let teams = parse_teams(&html)?;
    info!(teams = teams.len(), "fetched LOVB teams");
    Ok(teams)
}

/// One record per `/teams/<slug>` link, first non-empty link text as the
/// name.
pub fn parse_teams(html: &str) -> Result<Vec<RawRecord>> {
    let doc = Html::parse_document(html);
    let sel = selector(r#"a[href*="/teams/"]"#)?;
    let mut found: Vec<(String, String)> = Vec::new();
    for link in doc.select(&sel) {
        let Some(href) = attr(link, "href") else {
            continue;
        };
        let path = href.trim_end_matches('/');
        let Some(slug) = ids::segment_after(path, "teams") else {
            continue;
        };
        // Only the team root, not its roster or match pages.
        if !path.ends_with(slug) {
            continue;
        }
        let name = collapsed_text(link);
        match found.iter().position(|(known, _)| known == slug) {
            Some(idx) if found[idx].1.is_empty() => found[idx].1 = name,
            Some(_) => {}
            None => found.push((slug.to_string(), name)),
        }
    }
    Ok(found
        .into_iter()
        .filter(|(_, name)| !name.is_empty())
        .map(|(slug, name)| {
            RawRecord::new()
                .with("url", format!("{LOVB_SITE}/teams/{slug}"))
                .with("slug", slug)
                .with("name", name)
        })
        .collect())
}

pub fn fetch_rosters() -> Result<Vec<RawRecord>> {
    let teams = fetch_teams()?;
    let mut out = Vec::new();
    for team in &teams {
        let (Some(team_url), Some(name)) = (team.text("url"), team.text("name")) else {
            continue;
        };
        let url = format!("{team_url}/roster");
        match get_text(&url).and_then(|html| parse_roster(&html, &url, &name)) {
            Ok(rows) if rows.is_empty() => warn!(%url, "no roster table"),
            Ok(rows) => {
                info!(team = %name, players = rows.len(), "fetched LOVB roster");
                out.extend(rows);
            }
            Err(err) => warn!(%url, "LOVB roster failed: {err:#}"),
        }
    }
    Ok(out)
}

/// Inserts a space at each lower-to-upper case boundary: "JordynPoulter"
/// reads "Jordyn Poulter".
pub fn split_camel(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for ch in s.chars() {
        if ch.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = ch.is_lowercase();
        out.push(ch);
    }
    out
}

/// Rows of every `roster-table`. The first cell glues the jersey number to
/// the name; the other cells are keyed by their column header.
pub fn parse_roster(html: &str, url: &str, team_name: &str) -> Result<Vec<RawRecord>> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table.roster-table")?;
    let th_sel = selector("th")?;
    let tr_sel = selector("tr")?;
    let td_sel = selector("td")?;

    let mut out = Vec::new();
    for table in doc.select(&table_sel) {
        let headers = table.select(&th_sel).map(stripped_text).collect::<Vec<_>>();
        for row in table.select(&tr_sel).skip(1) {
            let cells = row.select(&td_sel).collect::<Vec<_>>();
            let Some((lead, rest)) = cells.split_first() else {
                continue;
            };
            let lead = stripped_text(*lead);
            let (number, name) = match NUMBER_NAME_RE.captures(&lead) {
                Some(caps) => (caps[1].to_string(), split_camel(caps[2].trim())),
                None => (String::new(), lead.clone()),
            };
            let mut rec = RawRecord::new()
                .with("url", url)
                .with("team", team_name)
                .with("Player Number", number)
                .with("Name", name);
            for (header, cell) in headers.iter().skip(1).zip(rest) {
                if !header.is_empty() {
                    rec.insert(header, stripped_text(*cell));
                }
            }
            out.push(rec);
        }
    }
    Ok(out)
}

/// Schedule cards with each played match's widget URL attached.
pub fn fetch_schedule() -> Result<Vec<RawRecord>> {
    let html = get_text(&format!("{LOVB_SITE}/schedule")).context("fetch LOVB schedule")?;
    let mut matches = parse_schedule(&html)?;
    for rec in &mut matches {
        let Some(link) = rec.text("details_link") else {
            continue;
        };
        let url = format!("{LOVB_MATCH_ROOT}{}", ids::repair_salt_lake(&link));
        match get_text(&url).and_then(|page| parse_match_iframe(&page)) {
            Ok(Some(src)) => rec.insert("iframe_src", src),
            Ok(None) => {}
            Err(err) => warn!(%url, "LOVB match page failed: {err:#}"),
        }
    }
    info!(matches = matches.len(), "fetched LOVB schedule");
    Ok(matches)
}

pub fn parse_schedule(html: &str) -> Result<Vec<RawRecord>> {
    let doc = Html::parse_document(html);
    let week_sel = selector(r#"div[class="mb-lg grid w-full gap-lg"]"#)?;
    let match_sel = selector(r#"div[class="[&>header]:first-of-type:rounded-t-md"]"#)?;
    let loose_match_sel = selector(r#"div[class*="flex-1"][class*="[&>header]"]"#)?;

    let mut out = Vec::new();
    for week in doc.select(&week_sel) {
        let mut cards = week.select(&match_sel).collect::<Vec<_>>();
        if cards.is_empty() {
            cards = week.select(&loose_match_sel).collect();
        }
        for card in cards {
            if let Some(rec) = parse_match_card(card)? {
                out.push(rec);
            }
        }
    }
    Ok(out)
}

fn parse_match_card(card: ElementRef<'_>) -> Result<Option<RawRecord>> {
    let date_sel = selector(r#"div[class="flex items-center gap-sm text-text-secondary"]"#)?;
    let link_sel = selector(r#"a[class="link-hover flex items-center gap-sm text-xs"]"#)?;
    let team_link_sel = selector(r#"a[class="group link-hover flex items-center gap-sm"]"#)?;
    let label_sel = selector(r#"div[class="text-pretty text-sm"]"#)?;
    let score_row_sel = selector(r#"div[class="flex items-center gap-sm"]"#)?;
    let set_sel = selector(r#"div[class*="size-4"]"#)?;

    let mut rec = RawRecord::new();
    if let Some(date) = first(card, &date_sel) {
        rec.insert("date", collapsed_text(date));
    }
    if let Some(href) = first(card, &link_sel).and_then(|a| attr(a, "href")) {
        rec.insert("details_link", href);
    }

    let Some(section) = first(card, &selector("section")?) else {
        warn!("LOVB match card without a section");
        return Ok(None);
    };
    let teams = section
        .select(&team_link_sel)
        .filter_map(|link| first(link, &label_sel))
        .map(collapsed_text)
        .collect::<Vec<_>>();
    let [team_1, team_2, ..] = teams.as_slice() else {
        warn!("LOVB match card with fewer than two teams");
        return Ok(None);
    };
    rec.insert("first_team", team_1.as_str());
    rec.insert("second_team", team_2.as_str());

    let sides = section
        .select(&score_row_sel)
        .filter_map(|row| {
            let sets = row.select(&set_sel).map(collapsed_text).collect::<Vec<_>>();
            if sets.is_empty() {
                return None;
            }
            let won = first(row, &label_sel)
                .map(collapsed_text)
                .unwrap_or_else(|| "0".to_string());
            Some((won, sets))
        })
        .take(2)
        .collect::<Vec<_>>();
    for ((won, sets), side) in sides.into_iter().zip(["first", "second"]) {
        rec.insert(&format!("{side}_sets_won"), won);
        rec.insert(&format!("{side}_set_scores"), sets);
    }
    Ok(Some(rec))
}

/// The VolleyStation play-by-play widget URL embedded in a match page.
pub fn parse_match_iframe(html: &str) -> Result<Option<String>> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    for css in [r#"iframe[class*="mt-2xl"][src]"#, r#"iframe[src*="play-by-play"]"#] {
        if let Some(src) = first(root, &selector(css)?).and_then(|el| attr(el, "src")) {
            return Ok(Some(src.to_string()));
        }
    }
    Ok(None)
}
