//! Deterministic identifier derivation. Everything here is pure: the same
//! input always yields the same key, and nothing touches the network or the
//! store.

use once_cell::sync::Lazy;
use regex::Regex;

static CONTEST_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/contests/(\d+)/").expect("contest id pattern"));
static SALT_LAKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(salt)\s+(lake)\b").expect("salt lake pattern"));
static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})\s*([AaPp][Mm])").expect("clock pattern"));

/// Lower-cases and hyphen-joins the whitespace separated words of `name`.
pub fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// `first-last` in lower case. Each half keeps its inner spaces and the
/// hyphen is always written, so a missing last name yields `anna-`. Both
/// halves missing yields an empty key.
pub fn first_last(first: &str, last: &str) -> String {
    let (first, last) = (first.trim(), last.trim());
    if first.is_empty() && last.is_empty() {
        return String::new();
    }
    format!("{}-{}", first.to_lowercase(), last.to_lowercase())
}

/// Text after the final `/`. A trailing slash therefore yields "".
pub fn trailing_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or_default()
}

/// Path segment that follows `marker`, e.g. the slug in `/teams/<slug>/roster`.
pub fn segment_after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let mut parts = url.split('/');
    parts.find(|part| *part == marker)?;
    parts.next().filter(|part| !part.is_empty())
}

/// Numeric contest id from an NCAA box-score style URL, or "" when the URL
/// carries none.
pub fn contest_id(url: &str) -> String {
    CONTEST_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// `"{a}-{b} [s1a-s1b, s2a-s2b]"`. Set pairs beyond the shorter side are
/// dropped.
pub fn set_score(a_sets: &str, b_sets: &str, a_points: &[String], b_points: &[String]) -> String {
    let sets = a_points
        .iter()
        .zip(b_points)
        .map(|(a, b)| format!("{a}-{b}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{a_sets}-{b_sets} [{sets}]")
}

/// LOVB links sometimes carry "Salt Lake" with a space; the site paths use
/// "Salt-Lake".
pub fn repair_salt_lake(url: &str) -> String {
    SALT_LAKE_RE.replace_all(url, "${1}-${2}").into_owned()
}

/// First `h:mm AM/PM` in `text` as a 24 hour `HH:MM`.
pub fn clock_24h(text: &str) -> Option<String> {
    let caps = CLOCK_RE.captures(text)?;
    let mut hour = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let minute = caps.get(2)?.as_str();
    let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("pm");
    if pm && hour < 12 {
        hour += 12;
    } else if !pm && hour == 12 {
        hour = 0;
    }
    Some(format!("{hour:02}:{minute}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_whitespace() {
        assert_eq!(slug("LOVB  Salt Lake"), "lovb-salt-lake");
        assert_eq!(slug("   "), "");
    }

    #[test]
    fn first_last_keeps_inner_spaces_and_hyphen() {
        assert_eq!(first_last("Jordyn", "Poulter"), "jordyn-poulter");
        assert_eq!(first_last("Mary Kate", "Van Ness"), "mary kate-van ness");
        assert_eq!(first_last("Anna", ""), "anna-");
        assert_eq!(first_last("", "Poulter"), "-poulter");
        assert_eq!(first_last(" ", ""), "");
    }

    #[test]
    fn contest_id_from_box_score() {
        assert_eq!(
            contest_id("https://stats.ncaa.org/contests/123456/box_score"),
            "123456"
        );
        assert_eq!(contest_id("https://stats.ncaa.org/contests/abc/box_score"), "");
        assert_eq!(contest_id(""), "");
    }

    #[test]
    fn segments() {
        assert_eq!(trailing_segment("/players/8812"), "8812");
        assert_eq!(trailing_segment("https://x/scoreboard/"), "");
        assert_eq!(
            segment_after("https://www.lovb.com/teams/lovb-austin-volleyball/roster", "teams"),
            Some("lovb-austin-volleyball")
        );
        assert_eq!(segment_after("https://www.lovb.com/schedule", "teams"), None);
    }

    #[test]
    fn set_score_formats_composite() {
        let a = ["25", "22", "25", "25"].map(String::from);
        let b = ["20", "25", "18", "19"].map(String::from);
        assert_eq!(
            set_score("3", "1", &a, &b),
            "3-1 [25-20, 22-25, 25-18, 25-19]"
        );
    }

    #[test]
    fn salt_lake_repair_keeps_case() {
        assert_eq!(
            repair_salt_lake("/teams/lovb-salt lake-volleyball/matches/9"),
            "/teams/lovb-salt-lake-volleyball/matches/9"
        );
        assert_eq!(repair_salt_lake("Salt Lake at Omaha"), "Salt-Lake at Omaha");
    }

    #[test]
    fn clock_converts_to_24h() {
        assert_eq!(clock_24h("03/01/2025 7:30 PM").as_deref(), Some("19:30"));
        assert_eq!(clock_24h("12:05 am").as_deref(), Some("00:05"));
        assert_eq!(clock_24h("12:00 PM").as_deref(), Some("12:00"));
        assert_eq!(clock_24h("TBA"), None);
    }
}
