/// A normalized record ready for the store. `column` returns the value bound
/// to a named table column; unknown columns and absent values bind as NULL.
pub trait Row {
    fn natural_key(&self) -> &str;
    fn display_name(&self) -> &str;
    fn column(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRow {
    pub team_id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub image_url: Option<String>,
    pub canonical_url: Option<String>,
    pub division: Option<String>,
    pub conference: Option<String>,
    pub conference_short: Option<String>,
    pub level: Option<String>,
    pub current_roster_id: Option<String>,
    pub current_season_id: Option<String>,
}

impl Row for TeamRow {
    fn natural_key(&self) -> &str {
        &self.team_id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn column(&self, name: &str) -> Option<String> {
        match name {
            "team_id" => Some(self.team_id.clone()),
            "name" => Some(self.name.clone()),
            "short_name" => self.short_name.clone(),
            "image_url" => self.image_url.clone(),
            "canonical_url" => self.canonical_url.clone(),
            "division" => self.division.clone(),
            "conference" => self.conference.clone(),
            "conference_short" => self.conference_short.clone(),
            "level" => self.level.clone(),
            "current_roster_id" => self.current_roster_id.clone(),
            "current_season_id" => self.current_season_id.clone(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRow {
    pub player_id: String,
    pub name: String,
    pub jersey_number: Option<String>,
    pub profile_url: Option<String>,
    pub team_id: String,
    pub team_name: Option<String>,
    pub team_short: Option<String>,
    pub conference: Option<String>,
    pub level: Option<String>,
    pub division: Option<String>,
    pub data_source: Option<String>,
    pub position: Option<String>,
    pub height: Option<String>,
    pub hometown: Option<String>,
    pub college: Option<String>,
    pub pro_experience: Option<String>,
    pub high_school: Option<String>,
    pub class_year: Option<String>,
    pub year: Option<String>,
    pub season_id: Option<String>,
}

impl Row for PlayerRow {
    fn natural_key(&self) -> &str {
        &self.player_id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn column(&self, name: &str) -> Option<String> {
        match name {
            "player_id" => Some(self.player_id.clone()),
            "name" => Some(self.name.clone()),
            "jersey_number" => self.jersey_number.clone(),
            "profile_url" => self.profile_url.clone(),
            "team_id" => Some(self.team_id.clone()),
            "team_name" => self.team_name.clone(),
            "team_short" => self.team_short.clone(),
            "conference" => self.conference.clone(),
            "level" => self.level.clone(),
            "division" => self.division.clone(),
            "data_source" => self.data_source.clone(),
            "position" => self.position.clone(),
            "height" => self.height.clone(),
            "hometown" => self.hometown.clone(),
            "college" => self.college.clone(),
            "pro_experience" => self.pro_experience.clone(),
            "high_school" => self.high_school.clone(),
            "class_year" => self.class_year.clone(),
            "year" => self.year.clone(),
            "season_id" => self.season_id.clone(),
            _ => None,
        }
    }
}

/// One match, scheduled or played. Home and away ids are free text; nothing
/// checks them against the teams table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRow {
    pub match_id: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub home_team_id: Option<String>,
    pub home_team_name: Option<String>,
    pub home_team_score: Option<String>,
    pub away_team_id: Option<String>,
    pub away_team_name: Option<String>,
    pub away_team_score: Option<String>,
    pub score: Option<String>,
    pub attendance: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
    pub season_id: Option<String>,
    pub match_url: Option<String>,
    pub team_stats: Option<String>,
    pub scoreboard: Option<String>,
    pub video: Option<String>,
    pub volley_station_match_id: Option<String>,
    pub box_score: Option<String>,
    pub officials: Option<String>,
    pub pbp: Option<String>,
    pub individual_stats: Option<String>,
    pub division: Option<String>,
    pub division_roman: Option<String>,
    pub year: Option<String>,
}

impl Row for ResultRow {
    fn natural_key(&self) -> &str {
        &self.match_id
    }

    fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.home_team_name.as_deref())
            .unwrap_or(&self.match_id)
    }

    fn column(&self, name: &str) -> Option<String> {
        let value = match name {
            "match_id" => return Some(self.match_id.clone()),
            "date" => &self.date,
            "time" => &self.time,
            "location" => &self.location,
            "home_team_id" => &self.home_team_id,
            "home_team_name" => &self.home_team_name,
            "home_team_score" => &self.home_team_score,
            "away_team_id" => &self.away_team_id,
            "away_team_name" => &self.away_team_name,
            "away_team_score" => &self.away_team_score,
            "score" => &self.score,
            "attendance" => &self.attendance,
            "status" => &self.status,
            "title" => &self.title,
            "season_id" => &self.season_id,
            "match_url" => &self.match_url,
            "team_stats" => &self.team_stats,
            "scoreboard" => &self.scoreboard,
            "video" => &self.video,
            "volley_station_match_id" => &self.volley_station_match_id,
            "box_score" => &self.box_score,
            "officials" => &self.officials,
            "pbp" => &self.pbp,
            "individual_stats" => &self.individual_stats,
            "division" => &self.division,
            "division_roman" => &self.division_roman,
            "year" => &self.year,
            _ => return None,
        };
        value.clone()
    }
}
