use std::collections::HashSet;

use tracing::warn;

use crate::league::League;
use crate::rows::PlayerRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPlayer {
    pub player: String,
    pub team_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub accepted: Vec<PlayerRow>,
    pub dropped: Vec<DroppedPlayer>,
}

/// Keeps the players whose `team_id` names a team already in the store for
/// the same league. `known_teams` must be read right before the call so teams
/// written earlier in the same run count.
pub fn retain_known_teams(
    league: League,
    players: Vec<PlayerRow>,
    known_teams: &HashSet<String>,
) -> Validation {
    let total = players.len();
    let mut out = Validation::default();
    for player in players {
        if known_teams.contains(&player.team_id) {
            out.accepted.push(player);
        } else {
            warn!(
                %league,
                player = %player.name,
                team_id = %player.team_id,
                "skipping player with unknown team_id"
            );
            out.dropped.push(DroppedPlayer {
                player: player.name,
                team_id: player.team_id,
            });
        }
    }
    if total > 0 && out.accepted.is_empty() {
        warn!(%league, total, "all players skipped, no valid team references");
    }
    out
}
