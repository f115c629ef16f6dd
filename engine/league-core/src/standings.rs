//! League standings and the player pool

use crate::cache::LeagueCache;
use league_store::{Player, Team};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Teams ordered by wins, then points for, both descending
pub fn standings(cache: &LeagueCache) -> Vec<Team> {
    let mut teams = cache.teams();
    teams.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.points_for.partial_cmp(&a.points_for).unwrap_or(Ordering::Equal))
    });
    teams
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerFilter {
    #[default]
    FreeAgents,
    All,
}

impl std::str::FromStr for PlayerFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" | "free_agents" | "fa" => Ok(PlayerFilter::FreeAgents),
            "all" => Ok(PlayerFilter::All),
            other => Err(format!("unknown player filter '{other}'")),
        }
    }
}

/// A player together with the name of the team that rosters them
#[derive(Debug, Clone, Serialize)]
pub struct PoolEntry {
    pub player: Player,
    pub owner: Option<String>,
}

impl PoolEntry {
    pub fn is_free_agent(&self) -> bool {
        self.owner.is_none()
    }
}

pub fn player_pool(cache: &LeagueCache, filter: PlayerFilter) -> Vec<PoolEntry> {
    cache
        .players()
        .into_iter()
        .map(|player| {
            let owner = cache.owner_of(player.id).and_then(|team_id| cache.team(team_id)).map(|t| t.name);
            PoolEntry { player, owner }
        })
        .filter(|entry| filter == PlayerFilter::All || entry.is_free_agent())
        .collect()
}
