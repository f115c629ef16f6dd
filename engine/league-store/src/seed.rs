//! League seed data in external row format

use crate::error::{Result, StoreError};
use crate::rows::{convert_all, MatchupRow, PlayerRow, RosterRow, TeamRow, TradeProposalRow};
use crate::types::{Player, Roster, ScheduledMatchup, Team, TeamId, TradeProposal};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A league as stored externally: one list of rows per entity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueSeed {
    #[serde(default)]
    pub players: Vec<PlayerRow>,
    #[serde(default)]
    pub teams: Vec<TeamRow>,
    #[serde(default)]
    pub rosters: Vec<RosterRow>,
    #[serde(default)]
    pub schedule: Vec<MatchupRow>,
    #[serde(default)]
    pub trade_proposals: Vec<TradeProposalRow>,
}

/// Validated entities produced from a seed
#[derive(Debug, Clone, Default)]
pub struct LeagueEntities {
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub rosters: Vec<Roster>,
    pub schedule: Vec<ScheduledMatchup>,
    pub proposals: Vec<TradeProposal>,
}

impl LeagueSeed {
    /// Load a seed from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let seed: LeagueSeed = serde_json::from_str(&content)?;
        tracing::debug!("Loaded league seed from {:?}", path.as_ref());
        Ok(seed)
    }

    /// Write the seed to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn add_player(
        mut self,
        id: i64,
        name: &str,
        position: &str,
        nfl_team: &str,
        projected_points: f64,
    ) -> Self {
        self.players.push(PlayerRow {
            id,
            name: name.to_string(),
            position: position.to_string(),
            team: nfl_team.to_string(),
            image_url: Some(format!("https://picsum.photos/id/{id}/50")),
            projected_points,
            weekly_scores: None,
        });
        self
    }

    /// Record weekly scores for an already added player
    pub fn with_scores(mut self, player_id: i64, scores: &[f64]) -> Self {
        if let Some(row) = self.players.iter_mut().find(|p| p.id == player_id) {
            row.weekly_scores = Some(scores.to_vec());
        }
        self
    }

    pub fn add_team(mut self, id: i64, name: &str) -> Self {
        self.teams.push(TeamRow { id, name: name.to_string(), wins: 0, losses: 0, ties: 0, points_for: 0.0 });
        self
    }

    pub fn add_roster(mut self, team_id: i64, starters: &[i64], bench: &[i64]) -> Self {
        self.rosters.push(RosterRow {
            team_id,
            starters: starters.to_vec(),
            bench: bench.to_vec(),
            version: 0,
        });
        self
    }

    pub fn add_matchup(mut self, week: u32, team1_id: i64, team2_id: i64) -> Self {
        self.schedule.push(MatchupRow { week: week as i32, team1_id, team2_id });
        self
    }

    /// Convert every row and check league-wide references
    ///
    /// Rosters must belong to known teams, list only known players, and no
    /// player may appear on two rosters.
    pub fn into_entities(self) -> Result<LeagueEntities> {
        let players: Vec<Player> = convert_all(self.players)?;
        let teams: Vec<Team> = convert_all(self.teams)?;
        let rosters: Vec<Roster> = convert_all(self.rosters)?;
        let schedule: Vec<ScheduledMatchup> = convert_all(self.schedule)?;
        let proposals: Vec<TradeProposal> = convert_all(self.trade_proposals)?;

        let team_ids: HashSet<TeamId> = teams.iter().map(|t| t.id).collect();
        if team_ids.len() != teams.len() {
            return Err(StoreError::invalid_row("team", "duplicate team id in seed"));
        }
        let player_ids: HashSet<_> = players.iter().map(|p| p.id).collect();
        if player_ids.len() != players.len() {
            return Err(StoreError::invalid_row("player", "duplicate player id in seed"));
        }

        let mut owners = HashMap::new();
        for roster in &rosters {
            if !team_ids.contains(&roster.team_id) {
                return Err(StoreError::invalid_row(
                    "roster",
                    format!("roster references unknown team {}", roster.team_id),
                ));
            }
            for player_id in roster.player_ids() {
                if !player_ids.contains(&player_id) {
                    return Err(StoreError::invalid_row(
                        "roster",
                        format!("team {} rosters unknown player {player_id}", roster.team_id),
                    ));
                }
                if let Some(owner) = owners.insert(player_id, roster.team_id) {
                    return Err(StoreError::invalid_row(
                        "roster",
                        format!(
                            "player {player_id} is rostered by both team {owner} and team {}",
                            roster.team_id
                        ),
                    ));
                }
            }
        }

        for matchup in &schedule {
            if !team_ids.contains(&matchup.team1_id) || !team_ids.contains(&matchup.team2_id) {
                return Err(StoreError::invalid_row(
                    "matchup",
                    format!("week {} matchup references an unknown team", matchup.week),
                ));
            }
        }

        Ok(LeagueEntities { players, teams, rosters, schedule, proposals })
    }

    /// The built-in four-team league
    pub fn default_league() -> Self {
        LeagueSeed::default()
            // QBs
            .add_player(101, "Patrick Mahomes", "QB", "KC", 22.5)
            .add_player(102, "Josh Allen", "QB", "BUF", 24.1)
            .add_player(103, "Jalen Hurts", "QB", "PHI", 23.0)
            .add_player(104, "Lamar Jackson", "QB", "BAL", 21.8)
            .add_player(105, "C.J. Stroud", "QB", "HOU", 20.5)
            // RBs
            .add_player(201, "Christian McCaffrey", "RB", "SF", 18.7)
            .add_player(202, "Bijan Robinson", "RB", "ATL", 15.2)
            .add_player(203, "Breece Hall", "RB", "NYJ", 14.8)
            .add_player(204, "Kyren Williams", "RB", "LAR", 16.1)
            .add_player(205, "Travis Etienne Jr.", "RB", "JAC", 13.5)
            // WRs
            .add_player(301, "Justin Jefferson", "WR", "MIN", 16.5)
            .add_player(302, "CeeDee Lamb", "WR", "DAL", 17.1)
            .add_player(303, "Tyreek Hill", "WR", "MIA", 18.0)
            .add_player(304, "Amon-Ra St. Brown", "WR", "DET", 15.8)
            .add_player(305, "A.J. Brown", "WR", "PHI", 14.9)
            // TEs
            .add_player(401, "Travis Kelce", "TE", "KC", 12.3)
            .add_player(402, "Sam LaPorta", "TE", "DET", 10.5)
            .add_player(403, "Mark Andrews", "TE", "BAL", 9.8)
            .add_player(404, "George Kittle", "TE", "SF", 9.2)
            .add_team(1, "Swarchis")
            .add_team(2, "Gabriel")
            .add_team(3, "Rihito")
            .add_team(4, "Daniel")
            .add_roster(1, &[101, 201, 301], &[401])
            .add_roster(2, &[102, 202, 302], &[402])
            .add_roster(3, &[103, 203, 303], &[403])
            .add_roster(4, &[104, 204, 304], &[404])
            // Round robin: every team meets every other team once
            .add_matchup(1, 1, 2)
            .add_matchup(1, 3, 4)
            .add_matchup(2, 1, 3)
            .add_matchup(2, 2, 4)
            .add_matchup(3, 1, 4)
            .add_matchup(3, 2, 3)
    }
}
