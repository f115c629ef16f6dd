//! Core entity types shared by every league component

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Player ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

/// Team ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub i64);

/// Trade proposal ID wrapper (assigned by the store, monotonic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProposalId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A player in the league's player pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    /// Player name (e.g., "Lamar Jackson")
    pub name: String,

    /// Position (e.g., "QB", "RB", "WR", "TE")
    pub position: String,

    /// NFL team abbreviation (e.g., "BAL")
    pub nfl_team: String,

    pub image_url: Option<String>,

    /// Static season projection per week
    pub projected_points: f64,

    /// Recorded weekly scores, index = week - 1
    pub weekly_scores: Vec<f64>,
}

impl Player {
    /// Recorded score for a 1-based week, if one exists
    pub fn weekly_score(&self, week: u32) -> Option<f64> {
        if week == 0 {
            return None;
        }
        self.weekly_scores.get(week as usize - 1).copied()
    }
}

/// A fantasy team and its season record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
}

impl Team {
    /// Record formatted as W-L-T
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.wins, self.losses, self.ties)
    }
}

/// A team's roster: starters count toward the weekly score, bench does not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub team_id: TeamId,
    pub starters: Vec<PlayerId>,
    pub bench: Vec<PlayerId>,

    /// Write counter; the store only accepts a write whose version matches
    pub version: i64,
}

impl Roster {
    /// Create a new roster at version 0
    pub fn new(team_id: TeamId, starters: Vec<PlayerId>, bench: Vec<PlayerId>) -> Self {
        Self { team_id, starters, bench, version: 0 }
    }

    /// Check whether the player is a starter or on the bench
    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.starters.contains(&player_id) || self.bench.contains(&player_id)
    }

    /// All player ids, starters first
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.starters.iter().chain(self.bench.iter()).copied()
    }

    /// Remove the player from starters and bench, returning whether it was present
    pub fn remove_player(&mut self, player_id: PlayerId) -> bool {
        let before = self.len();
        self.starters.retain(|id| *id != player_id);
        self.bench.retain(|id| *id != player_id);
        self.len() != before
    }

    /// First player id that appears more than once, if any
    pub fn first_duplicate(&self) -> Option<PlayerId> {
        let mut seen = std::collections::HashSet::new();
        self.player_ids().find(|id| !seen.insert(*id))
    }

    /// Total number of rostered players
    pub fn len(&self) -> usize {
        self.starters.len() + self.bench.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A head-to-head matchup on the league schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledMatchup {
    pub week: u32,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
}

impl ScheduledMatchup {
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }

    /// The other side of the matchup, if `team_id` plays in it
    pub fn opponent_of(&self, team_id: TeamId) -> Option<TeamId> {
        if self.team1_id == team_id {
            Some(self.team2_id)
        } else if self.team2_id == team_id {
            Some(self.team1_id)
        } else {
            None
        }
    }
}

/// Trade proposal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected,
}

impl TradeStatus {
    /// Column value used by the relational store
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Accepted => "accepted",
            TradeStatus::Rejected => "rejected",
        }
    }

    /// Accepted and rejected proposals never change again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Pending)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TradeStatus::Pending),
            "accepted" => Ok(TradeStatus::Accepted),
            "rejected" => Ok(TradeStatus::Rejected),
            other => Err(format!("unknown trade status '{other}'")),
        }
    }
}

/// A trade offered by one team to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub id: ProposalId,
    pub proposing_team_id: TeamId,
    pub receiving_team_id: TeamId,

    /// Players leaving the proposer's roster
    pub offered: Vec<PlayerId>,

    /// Players leaving the receiver's roster
    pub requested: Vec<PlayerId>,

    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
}

impl TradeProposal {
    pub fn is_pending(&self) -> bool {
        self.status == TradeStatus::Pending
    }

    /// Check whether the team is either side of the trade
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.proposing_team_id == team_id || self.receiving_team_id == team_id
    }
}
