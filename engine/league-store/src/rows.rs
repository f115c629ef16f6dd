//! Schema adapter between external store rows and league entities
//!
//! The relational store (and the JSON seed format) uses snake_case column
//! names that do not always match entity field names. Each entity has one row
//! struct carrying the external names, one field table mapping external column
//! to entity field, and a validating `TryFrom` conversion. Nothing outside this
//! module knows the external names.

use crate::error::{Result, StoreError};
use crate::types::{
    Player, PlayerId, ProposalId, Roster, ScheduledMatchup, Team, TeamId, TradeProposal,
    TradeStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// (external column, entity field)
pub type FieldMap = &'static [(&'static str, &'static str)];

pub const PLAYER_FIELDS: FieldMap = &[
    ("id", "id"),
    ("name", "name"),
    ("position", "position"),
    ("team", "nfl_team"),
    ("image_url", "image_url"),
    ("projected_points", "projected_points"),
    ("weekly_scores", "weekly_scores"),
];

pub const TEAM_FIELDS: FieldMap = &[
    ("id", "id"),
    ("name", "name"),
    ("wins", "wins"),
    ("losses", "losses"),
    ("ties", "ties"),
    ("points_for", "points_for"),
];

pub const ROSTER_FIELDS: FieldMap = &[
    ("team_id", "team_id"),
    ("starters", "starters"),
    ("bench", "bench"),
    ("version", "version"),
];

pub const MATCHUP_FIELDS: FieldMap =
    &[("week", "week"), ("team1_id", "team1_id"), ("team2_id", "team2_id")];

pub const TRADE_PROPOSAL_FIELDS: FieldMap = &[
    ("id", "id"),
    ("proposing_team_id", "proposing_team_id"),
    ("receiving_team_id", "receiving_team_id"),
    ("offered_player_ids", "offered"),
    ("requested_player_ids", "requested"),
    ("status", "status"),
    ("created_at", "created_at"),
];

/// Comma-separated external column list for a SELECT
pub fn column_list(fields: FieldMap) -> String {
    fields.iter().map(|(column, _)| *column).collect::<Vec<_>>().join(", ")
}

/// External column backing an entity field
pub fn column_for(fields: FieldMap, field: &str) -> Option<&'static str> {
    fields.iter().find(|(_, f)| *f == field).map(|(column, _)| *column)
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerRow {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub team: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub projected_points: f64,
    #[serde(default)]
    pub weekly_scores: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub wins: i32,
    #[serde(default)]
    pub losses: i32,
    #[serde(default)]
    pub ties: i32,
    #[serde(default)]
    pub points_for: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RosterRow {
    pub team_id: i64,
    pub starters: Vec<i64>,
    pub bench: Vec<i64>,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchupRow {
    pub week: i32,
    pub team1_id: i64,
    pub team2_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TradeProposalRow {
    pub id: i64,
    pub proposing_team_id: i64,
    pub receiving_team_id: i64,
    pub offered_player_ids: Vec<i64>,
    pub requested_player_ids: Vec<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

fn positive_id(entity: &'static str, field: &str, value: i64) -> Result<i64> {
    if value <= 0 {
        return Err(StoreError::invalid_row(entity, format!("{field} must be positive, got {value}")));
    }
    Ok(value)
}

fn non_negative_count(entity: &'static str, field: &str, value: i32) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::invalid_row(entity, format!("{field} must be >= 0, got {value}")))
}

fn player_ids(entity: &'static str, field: &str, ids: Vec<i64>) -> Result<Vec<PlayerId>> {
    ids.into_iter().map(|id| positive_id(entity, field, id).map(PlayerId)).collect()
}

impl TryFrom<PlayerRow> for Player {
    type Error = StoreError;

    fn try_from(row: PlayerRow) -> Result<Self> {
        let id = positive_id("player", "id", row.id)?;
        if row.name.trim().is_empty() {
            return Err(StoreError::invalid_row("player", format!("player {id} has an empty name")));
        }
        if !row.projected_points.is_finite() {
            return Err(StoreError::invalid_row(
                "player",
                format!("player {id} has a non-finite projection"),
            ));
        }
        let weekly_scores = row.weekly_scores.unwrap_or_default();
        if weekly_scores.iter().any(|score| !score.is_finite()) {
            return Err(StoreError::invalid_row(
                "player",
                format!("player {id} has a non-finite weekly score"),
            ));
        }

        Ok(Player {
            id: PlayerId(id),
            name: row.name,
            position: row.position,
            nfl_team: row.team,
            image_url: row.image_url,
            projected_points: row.projected_points,
            weekly_scores,
        })
    }
}

impl From<&Player> for PlayerRow {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.0,
            name: player.name.clone(),
            position: player.position.clone(),
            team: player.nfl_team.clone(),
            image_url: player.image_url.clone(),
            projected_points: player.projected_points,
            weekly_scores: if player.weekly_scores.is_empty() {
                None
            } else {
                Some(player.weekly_scores.clone())
            },
        }
    }
}

impl TryFrom<TeamRow> for Team {
    type Error = StoreError;

    fn try_from(row: TeamRow) -> Result<Self> {
        let id = positive_id("team", "id", row.id)?;
        if row.name.trim().is_empty() {
            return Err(StoreError::invalid_row("team", format!("team {id} has an empty name")));
        }
        if !row.points_for.is_finite() {
            return Err(StoreError::invalid_row("team", format!("team {id} has invalid points_for")));
        }

        Ok(Team {
            id: TeamId(id),
            name: row.name,
            wins: non_negative_count("team", "wins", row.wins)?,
            losses: non_negative_count("team", "losses", row.losses)?,
            ties: non_negative_count("team", "ties", row.ties)?,
            points_for: row.points_for,
        })
    }
}

/// Record counts saturate at the column's range
fn count_column(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

impl From<&Team> for TeamRow {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id.0,
            name: team.name.clone(),
            wins: count_column(team.wins),
            losses: count_column(team.losses),
            ties: count_column(team.ties),
            points_for: team.points_for,
        }
    }
}

impl TryFrom<RosterRow> for Roster {
    type Error = StoreError;

    fn try_from(row: RosterRow) -> Result<Self> {
        let team_id = TeamId(positive_id("roster", "team_id", row.team_id)?);
        if row.version < 0 {
            return Err(StoreError::invalid_row(
                "roster",
                format!("roster {team_id} has negative version {}", row.version),
            ));
        }

        let roster = Roster {
            team_id,
            starters: player_ids("roster", "starters", row.starters)?,
            bench: player_ids("roster", "bench", row.bench)?,
            version: row.version,
        };

        if let Some(duplicate) = roster.first_duplicate() {
            return Err(StoreError::invalid_row(
                "roster",
                format!("roster {team_id} lists player {duplicate} more than once"),
            ));
        }

        Ok(roster)
    }
}

impl From<&Roster> for RosterRow {
    fn from(roster: &Roster) -> Self {
        Self {
            team_id: roster.team_id.0,
            starters: roster.starters.iter().map(|id| id.0).collect(),
            bench: roster.bench.iter().map(|id| id.0).collect(),
            version: roster.version,
        }
    }
}

impl TryFrom<MatchupRow> for ScheduledMatchup {
    type Error = StoreError;

    fn try_from(row: MatchupRow) -> Result<Self> {
        if row.week < 1 {
            return Err(StoreError::invalid_row("matchup", format!("week must be >= 1, got {}", row.week)));
        }
        let team1 = positive_id("matchup", "team1_id", row.team1_id)?;
        let team2 = positive_id("matchup", "team2_id", row.team2_id)?;
        if team1 == team2 {
            return Err(StoreError::invalid_row(
                "matchup",
                format!("team {team1} cannot play itself in week {}", row.week),
            ));
        }

        Ok(ScheduledMatchup { week: row.week as u32, team1_id: TeamId(team1), team2_id: TeamId(team2) })
    }
}

impl From<&ScheduledMatchup> for MatchupRow {
    fn from(matchup: &ScheduledMatchup) -> Self {
        Self {
            week: matchup.week as i32,
            team1_id: matchup.team1_id.0,
            team2_id: matchup.team2_id.0,
        }
    }
}

impl TryFrom<TradeProposalRow> for TradeProposal {
    type Error = StoreError;

    fn try_from(row: TradeProposalRow) -> Result<Self> {
        let id = positive_id("trade_proposal", "id", row.id)?;
        let status = row
            .status
            .parse::<TradeStatus>()
            .map_err(|e| StoreError::invalid_row("trade_proposal", format!("proposal {id}: {e}")))?;

        Ok(TradeProposal {
            id: ProposalId(id),
            proposing_team_id: TeamId(positive_id(
                "trade_proposal",
                "proposing_team_id",
                row.proposing_team_id,
            )?),
            receiving_team_id: TeamId(positive_id(
                "trade_proposal",
                "receiving_team_id",
                row.receiving_team_id,
            )?),
            offered: player_ids("trade_proposal", "offered_player_ids", row.offered_player_ids)?,
            requested: player_ids(
                "trade_proposal",
                "requested_player_ids",
                row.requested_player_ids,
            )?,
            status,
            created_at: row.created_at,
        })
    }
}

impl From<&TradeProposal> for TradeProposalRow {
    fn from(proposal: &TradeProposal) -> Self {
        Self {
            id: proposal.id.0,
            proposing_team_id: proposal.proposing_team_id.0,
            receiving_team_id: proposal.receiving_team_id.0,
            offered_player_ids: proposal.offered.iter().map(|id| id.0).collect(),
            requested_player_ids: proposal.requested.iter().map(|id| id.0).collect(),
            status: proposal.status.as_str().to_string(),
            created_at: proposal.created_at,
        }
    }
}

/// Convert a batch of rows, failing on the first invalid one
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}
