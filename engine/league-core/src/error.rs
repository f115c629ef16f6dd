//! Error types for the league core

use league_store::{PlayerId, ProposalId, StoreError, TeamId, TradeStatus};
use thiserror::Error;

/// Result type for league operations
pub type Result<T> = std::result::Result<T, LeagueError>;

/// Broad classification of a failure, for callers that only branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvariantViolation,
    PreconditionNotMet,
    Unauthorized,
    ExternalIo,
}

#[derive(Error, Debug)]
pub enum LeagueError {
    #[error("Team not found: {team_id}")]
    TeamNotFound { team_id: TeamId },

    #[error("Roster not found for team {team_id}")]
    RosterNotFound { team_id: TeamId },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: PlayerId },

    #[error("Trade proposal not found: {proposal_id}")]
    ProposalNotFound { proposal_id: ProposalId },

    #[error("Player {player_id} is already owned by team {owner}")]
    PlayerAlreadyOwned { player_id: PlayerId, owner: TeamId },

    #[error("Player {player_id} is not on team {team_id}'s roster")]
    PlayerNotOnRoster { player_id: PlayerId, team_id: TeamId },

    #[error("Player {player_id} appears more than once in team {team_id}'s roster")]
    DuplicatePlayer { player_id: PlayerId, team_id: TeamId },

    #[error("Invalid trade: {message}")]
    InvalidTrade { message: String },

    #[error("Invalid lineup: expected {expected} starters, got {actual}")]
    InvalidLineup { expected: usize, actual: usize },

    #[error("Trade proposal {proposal_id} is {status}, not pending")]
    ProposalNotPending { proposal_id: ProposalId, status: TradeStatus },

    #[error("Roster for team {team_id} changed since it was read (version {expected}, now {actual})")]
    StaleRoster { team_id: TeamId, expected: i64, actual: i64 },

    #[error("Team {team_id} already has a transaction in progress")]
    Busy { team_id: TeamId },

    #[error("Invalid team name or password")]
    InvalidCredentials,

    #[error("No active session")]
    NotAuthenticated,

    #[error("Team {team_id} is not allowed to {action}")]
    Forbidden { team_id: TeamId, action: &'static str },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl LeagueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LeagueError::TeamNotFound { .. }
            | LeagueError::RosterNotFound { .. }
            | LeagueError::PlayerNotFound { .. }
            | LeagueError::ProposalNotFound { .. } => ErrorKind::NotFound,
            LeagueError::PlayerAlreadyOwned { .. }
            | LeagueError::PlayerNotOnRoster { .. }
            | LeagueError::DuplicatePlayer { .. }
            | LeagueError::InvalidTrade { .. }
            | LeagueError::InvalidLineup { .. } => ErrorKind::InvariantViolation,
            LeagueError::ProposalNotPending { .. }
            | LeagueError::StaleRoster { .. }
            | LeagueError::Busy { .. } => ErrorKind::PreconditionNotMet,
            LeagueError::InvalidCredentials
            | LeagueError::NotAuthenticated
            | LeagueError::Forbidden { .. } => ErrorKind::Unauthorized,
            LeagueError::Store(_) | LeagueError::InvalidConfig { .. } => ErrorKind::ExternalIo,
        }
    }

    pub(crate) fn invalid_trade(message: impl Into<String>) -> Self {
        LeagueError::InvalidTrade { message: message.into() }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        LeagueError::InvalidConfig { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            LeagueError::ProposalNotFound { proposal_id: ProposalId(1) }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LeagueError::PlayerAlreadyOwned { player_id: PlayerId(9), owner: TeamId(2) }.kind(),
            ErrorKind::InvariantViolation
        );
        assert_eq!(
            LeagueError::ProposalNotPending {
                proposal_id: ProposalId(1),
                status: TradeStatus::Accepted
            }
            .kind(),
            ErrorKind::PreconditionNotMet
        );
        assert_eq!(LeagueError::NotAuthenticated.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            LeagueError::Store(StoreError::internal("boom")).kind(),
            ErrorKind::ExternalIo
        );
    }

    #[test]
    fn test_error_messages() {
        let err = LeagueError::PlayerAlreadyOwned { player_id: PlayerId(9), owner: TeamId(2) };
        assert_eq!(err.to_string(), "Player 9 is already owned by team 2");

        let err = LeagueError::ProposalNotPending {
            proposal_id: ProposalId(3),
            status: TradeStatus::Rejected,
        };
        assert_eq!(err.to_string(), "Trade proposal 3 is rejected, not pending");
    }
}
