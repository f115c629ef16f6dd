//! League store trait and write outcomes

use crate::error::Result;
use crate::types::{
    Player, PlayerId, ProposalId, Roster, ScheduledMatchup, Team, TeamId, TradeProposal,
    TradeStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of an all-or-nothing roster write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterWrite {
    /// Every roster was written; versions are the new stored versions
    Applied(Vec<Roster>),
    /// No roster exists for this team; nothing was written
    Missing(TeamId),
    /// The stored version differs from the one the write was planned against;
    /// nothing was written
    Stale { team_id: TeamId, expected: i64, actual: i64 },
    /// A player in the write is rostered by a team outside it; nothing was
    /// written
    Conflict { player_id: PlayerId, owner: TeamId },
}

/// Outcome of settling an accepted trade
#[derive(Debug, Clone, PartialEq)]
pub enum TradeSettlement {
    /// Status moved pending -> accepted and both rosters were written
    Settled { proposal: TradeProposal, rosters: Vec<Roster> },
    /// No proposal with this id
    ProposalMissing,
    /// The proposal had already left `Pending`
    NotPending(TradeStatus),
    /// The roster write could not be applied; the proposal stays pending
    Rosters(RosterWrite),
}

/// First player that would sit on two rosters at once
pub(crate) fn find_conflict(rosters: &[&Roster]) -> Option<RosterWrite> {
    let mut owners: HashMap<PlayerId, TeamId> = HashMap::new();
    for roster in rosters {
        for player_id in roster.player_ids() {
            if let Some(owner) = owners.insert(player_id, roster.team_id) {
                if owner != roster.team_id {
                    return Some(RosterWrite::Conflict { player_id, owner });
                }
            }
        }
    }
    None
}

/// A proposal as submitted, before the store assigns its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTradeProposal {
    pub proposing_team_id: TeamId,
    pub receiving_team_id: TeamId,
    pub offered: Vec<PlayerId>,
    pub requested: Vec<PlayerId>,
}

/// Abstract trait for league storage backends
///
/// Roster writes are compare-and-swap: each roster passed in carries the
/// version it was read at, and the backend bumps it by one on success.
#[async_trait::async_trait]
pub trait LeagueStore: Send + Sync {
    /// Select all players
    async fn load_players(&self) -> Result<Vec<Player>>;

    /// Select all teams
    async fn load_teams(&self) -> Result<Vec<Team>>;

    /// Select all rosters
    async fn load_rosters(&self) -> Result<Vec<Roster>>;

    /// Select the full schedule
    async fn load_schedule(&self) -> Result<Vec<ScheduledMatchup>>;

    /// Select all trade proposals in id order
    async fn load_trade_proposals(&self) -> Result<Vec<TradeProposal>>;

    /// Load a single roster
    async fn load_roster(&self, team_id: TeamId) -> Result<Option<Roster>>;

    /// Load a single trade proposal
    async fn load_trade_proposal(&self, id: ProposalId) -> Result<Option<TradeProposal>>;

    /// Write one or more rosters atomically
    async fn update_rosters(&self, rosters: &[Roster]) -> Result<RosterWrite>;

    /// Insert a new proposal in `Pending` status
    async fn insert_trade_proposal(&self, proposal: NewTradeProposal) -> Result<TradeProposal>;

    /// Move a proposal from `from` to `to`; returns false if its status was not `from`
    async fn set_trade_status(
        &self,
        id: ProposalId,
        from: TradeStatus,
        to: TradeStatus,
    ) -> Result<bool>;

    /// Mark a pending proposal accepted and write the traded rosters in one step
    async fn settle_trade(&self, id: ProposalId, rosters: &[Roster]) -> Result<TradeSettlement>;
}
