//! Trade proposals and their pending -> accepted/rejected lifecycle

use crate::config::RosterRules;
use crate::error::{LeagueError, Result};
use crate::roster::{plan_transfer, roster_write_error, RosterStore};
use league_store::{
    LeagueStore, NewTradeProposal, PlayerId, ProposalId, TeamId, TradeProposal, TradeSettlement,
    TradeStatus,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Trade proposal ledger
///
/// Proposals are validated against fresh rosters when they are made and
/// again when they are accepted, since either roster may change in between.
#[derive(Clone)]
pub struct TradeLedger {
    store: Arc<dyn LeagueStore>,
    rosters: RosterStore,
    require_balanced: bool,
}

impl TradeLedger {
    pub fn new(store: Arc<dyn LeagueStore>, rules: &RosterRules) -> Self {
        let rosters = RosterStore::new(store.clone());
        Self { store, rosters, require_balanced: rules.require_balanced_trades }
    }

    /// Record a new pending proposal
    pub async fn propose(
        &self,
        proposer: TeamId,
        receiver: TeamId,
        offered: Vec<PlayerId>,
        requested: Vec<PlayerId>,
    ) -> Result<TradeProposal> {
        self.validate_shape(proposer, receiver, &offered, &requested)?;

        let from = self.rosters.require(proposer).await?;
        let to = self.rosters.require(receiver).await?;
        plan_transfer(&from, &to, &offered, &requested)?;

        let proposal = self
            .store
            .insert_trade_proposal(NewTradeProposal {
                proposing_team_id: proposer,
                receiving_team_id: receiver,
                offered,
                requested,
            })
            .await?;

        tracing::info!(
            "Team {} proposed trade {} to team {}: {:?} for {:?}",
            proposer,
            proposal.id,
            receiver,
            proposal.offered,
            proposal.requested
        );
        Ok(proposal)
    }

    fn validate_shape(
        &self,
        proposer: TeamId,
        receiver: TeamId,
        offered: &[PlayerId],
        requested: &[PlayerId],
    ) -> Result<()> {
        if proposer == receiver {
            return Err(LeagueError::invalid_trade("a team cannot trade with itself"));
        }
        if offered.is_empty() {
            return Err(LeagueError::invalid_trade("at least one player must be offered"));
        }
        if self.require_balanced && offered.len() != requested.len() {
            return Err(LeagueError::invalid_trade(format!(
                "trade must be balanced: {} offered, {} requested",
                offered.len(),
                requested.len()
            )));
        }

        let mut seen = HashSet::new();
        if let Some(id) = offered.iter().chain(requested).find(|id| !seen.insert(**id)) {
            return Err(LeagueError::invalid_trade(format!("player {id} is listed more than once")));
        }
        Ok(())
    }

    pub async fn get(&self, id: ProposalId) -> Result<TradeProposal> {
        self.store
            .load_trade_proposal(id)
            .await?
            .ok_or(LeagueError::ProposalNotFound { proposal_id: id })
    }

    /// Move a pending proposal to rejected
    ///
    /// Returns false without changing anything when the proposal has already
    /// been accepted or rejected.
    pub async fn reject(&self, id: ProposalId) -> Result<bool> {
        let changed = self.store.set_trade_status(id, TradeStatus::Pending, TradeStatus::Rejected).await?;
        if changed {
            tracing::info!("Trade {} rejected", id);
            return Ok(true);
        }

        // Distinguish an unknown id from a settled proposal
        let proposal = self.get(id).await?;
        tracing::debug!("Trade {} is already {}, reject ignored", id, proposal.status);
        Ok(false)
    }

    /// Accept a pending proposal and exchange the players
    ///
    /// The status change and both roster writes commit together; on any
    /// failure the proposal stays pending and neither roster changes.
    pub async fn accept(&self, id: ProposalId) -> Result<TradeProposal> {
        let proposal = self.get(id).await?;
        if !proposal.is_pending() {
            tracing::warn!("Trade {} cannot be accepted, it is {}", id, proposal.status);
            return Err(LeagueError::ProposalNotPending { proposal_id: id, status: proposal.status });
        }

        let from = self.rosters.require(proposal.proposing_team_id).await?;
        let to = self.rosters.require(proposal.receiving_team_id).await?;
        let plan = plan_transfer(&from, &to, &proposal.offered, &proposal.requested)?;

        match self.store.settle_trade(id, &[plan.from, plan.to]).await? {
            TradeSettlement::Settled { proposal, .. } => {
                tracing::info!(
                    "Trade {} accepted: team {} sent {:?}, team {} sent {:?}",
                    id,
                    proposal.proposing_team_id,
                    proposal.offered,
                    proposal.receiving_team_id,
                    proposal.requested
                );
                Ok(proposal)
            }
            TradeSettlement::ProposalMissing => Err(LeagueError::ProposalNotFound { proposal_id: id }),
            TradeSettlement::NotPending(status) => {
                Err(LeagueError::ProposalNotPending { proposal_id: id, status })
            }
            TradeSettlement::Rosters(write) => {
                tracing::warn!("Trade {} could not be settled: {:?}", id, write);
                Err(roster_write_error(write))
            }
        }
    }

    /// Pending proposals addressed to the team, oldest first
    pub async fn list_pending_for(&self, team_id: TeamId) -> Result<Vec<TradeProposal>> {
        let mut pending: Vec<TradeProposal> = self
            .store
            .load_trade_proposals()
            .await?
            .into_iter()
            .filter(|p| p.is_pending() && p.receiving_team_id == team_id)
            .collect();
        pending.sort_by_key(|p| p.id);
        Ok(pending)
    }

    /// Pending proposals the team has sent, oldest first
    pub async fn list_outgoing_for(&self, team_id: TeamId) -> Result<Vec<TradeProposal>> {
        let mut outgoing: Vec<TradeProposal> = self
            .store
            .load_trade_proposals()
            .await?
            .into_iter()
            .filter(|p| p.is_pending() && p.proposing_team_id == team_id)
            .collect();
        outgoing.sort_by_key(|p| p.id);
        Ok(outgoing)
    }
}
