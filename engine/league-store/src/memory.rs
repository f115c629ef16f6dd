//! In-memory league store

use crate::backend::{find_conflict, LeagueStore, NewTradeProposal, RosterWrite, TradeSettlement};
use crate::error::{Result, StoreError};
use crate::seed::LeagueSeed;
use crate::types::{
    Player, ProposalId, Roster, ScheduledMatchup, Team, TeamId, TradeProposal, TradeStatus,
};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct LeagueState {
    players: Vec<Player>,
    teams: Vec<Team>,
    rosters: HashMap<TeamId, Roster>,
    schedule: Vec<ScheduledMatchup>,
    proposals: BTreeMap<ProposalId, TradeProposal>,
    next_proposal_id: i64,
}

impl LeagueState {
    /// Check every roster against its stored version and league-wide
    /// ownership without writing anything
    fn check_write(&self, rosters: &[Roster]) -> Option<RosterWrite> {
        for roster in rosters {
            match self.rosters.get(&roster.team_id) {
                None => return Some(RosterWrite::Missing(roster.team_id)),
                Some(stored) if stored.version != roster.version => {
                    return Some(RosterWrite::Stale {
                        team_id: roster.team_id,
                        expected: roster.version,
                        actual: stored.version,
                    });
                }
                Some(_) => {}
            }
        }

        let mut after: Vec<&Roster> = self
            .rosters
            .values()
            .filter(|stored| rosters.iter().all(|r| r.team_id != stored.team_id))
            .collect();
        after.extend(rosters.iter());
        find_conflict(&after)
    }

    fn apply_rosters(&mut self, rosters: &[Roster]) -> Vec<Roster> {
        rosters
            .iter()
            .map(|roster| {
                let written = Roster { version: roster.version + 1, ..roster.clone() };
                self.rosters.insert(written.team_id, written.clone());
                written
            })
            .collect()
    }
}

/// In-memory league store (tests, demos and single-process runs)
///
/// All writes happen under one lock, so multi-roster writes are atomic.
#[derive(Debug, Default)]
pub struct InMemoryLeagueStore {
    state: RwLock<LeagueState>,
}

impl InMemoryLeagueStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the seed's league
    pub fn from_seed(seed: LeagueSeed) -> Result<Self> {
        let league = seed.into_entities()?;

        let mut rosters = HashMap::new();
        for roster in league.rosters {
            if rosters.insert(roster.team_id, roster).is_some() {
                return Err(StoreError::invalid_row("roster", "more than one roster for a team"));
            }
        }

        let next_proposal_id =
            league.proposals.iter().map(|p| p.id.0).max().unwrap_or(0) + 1;
        let proposals = league.proposals.into_iter().map(|p| (p.id, p)).collect();

        tracing::debug!(
            "Seeded in-memory store: {} players, {} teams, {} rosters",
            league.players.len(),
            league.teams.len(),
            rosters.len()
        );

        Ok(Self {
            state: RwLock::new(LeagueState {
                players: league.players,
                teams: league.teams,
                rosters,
                schedule: league.schedule,
                proposals,
                next_proposal_id,
            }),
        })
    }
}

#[async_trait::async_trait]
impl LeagueStore for InMemoryLeagueStore {
    async fn load_players(&self) -> Result<Vec<Player>> {
        Ok(self.state.read().await.players.clone())
    }

    async fn load_teams(&self) -> Result<Vec<Team>> {
        Ok(self.state.read().await.teams.clone())
    }

    async fn load_rosters(&self) -> Result<Vec<Roster>> {
        let state = self.state.read().await;
        let mut rosters: Vec<Roster> = state.rosters.values().cloned().collect();
        rosters.sort_by_key(|r| r.team_id);
        Ok(rosters)
    }

    async fn load_schedule(&self) -> Result<Vec<ScheduledMatchup>> {
        Ok(self.state.read().await.schedule.clone())
    }

    async fn load_trade_proposals(&self) -> Result<Vec<TradeProposal>> {
        Ok(self.state.read().await.proposals.values().cloned().collect())
    }

    async fn load_roster(&self, team_id: TeamId) -> Result<Option<Roster>> {
        Ok(self.state.read().await.rosters.get(&team_id).cloned())
    }

    async fn load_trade_proposal(&self, id: ProposalId) -> Result<Option<TradeProposal>> {
        Ok(self.state.read().await.proposals.get(&id).cloned())
    }

    async fn update_rosters(&self, rosters: &[Roster]) -> Result<RosterWrite> {
        let mut state = self.state.write().await;
        if let Some(rejected) = state.check_write(rosters) {
            return Ok(rejected);
        }
        Ok(RosterWrite::Applied(state.apply_rosters(rosters)))
    }

    async fn insert_trade_proposal(&self, proposal: NewTradeProposal) -> Result<TradeProposal> {
        let mut state = self.state.write().await;
        let id = ProposalId(state.next_proposal_id);
        state.next_proposal_id += 1;

        let stored = TradeProposal {
            id,
            proposing_team_id: proposal.proposing_team_id,
            receiving_team_id: proposal.receiving_team_id,
            offered: proposal.offered,
            requested: proposal.requested,
            status: TradeStatus::Pending,
            created_at: chrono::Utc::now(),
        };
        state.proposals.insert(id, stored.clone());

        Ok(stored)
    }

    async fn set_trade_status(
        &self,
        id: ProposalId,
        from: TradeStatus,
        to: TradeStatus,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.proposals.get_mut(&id) {
            Some(proposal) if proposal.status == from => {
                proposal.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn settle_trade(&self, id: ProposalId, rosters: &[Roster]) -> Result<TradeSettlement> {
        let mut state = self.state.write().await;

        match state.proposals.get(&id) {
            None => return Ok(TradeSettlement::ProposalMissing),
            Some(proposal) if !proposal.is_pending() => {
                return Ok(TradeSettlement::NotPending(proposal.status));
            }
            Some(_) => {}
        }

        if let Some(rejected) = state.check_write(rosters) {
            return Ok(TradeSettlement::Rosters(rejected));
        }

        let written = state.apply_rosters(rosters);
        let proposal = state
            .proposals
            .get_mut(&id)
            .ok_or_else(|| StoreError::internal(format!("proposal {id} vanished under lock")))?;
        proposal.status = TradeStatus::Accepted;

        Ok(TradeSettlement::Settled { proposal: proposal.clone(), rosters: written })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerId;

    fn ids(raw: &[i64]) -> Vec<PlayerId> {
        raw.iter().copied().map(PlayerId).collect()
    }

    fn two_team_store() -> InMemoryLeagueStore {
        let mut seed = LeagueSeed::default().add_team(1, "A").add_team(2, "B");
        for id in 1..=9 {
            seed = seed.add_player(id, &format!("Player {id}"), "WR", "FA", 10.0);
        }
        let seed = seed.add_roster(1, &[1, 2, 3], &[4]).add_roster(2, &[5, 6, 7], &[8]);
        InMemoryLeagueStore::from_seed(seed).unwrap()
    }

    #[tokio::test]
    async fn test_update_rosters_bumps_version() {
        let store = two_team_store();
        let mut roster = store.load_roster(TeamId(1)).await.unwrap().unwrap();
        roster.bench.push(PlayerId(9));

        match store.update_rosters(&[roster]).await.unwrap() {
            RosterWrite::Applied(written) => assert_eq!(written[0].version, 1),
            other => panic!("Expected Applied, got {other:?}"),
        }

        let stored = store.load_roster(TeamId(1)).await.unwrap().unwrap();
        assert_eq!(stored.bench, ids(&[4, 9]));
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_stale_write_is_rejected_without_partial_apply() {
        let store = two_team_store();
        let team1 = store.load_roster(TeamId(1)).await.unwrap().unwrap();
        let mut team2 = store.load_roster(TeamId(2)).await.unwrap().unwrap();

        // Someone else writes team 2 first
        store.update_rosters(&[team2.clone()]).await.unwrap();

        let mut changed1 = team1.clone();
        changed1.bench.clear();
        team2.bench.clear();

        let outcome = store.update_rosters(&[changed1, team2]).await.unwrap();
        assert_eq!(outcome, RosterWrite::Stale { team_id: TeamId(2), expected: 0, actual: 1 });

        let stored1 = store.load_roster(TeamId(1)).await.unwrap().unwrap();
        assert_eq!(stored1, team1);
    }

    #[tokio::test]
    async fn test_missing_roster_write() {
        let store = two_team_store();
        let ghost = Roster::new(TeamId(42), vec![], vec![]);
        assert_eq!(store.update_rosters(&[ghost]).await.unwrap(), RosterWrite::Missing(TeamId(42)));
    }

    #[tokio::test]
    async fn test_proposal_ids_are_monotonic() {
        let store = two_team_store();
        let draft = NewTradeProposal {
            proposing_team_id: TeamId(1),
            receiving_team_id: TeamId(2),
            offered: ids(&[4]),
            requested: ids(&[5]),
        };
        let first = store.insert_trade_proposal(draft.clone()).await.unwrap();
        let second = store.insert_trade_proposal(draft).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.status, TradeStatus::Pending);
        let all = store.load_trade_proposals().await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_conditional_status_update() {
        let store = two_team_store();
        let proposal = store
            .insert_trade_proposal(NewTradeProposal {
                proposing_team_id: TeamId(1),
                receiving_team_id: TeamId(2),
                offered: ids(&[4]),
                requested: ids(&[8]),
            })
            .await
            .unwrap();

        assert!(store
            .set_trade_status(proposal.id, TradeStatus::Pending, TradeStatus::Rejected)
            .await
            .unwrap());
        assert!(!store
            .set_trade_status(proposal.id, TradeStatus::Pending, TradeStatus::Accepted)
            .await
            .unwrap());
        assert!(!store
            .set_trade_status(ProposalId(99), TradeStatus::Pending, TradeStatus::Rejected)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_settle_trade_is_atomic() {
        let store = two_team_store();
        let proposal = store
            .insert_trade_proposal(NewTradeProposal {
                proposing_team_id: TeamId(1),
                receiving_team_id: TeamId(2),
                offered: ids(&[4]),
                requested: ids(&[5]),
            })
            .await
            .unwrap();

        let team1 = Roster::new(TeamId(1), ids(&[1, 2, 3]), ids(&[5]));
        let ghost = Roster::new(TeamId(3), vec![], ids(&[4]));

        let outcome = store.settle_trade(proposal.id, &[team1.clone(), ghost]).await.unwrap();
        assert_eq!(outcome, TradeSettlement::Rosters(RosterWrite::Missing(TeamId(3))));

        let still_pending = store.load_trade_proposal(proposal.id).await.unwrap().unwrap();
        assert!(still_pending.is_pending());
        assert_eq!(store.load_roster(TeamId(1)).await.unwrap().unwrap().bench, ids(&[4]));

        let team2 = Roster::new(TeamId(2), ids(&[6, 7]), ids(&[8, 4]));
        match store.settle_trade(proposal.id, &[team1, team2]).await.unwrap() {
            TradeSettlement::Settled { proposal, rosters } => {
                assert_eq!(proposal.status, TradeStatus::Accepted);
                assert_eq!(rosters.len(), 2);
            }
            other => panic!("Expected Settled, got {other:?}"),
        }

        let again = store.settle_trade(proposal.id, &[]).await.unwrap();
        assert_eq!(again, TradeSettlement::NotPending(TradeStatus::Accepted));
    }

    #[tokio::test]
    async fn test_write_cannot_take_another_teams_player() {
        let store = two_team_store();
        let mut team1 = store.load_roster(TeamId(1)).await.unwrap().unwrap();
        team1.bench.push(PlayerId(8));

        let outcome = store.update_rosters(&[team1]).await.unwrap();
        assert_eq!(outcome, RosterWrite::Conflict { player_id: PlayerId(8), owner: TeamId(2) });
        assert_eq!(store.load_roster(TeamId(1)).await.unwrap().unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_racing_adds_of_one_free_agent() {
        let store = two_team_store();
        let mut team1 = store.load_roster(TeamId(1)).await.unwrap().unwrap();
        let mut team2 = store.load_roster(TeamId(2)).await.unwrap().unwrap();
        team1.bench.push(PlayerId(9));
        team2.bench.push(PlayerId(9));

        assert!(matches!(store.update_rosters(&[team1]).await.unwrap(), RosterWrite::Applied(_)));
        let outcome = store.update_rosters(&[team2]).await.unwrap();
        assert_eq!(outcome, RosterWrite::Conflict { player_id: PlayerId(9), owner: TeamId(1) });
    }
}
