//! Read-only snapshot of league state for display

use crate::error::Result;
use chrono::{DateTime, Utc};
use league_store::{
    LeagueStore, Player, PlayerId, Roster, ScheduledMatchup, Team, TeamId, TradeProposal,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Snapshot {
    players: HashMap<PlayerId, Player>,
    player_order: Vec<PlayerId>,
    teams: Vec<Team>,
    rosters: HashMap<TeamId, Roster>,
    owners: HashMap<PlayerId, TeamId>,
    schedule: Vec<ScheduledMatchup>,
    proposals: Vec<TradeProposal>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// League cache
///
/// Mutations never read from here; they go to the store and then ask the
/// cache to refresh.
#[derive(Debug, Default)]
pub struct LeagueCache {
    snapshot: Arc<RwLock<Snapshot>>,
}

impl LeagueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read every entity from the store and swap the snapshot in one step
    pub async fn refresh(&self, store: &dyn LeagueStore) -> Result<()> {
        let (players, teams, rosters, schedule, proposals) = futures::try_join!(
            store.load_players(),
            store.load_teams(),
            store.load_rosters(),
            store.load_schedule(),
            store.load_trade_proposals(),
        )?;

        let player_order = players.iter().map(|p| p.id).collect();
        let owners = rosters
            .iter()
            .flat_map(|r| r.player_ids().map(move |id| (id, r.team_id)))
            .collect();

        let snapshot = Snapshot {
            players: players.into_iter().map(|p| (p.id, p)).collect(),
            player_order,
            teams,
            rosters: rosters.into_iter().map(|r| (r.team_id, r)).collect(),
            owners,
            schedule,
            proposals,
            refreshed_at: Some(Utc::now()),
        };

        tracing::debug!(
            "League cache refreshed: {} players, {} teams, {} proposals",
            snapshot.players.len(),
            snapshot.teams.len(),
            snapshot.proposals.len()
        );
        *self.snapshot.write() = snapshot;
        Ok(())
    }

    pub fn player(&self, id: PlayerId) -> Option<Player> {
        self.snapshot.read().players.get(&id).cloned()
    }

    /// All players in store order
    pub fn players(&self) -> Vec<Player> {
        let snapshot = self.snapshot.read();
        snapshot.player_order.iter().filter_map(|id| snapshot.players.get(id).cloned()).collect()
    }

    pub fn team(&self, id: TeamId) -> Option<Team> {
        self.snapshot.read().teams.iter().find(|t| t.id == id).cloned()
    }

    pub fn team_by_name(&self, name: &str) -> Option<Team> {
        self.snapshot.read().teams.iter().find(|t| t.name.eq_ignore_ascii_case(name)).cloned()
    }

    pub fn teams(&self) -> Vec<Team> {
        self.snapshot.read().teams.clone()
    }

    pub fn roster(&self, team_id: TeamId) -> Option<Roster> {
        self.snapshot.read().rosters.get(&team_id).cloned()
    }

    /// Rosters ordered by team id
    pub fn rosters(&self) -> Vec<Roster> {
        let mut rosters: Vec<Roster> = self.snapshot.read().rosters.values().cloned().collect();
        rosters.sort_by_key(|r| r.team_id);
        rosters
    }

    pub fn owner_of(&self, player_id: PlayerId) -> Option<TeamId> {
        self.snapshot.read().owners.get(&player_id).copied()
    }

    pub fn schedule(&self) -> Vec<ScheduledMatchup> {
        self.snapshot.read().schedule.clone()
    }

    pub fn matchups_for_week(&self, week: u32) -> Vec<ScheduledMatchup> {
        self.snapshot.read().schedule.iter().filter(|m| m.week == week).copied().collect()
    }

    pub fn proposals(&self) -> Vec<TradeProposal> {
        self.snapshot.read().proposals.clone()
    }

    /// None until the first successful refresh
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().refreshed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use league_store::{InMemoryLeagueStore, LeagueSeed, NewTradeProposal};

    #[tokio::test]
    async fn test_refresh_loads_snapshot() {
        let store = InMemoryLeagueStore::from_seed(LeagueSeed::default_league()).unwrap();
        let cache = LeagueCache::new();
        assert!(cache.refreshed_at().is_none());
        assert!(cache.players().is_empty());

        cache.refresh(&store).await.unwrap();
        assert!(cache.refreshed_at().is_some());
        assert_eq!(cache.players().len(), 19);
        assert_eq!(cache.players()[0].id, PlayerId(101));
        assert_eq!(cache.teams().len(), 4);
        assert_eq!(cache.owner_of(PlayerId(302)), Some(TeamId(2)));
        assert_eq!(cache.owner_of(PlayerId(105)), None);
        assert_eq!(cache.matchups_for_week(1).len(), 2);
        assert_eq!(cache.team_by_name("gabriel").map(|t| t.id), Some(TeamId(2)));
        assert_eq!(cache.rosters().iter().map(|r| r.team_id.0).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_cache_is_stale_until_refreshed() {
        let store = InMemoryLeagueStore::from_seed(LeagueSeed::default_league()).unwrap();
        let cache = LeagueCache::new();
        cache.refresh(&store).await.unwrap();

        store
            .insert_trade_proposal(NewTradeProposal {
                proposing_team_id: TeamId(1),
                receiving_team_id: TeamId(2),
                offered: vec![PlayerId(401)],
                requested: vec![PlayerId(402)],
            })
            .await
            .unwrap();
        assert!(cache.proposals().is_empty());

        cache.refresh(&store).await.unwrap();
        assert_eq!(cache.proposals().len(), 1);
    }
}
