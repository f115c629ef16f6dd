//! Free-agent add/drop transactions

use crate::error::{LeagueError, Result};
use crate::roster::RosterStore;
use league_store::{LeagueStore, PlayerId, Roster, TeamId};
use std::sync::Arc;

/// Swaps a rostered player for a free agent
#[derive(Clone)]
pub struct AddDropTransactor {
    store: Arc<dyn LeagueStore>,
    rosters: RosterStore,
}

impl AddDropTransactor {
    pub fn new(store: Arc<dyn LeagueStore>) -> Self {
        let rosters = RosterStore::new(store.clone());
        Self { store, rosters }
    }

    /// Add a free agent to the bench and release `drop_id`
    ///
    /// Ownership is checked against a fresh read of every roster, and the
    /// write only lands if the team's roster has not changed since.
    pub async fn add_drop(
        &self,
        team_id: TeamId,
        add_id: PlayerId,
        drop_id: PlayerId,
    ) -> Result<Roster> {
        let players = self.store.load_players().await?;
        if !players.iter().any(|p| p.id == add_id) {
            return Err(LeagueError::PlayerNotFound { player_id: add_id });
        }

        let rosters = self.store.load_rosters().await?;
        if let Some(owner) = rosters.iter().find(|r| r.contains(add_id)) {
            tracing::warn!("Team {} tried to add player {} owned by team {}", team_id, add_id, owner.team_id);
            return Err(LeagueError::PlayerAlreadyOwned { player_id: add_id, owner: owner.team_id });
        }

        let mut roster = rosters
            .into_iter()
            .find(|r| r.team_id == team_id)
            .ok_or(LeagueError::RosterNotFound { team_id })?;

        if !roster.remove_player(drop_id) {
            return Err(LeagueError::PlayerNotOnRoster { player_id: drop_id, team_id });
        }
        roster.bench.push(add_id);

        let written = self.rosters.write_one(roster).await?;
        tracing::info!("Team {} added player {} and dropped player {}", team_id, add_id, drop_id);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use league_store::{InMemoryLeagueStore, LeagueSeed};

    fn ids(raw: &[i64]) -> Vec<PlayerId> {
        raw.iter().copied().map(PlayerId).collect()
    }

    fn transactor() -> (AddDropTransactor, Arc<dyn LeagueStore>) {
        let mut seed = LeagueSeed::default().add_team(1, "A").add_team(2, "B");
        for id in 1..=10 {
            seed = seed.add_player(id, &format!("Player {id}"), "WR", "FA", 8.0);
        }
        let seed = seed.add_roster(1, &[1, 2, 3], &[4]).add_roster(2, &[5, 6, 7], &[8]);
        let store: Arc<dyn LeagueStore> = Arc::new(InMemoryLeagueStore::from_seed(seed).unwrap());
        (AddDropTransactor::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_add_drop_moves_free_agent_to_bench() {
        let (transactor, store) = transactor();

        let roster = transactor.add_drop(TeamId(1), PlayerId(9), PlayerId(4)).await.unwrap();
        assert_eq!(roster.starters, ids(&[1, 2, 3]));
        assert_eq!(roster.bench, ids(&[9]));

        let stored = store.load_roster(TeamId(1)).await.unwrap().unwrap();
        assert_eq!(stored, roster);
    }

    #[tokio::test]
    async fn test_add_drop_can_release_a_starter() {
        let (transactor, _) = transactor();
        let roster = transactor.add_drop(TeamId(1), PlayerId(10), PlayerId(2)).await.unwrap();
        assert_eq!(roster.starters, ids(&[1, 3]));
        assert_eq!(roster.bench, ids(&[4, 10]));
    }

    #[tokio::test]
    async fn test_add_owned_player_fails() {
        let (transactor, store) = transactor();

        let err = transactor.add_drop(TeamId(1), PlayerId(8), PlayerId(4)).await.unwrap_err();
        assert!(matches!(err, LeagueError::PlayerAlreadyOwned { player_id: PlayerId(8), owner: TeamId(2) }));

        // Re-adding a player the team itself just picked up fails too
        transactor.add_drop(TeamId(1), PlayerId(9), PlayerId(4)).await.unwrap();
        let err = transactor.add_drop(TeamId(1), PlayerId(9), PlayerId(3)).await.unwrap_err();
        assert!(matches!(err, LeagueError::PlayerAlreadyOwned { owner: TeamId(1), .. }));

        assert_eq!(store.load_roster(TeamId(1)).await.unwrap().unwrap().bench, ids(&[9]));
    }

    #[tokio::test]
    async fn test_drop_must_be_rostered() {
        let (transactor, store) = transactor();
        let err = transactor.add_drop(TeamId(1), PlayerId(9), PlayerId(5)).await.unwrap_err();
        assert!(matches!(err, LeagueError::PlayerNotOnRoster { player_id: PlayerId(5), team_id: TeamId(1) }));
        assert_eq!(store.load_roster(TeamId(1)).await.unwrap().unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_unknown_player_and_team() {
        let (transactor, _) = transactor();

        let err = transactor.add_drop(TeamId(1), PlayerId(99), PlayerId(4)).await.unwrap_err();
        assert!(matches!(err, LeagueError::PlayerNotFound { .. }));

        let err = transactor.add_drop(TeamId(7), PlayerId(9), PlayerId(4)).await.unwrap_err();
        assert!(matches!(err, LeagueError::RosterNotFound { team_id: TeamId(7) }));
    }
}
