//! Roster store: reads and whole-roster writes against the league store

use crate::error::{LeagueError, Result};
use league_store::{LeagueStore, PlayerId, Roster, RosterWrite, TeamId};
use std::collections::HashSet;
use std::sync::Arc;

/// Both sides of a planned player exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub from: Roster,
    pub to: Roster,
}

fn first_repeat(ids: &[PlayerId]) -> Option<PlayerId> {
    let mut seen = HashSet::new();
    ids.iter().copied().find(|id| !seen.insert(*id))
}

/// Plan moving `offered` from `from` to `to` and `requested` the other way
///
/// Every offered id must be on `from`'s roster and every requested id on
/// `to`'s roster. Removed players leave starters or bench; received players
/// always land at the end of the receiving bench. The input rosters keep their
/// versions so the store can detect a stale plan.
pub fn plan_transfer(
    from: &Roster,
    to: &Roster,
    offered: &[PlayerId],
    requested: &[PlayerId],
) -> Result<TransferPlan> {
    if from.team_id == to.team_id {
        return Err(LeagueError::invalid_trade("a team cannot trade with itself"));
    }
    if let Some(id) = first_repeat(offered).or_else(|| first_repeat(requested)) {
        return Err(LeagueError::invalid_trade(format!("player {id} is listed more than once")));
    }

    for &player_id in offered {
        if !from.contains(player_id) {
            return Err(LeagueError::PlayerNotOnRoster { player_id, team_id: from.team_id });
        }
    }
    for &player_id in requested {
        if !to.contains(player_id) {
            return Err(LeagueError::PlayerNotOnRoster { player_id, team_id: to.team_id });
        }
    }

    let mut from_after = from.clone();
    let mut to_after = to.clone();

    for &player_id in offered {
        from_after.remove_player(player_id);
    }
    for &player_id in requested {
        to_after.remove_player(player_id);
    }

    from_after.bench.extend_from_slice(requested);
    to_after.bench.extend_from_slice(offered);

    Ok(TransferPlan { from: from_after, to: to_after })
}

/// Turn a rejected roster write into the matching league error
pub(crate) fn roster_write_error(write: RosterWrite) -> LeagueError {
    match write {
        RosterWrite::Missing(team_id) => LeagueError::RosterNotFound { team_id },
        RosterWrite::Stale { team_id, expected, actual } => {
            LeagueError::StaleRoster { team_id, expected, actual }
        }
        RosterWrite::Conflict { player_id, owner } => LeagueError::PlayerAlreadyOwned { player_id, owner },
        RosterWrite::Applied(_) => {
            LeagueError::Store(league_store::StoreError::internal("applied write reported as failure"))
        }
    }
}

/// Roster reads and writes
///
/// Every write is planned from a fresh store read and committed with the
/// version it was read at.
#[derive(Clone)]
pub struct RosterStore {
    store: Arc<dyn LeagueStore>,
}

impl RosterStore {
    pub fn new(store: Arc<dyn LeagueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, team_id: TeamId) -> Result<Option<Roster>> {
        Ok(self.store.load_roster(team_id).await?)
    }

    pub(crate) async fn require(&self, team_id: TeamId) -> Result<Roster> {
        self.get(team_id).await?.ok_or(LeagueError::RosterNotFound { team_id })
    }

    /// Team owning the player, if any
    pub async fn owner_of(&self, player_id: PlayerId) -> Result<Option<TeamId>> {
        let rosters = self.store.load_rosters().await?;
        Ok(rosters.into_iter().find(|r| r.contains(player_id)).map(|r| r.team_id))
    }

    /// Replace a team's starters and bench wholesale
    ///
    /// Starter count is not checked here. Ids may not repeat within the new
    /// roster and may not belong to another team.
    pub async fn replace(
        &self,
        team_id: TeamId,
        starters: Vec<PlayerId>,
        bench: Vec<PlayerId>,
    ) -> Result<Roster> {
        let current = self.require(team_id).await?;
        let updated = Roster { team_id, starters, bench, version: current.version };

        if let Some(player_id) = updated.first_duplicate() {
            return Err(LeagueError::DuplicatePlayer { player_id, team_id });
        }

        let rosters = self.store.load_rosters().await?;
        for other in rosters.iter().filter(|r| r.team_id != team_id) {
            if let Some(player_id) = updated.player_ids().find(|id| other.contains(*id)) {
                return Err(LeagueError::PlayerAlreadyOwned { player_id, owner: other.team_id });
            }
        }

        self.write_one(updated).await
    }

    /// Exchange players between two rosters in one atomic write
    pub async fn transfer_players(
        &self,
        from_team: TeamId,
        to_team: TeamId,
        offered: &[PlayerId],
        requested: &[PlayerId],
    ) -> Result<(Roster, Roster)> {
        let from = self.require(from_team).await?;
        let to = self.require(to_team).await?;
        let plan = plan_transfer(&from, &to, offered, requested)?;

        match self.store.update_rosters(&[plan.from, plan.to]).await? {
            RosterWrite::Applied(mut written) if written.len() == 2 => {
                let to_written = written.remove(1);
                let from_written = written.remove(0);
                tracing::info!(
                    "Transferred {:?} from team {} and {:?} from team {}",
                    offered,
                    from_team,
                    requested,
                    to_team
                );
                Ok((from_written, to_written))
            }
            RosterWrite::Applied(written) => Err(LeagueError::Store(
                league_store::StoreError::internal(format!(
                    "expected 2 rosters written, got {}",
                    written.len()
                )),
            )),
            rejected => Err(roster_write_error(rejected)),
        }
    }

    /// Commit a single planned roster
    pub(crate) async fn write_one(&self, roster: Roster) -> Result<Roster> {
        let team_id = roster.team_id;
        match self.store.update_rosters(std::slice::from_ref(&roster)).await? {
            RosterWrite::Applied(mut written) => written.pop().ok_or_else(|| {
                LeagueError::Store(league_store::StoreError::internal(format!(
                    "no roster returned for team {team_id}"
                )))
            }),
            rejected => Err(roster_write_error(rejected)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use league_store::{InMemoryLeagueStore, LeagueSeed};
    use proptest::prelude::*;

    fn ids(raw: &[i64]) -> Vec<PlayerId> {
        raw.iter().copied().map(PlayerId).collect()
    }

    fn store() -> Arc<dyn LeagueStore> {
        let mut seed = LeagueSeed::default().add_team(1, "A").add_team(2, "B").add_team(3, "C");
        for id in 1..=12 {
            seed = seed.add_player(id, &format!("Player {id}"), "RB", "FA", 10.0);
        }
        let seed = seed.add_roster(1, &[1, 2, 3], &[4]).add_roster(2, &[5, 6, 7], &[8]);
        Arc::new(InMemoryLeagueStore::from_seed(seed).unwrap())
    }

    #[test]
    fn test_plan_transfer_scenario() {
        let a = Roster::new(TeamId(1), ids(&[1, 2, 3]), ids(&[4]));
        let b = Roster::new(TeamId(2), ids(&[5, 6, 7]), ids(&[8]));

        let plan = plan_transfer(&a, &b, &ids(&[4]), &ids(&[5])).unwrap();
        assert_eq!(plan.from.starters, ids(&[1, 2, 3]));
        assert_eq!(plan.from.bench, ids(&[5]));
        assert_eq!(plan.to.starters, ids(&[6, 7]));
        assert_eq!(plan.to.bench, ids(&[8, 4]));
        assert_eq!(plan.from.version, a.version);
    }

    #[test]
    fn test_plan_transfer_rejects_foreign_players() {
        let a = Roster::new(TeamId(1), ids(&[1, 2, 3]), ids(&[4]));
        let b = Roster::new(TeamId(2), ids(&[5, 6, 7]), ids(&[8]));

        let err = plan_transfer(&a, &b, &ids(&[5]), &ids(&[6])).unwrap_err();
        assert!(matches!(err, LeagueError::PlayerNotOnRoster { player_id: PlayerId(5), team_id: TeamId(1) }));

        let err = plan_transfer(&a, &b, &ids(&[4, 4]), &ids(&[5, 6])).unwrap_err();
        assert!(matches!(err, LeagueError::InvalidTrade { .. }));

        assert!(plan_transfer(&a, &a, &ids(&[4]), &ids(&[1])).is_err());
    }

    #[tokio::test]
    async fn test_transfer_players_writes_both_rosters() {
        let rosters = RosterStore::new(store());
        let (a, b) = rosters
            .transfer_players(TeamId(1), TeamId(2), &ids(&[4]), &ids(&[5]))
            .await
            .unwrap();

        assert_eq!(a.bench, ids(&[5]));
        assert_eq!(b.bench, ids(&[8, 4]));
        assert_eq!(a.version, 1);
        assert_eq!(rosters.get(TeamId(2)).await.unwrap().unwrap(), b);
    }

    #[tokio::test]
    async fn test_transfer_players_missing_roster() {
        let rosters = RosterStore::new(store());
        let err = rosters
            .transfer_players(TeamId(1), TeamId(3), &ids(&[4]), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LeagueError::RosterNotFound { team_id: TeamId(3) }));
        assert_eq!(rosters.get(TeamId(1)).await.unwrap().unwrap().bench, ids(&[4]));
    }

    #[tokio::test]
    async fn test_replace_reorders_lineup() {
        let rosters = RosterStore::new(store());
        let updated = rosters.replace(TeamId(1), ids(&[4, 2, 3]), ids(&[1])).await.unwrap();
        assert_eq!(updated.starters, ids(&[4, 2, 3]));
        assert_eq!(updated.bench, ids(&[1]));
        assert_eq!(updated.version, 1);
    }

    #[tokio::test]
    async fn test_replace_rejects_duplicates_and_foreign_players() {
        let rosters = RosterStore::new(store());

        let err = rosters.replace(TeamId(1), ids(&[1, 2, 3]), ids(&[3])).await.unwrap_err();
        assert!(matches!(err, LeagueError::DuplicatePlayer { player_id: PlayerId(3), .. }));

        let err = rosters.replace(TeamId(1), ids(&[1, 2, 3]), ids(&[8])).await.unwrap_err();
        assert!(matches!(err, LeagueError::PlayerAlreadyOwned { player_id: PlayerId(8), owner: TeamId(2) }));

        let err = rosters.replace(TeamId(3), vec![], vec![]).await.unwrap_err();
        assert!(matches!(err, LeagueError::RosterNotFound { .. }));
    }

    #[tokio::test]
    async fn test_owner_of() {
        let rosters = RosterStore::new(store());
        assert_eq!(rosters.owner_of(PlayerId(6)).await.unwrap(), Some(TeamId(2)));
        assert_eq!(rosters.owner_of(PlayerId(11)).await.unwrap(), None);
    }

    fn roster_pair() -> impl Strategy<Value = (Roster, Roster, Vec<PlayerId>, Vec<PlayerId>)> {
        // Split 1..=20 between two rosters, then pick subsets to trade
        (proptest::collection::vec(any::<bool>(), 20), any::<u64>(), any::<u64>()).prop_map(
            |(sides, offer_mask, request_mask)| {
                let mut a = Vec::new();
                let mut b = Vec::new();
                for (i, side) in sides.iter().enumerate() {
                    let id = PlayerId(i as i64 + 1);
                    if *side {
                        a.push(id)
                    } else {
                        b.push(id)
                    }
                }
                let split_a = a.len() / 2;
                let split_b = b.len() / 2;
                let from = Roster::new(TeamId(1), a[..split_a].to_vec(), a[split_a..].to_vec());
                let to = Roster::new(TeamId(2), b[..split_b].to_vec(), b[split_b..].to_vec());
                let offered: Vec<PlayerId> = a
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| offer_mask & (1 << i) != 0)
                    .map(|(_, id)| *id)
                    .collect();
                let requested: Vec<PlayerId> = b
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| request_mask & (1 << i) != 0)
                    .map(|(_, id)| *id)
                    .collect();
                (from, to, offered, requested)
            },
        )
    }

    proptest! {
        #[test]
        fn prop_transfer_moves_exactly_the_traded_players((from, to, offered, requested) in roster_pair()) {
            let plan = plan_transfer(&from, &to, &offered, &requested).unwrap();

            for id in &offered {
                prop_assert!(!plan.from.contains(*id));
                prop_assert!(plan.to.bench.contains(id));
            }
            for id in &requested {
                prop_assert!(!plan.to.contains(*id));
                prop_assert!(plan.from.bench.contains(id));
            }

            // No duplicates, nobody on both rosters, nobody lost
            prop_assert_eq!(plan.from.first_duplicate(), None);
            prop_assert_eq!(plan.to.first_duplicate(), None);
            prop_assert!(plan.from.player_ids().all(|id| !plan.to.contains(id)));
            prop_assert_eq!(plan.from.len() + plan.to.len(), from.len() + to.len());
        }
    }
}
