//! Weekly matchup board

use crate::cache::LeagueCache;
use crate::calendar::WeekStatus;
use crate::scoring::ScoringAccessor;
use league_store::{Player, ScheduledMatchup, Team, TeamId};
use serde::Serialize;
use std::sync::Arc;

/// One side of a matchup
#[derive(Debug, Clone, Serialize)]
pub struct TeamLineup {
    pub team: Team,
    pub starters: Vec<Player>,

    /// Sum of the starters' season projections
    pub projected_total: f64,

    /// Sum of the starters' actual scores for the week (0 for future weeks)
    pub actual_total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchupCard {
    pub matchup: ScheduledMatchup,
    pub home: TeamLineup,
    pub away: TeamLineup,
}

/// Slot-by-slot starter comparison between a team and its opponent
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub mine: Option<Player>,
    pub theirs: Option<Player>,
    pub my_score: f64,
    pub their_score: f64,
}

/// A team's view of a week
#[derive(Debug, Clone, Serialize)]
pub struct TeamMatchupView {
    pub week: u32,
    pub status: WeekStatus,
    pub mine: TeamLineup,

    /// None on a bye week
    pub opponent: Option<TeamLineup>,
    pub comparison: Vec<ComparisonRow>,
    pub other_matchups: Vec<MatchupCard>,
}

/// Builds matchup views from the league cache
#[derive(Debug, Clone)]
pub struct MatchupBoard {
    cache: Arc<LeagueCache>,
    scoring: ScoringAccessor,
}

impl MatchupBoard {
    pub fn new(cache: Arc<LeagueCache>, scoring: ScoringAccessor) -> Self {
        Self { cache, scoring }
    }

    /// Team with its starters and totals; a team without a roster has no starters
    pub fn lineup(&self, team_id: TeamId, week: u32) -> Option<TeamLineup> {
        let team = self.cache.team(team_id)?;
        let starters: Vec<Player> = self
            .cache
            .roster(team_id)
            .map(|r| r.starters.iter().filter_map(|id| self.cache.player(*id)).collect())
            .unwrap_or_default();

        let projected_total = starters.iter().map(|p| p.projected_points).sum();
        let actual_total = starters.iter().map(|p| self.scoring.actual_score(p.id, week)).sum();

        Some(TeamLineup { team, starters, projected_total, actual_total })
    }

    /// Every matchup of the week; matchups naming an unknown team are skipped
    pub fn week(&self, week: u32) -> Vec<MatchupCard> {
        self.cache
            .matchups_for_week(week)
            .into_iter()
            .filter_map(|matchup| self.card(matchup))
            .collect()
    }

    fn card(&self, matchup: ScheduledMatchup) -> Option<MatchupCard> {
        let home = self.lineup(matchup.team1_id, matchup.week)?;
        let away = self.lineup(matchup.team2_id, matchup.week)?;
        Some(MatchupCard { matchup, home, away })
    }

    pub fn for_team(&self, team_id: TeamId, week: u32) -> Option<TeamMatchupView> {
        let mine = self.lineup(team_id, week)?;
        let matchups = self.cache.matchups_for_week(week);
        let own = matchups.iter().find(|m| m.involves(team_id)).copied();

        let opponent = own
            .and_then(|m| m.opponent_of(team_id))
            .and_then(|opponent| self.lineup(opponent, week));

        let comparison = self.compare(&mine, opponent.as_ref(), week);
        let other_matchups = matchups
            .into_iter()
            .filter(|m| Some(*m) != own)
            .filter_map(|m| self.card(m))
            .collect();

        Some(TeamMatchupView {
            week,
            status: self.scoring.week_status(week),
            mine,
            opponent,
            comparison,
            other_matchups,
        })
    }

    fn compare(&self, mine: &TeamLineup, theirs: Option<&TeamLineup>, week: u32) -> Vec<ComparisonRow> {
        let their_starters = theirs.map(|t| t.starters.as_slice()).unwrap_or_default();
        let rows = mine.starters.len().max(their_starters.len());

        (0..rows)
            .map(|slot| {
                let mine = mine.starters.get(slot).cloned();
                let theirs = their_starters.get(slot).cloned();
                ComparisonRow {
                    my_score: mine.as_ref().map_or(0.0, |p| self.scoring.actual_score(p.id, week)),
                    their_score: theirs.as_ref().map_or(0.0, |p| self.scoring.actual_score(p.id, week)),
                    mine,
                    theirs,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{FixedClock, WeekCalendar, WeekWindow};
    use chrono::{TimeZone, Utc};
    use league_store::{InMemoryLeagueStore, LeagueSeed, PlayerId};

    async fn board() -> MatchupBoard {
        let start = Utc.with_ymd_and_hms(2030, 9, 4, 0, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start + chrono::Duration::days(3)));
        let calendar = Arc::new(WeekCalendar::new(WeekWindow::consecutive(start, 3), clock));

        let seed = LeagueSeed::default()
            .add_player(1, "A1", "QB", "KC", 20.0)
            .with_scores(1, &[18.0])
            .add_player(2, "A2", "RB", "KC", 10.0)
            .with_scores(2, &[7.5])
            .add_player(3, "B1", "QB", "BUF", 22.0)
            .with_scores(3, &[30.0])
            .add_player(4, "C1", "WR", "MIA", 12.0)
            .add_player(5, "D1", "TE", "SF", 9.0)
            .add_team(1, "Alpha")
            .add_team(2, "Bravo")
            .add_team(3, "Charlie")
            .add_team(4, "Delta")
            .add_roster(1, &[1, 2], &[])
            .add_roster(2, &[3], &[])
            .add_roster(3, &[4], &[])
            .add_roster(4, &[5], &[])
            .add_matchup(1, 1, 2)
            .add_matchup(1, 3, 4)
            .add_matchup(2, 1, 3);
        let store = InMemoryLeagueStore::from_seed(seed).unwrap();
        let cache = Arc::new(LeagueCache::new());
        cache.refresh(&store).await.unwrap();

        let scoring = ScoringAccessor::new(calendar, cache.clone(), 3.0);
        MatchupBoard::new(cache, scoring)
    }

    #[tokio::test]
    async fn test_week_totals() {
        let board = board().await;
        let cards = board.week(1);
        assert_eq!(cards.len(), 2);

        let first = &cards[0];
        assert_eq!(first.home.team.name, "Alpha");
        assert_eq!(first.home.projected_total, 30.0);
        assert_eq!(first.home.actual_total, 25.5);
        assert_eq!(first.away.actual_total, 30.0);
    }

    #[tokio::test]
    async fn test_future_week_has_zero_actuals() {
        let board = board().await;
        let cards = board.week(2);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].home.actual_total, 0.0);
        assert_eq!(cards[0].home.projected_total, 30.0);
    }

    #[tokio::test]
    async fn test_team_view() {
        let board = board().await;
        let view = board.for_team(TeamId(2), 1).unwrap();

        assert_eq!(view.status, WeekStatus::Current);
        assert_eq!(view.opponent.as_ref().map(|o| o.team.id), Some(TeamId(1)));
        assert_eq!(view.comparison.len(), 2);
        assert_eq!(view.comparison[0].my_score, 30.0);
        assert_eq!(view.comparison[0].their_score, 18.0);
        assert!(view.comparison[1].mine.is_none());
        assert_eq!(view.comparison[1].theirs.as_ref().map(|p| p.id), Some(PlayerId(2)));
        assert_eq!(view.other_matchups.len(), 1);
        assert_eq!(view.other_matchups[0].home.team.id, TeamId(3));
    }

    #[tokio::test]
    async fn test_bye_week_and_unknown_team() {
        let board = board().await;
        let view = board.for_team(TeamId(2), 2).unwrap();
        assert!(view.opponent.is_none());
        assert_eq!(view.comparison.len(), 1);
        assert_eq!(view.other_matchups.len(), 1);

        assert!(board.for_team(TeamId(9), 1).is_none());
    }
}
