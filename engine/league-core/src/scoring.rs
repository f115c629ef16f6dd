//! Actual and projected fantasy points

use crate::cache::LeagueCache;
use crate::calendar::{WeekCalendar, WeekStatus};
use league_store::PlayerId;
use rand::Rng;
use std::sync::Arc;

/// Reads player scores from the league cache, gated by the week calendar
#[derive(Debug, Clone)]
pub struct ScoringAccessor {
    calendar: Arc<WeekCalendar>,
    cache: Arc<LeagueCache>,
    jitter: f64,
}

impl ScoringAccessor {
    pub fn new(calendar: Arc<WeekCalendar>, cache: Arc<LeagueCache>, jitter: f64) -> Self {
        Self { calendar, cache, jitter: jitter.max(0.0) }
    }

    pub fn week_status(&self, week: u32) -> WeekStatus {
        self.calendar.week_status(week)
    }

    /// Recorded score for the week; 0 before the week starts or when nothing
    /// was recorded
    pub fn actual_score(&self, player_id: PlayerId, week: u32) -> f64 {
        if self.week_status(week) == WeekStatus::Future {
            return 0.0;
        }
        self.cache
            .player(player_id)
            .and_then(|p| p.weekly_score(week))
            .unwrap_or(0.0)
    }

    pub fn projected_score(&self, player_id: PlayerId, week: u32) -> f64 {
        self.projected_score_with(player_id, week, &mut rand::thread_rng())
    }

    /// Projection from the previous week's score, else this week's, else the
    /// season projection; perturbed by up to the configured jitter and never
    /// negative
    pub fn projected_score_with<R: Rng + ?Sized>(&self, player_id: PlayerId, week: u32, rng: &mut R) -> f64 {
        let Some(player) = self.cache.player(player_id) else {
            return 0.0;
        };

        let baseline = week
            .checked_sub(1)
            .and_then(|previous| player.weekly_score(previous))
            .or_else(|| player.weekly_score(week))
            .unwrap_or(player.projected_points);

        let noise = if self.jitter > 0.0 { rng.gen_range(-self.jitter..=self.jitter) } else { 0.0 };
        (baseline + noise).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{FixedClock, WeekWindow};
    use chrono::{TimeZone, Utc};
    use league_store::{InMemoryLeagueStore, LeagueSeed};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    async fn accessor(jitter: f64) -> (ScoringAccessor, Arc<FixedClock>) {
        let start = Utc.with_ymd_and_hms(2030, 9, 4, 0, 0, 0).unwrap();
        // Inside week 2
        let clock = Arc::new(FixedClock::new(start + chrono::Duration::days(8)));
        let calendar = Arc::new(WeekCalendar::new(WeekWindow::consecutive(start, 4), clock.clone()));

        let seed = LeagueSeed::default()
            .add_player(1, "Scorer", "RB", "SF", 15.0)
            .with_scores(1, &[10.0, 20.0, 30.0])
            .add_player(2, "Rookie", "WR", "DET", 1.0);
        let store = InMemoryLeagueStore::from_seed(seed).unwrap();
        let cache = Arc::new(LeagueCache::new());
        cache.refresh(&store).await.unwrap();

        (ScoringAccessor::new(calendar, cache, jitter), clock)
    }

    #[tokio::test]
    async fn test_actual_score_is_gated_by_week_status() {
        let (scoring, clock) = accessor(3.0).await;

        assert_eq!(scoring.actual_score(PlayerId(1), 1), 10.0);
        assert_eq!(scoring.actual_score(PlayerId(1), 2), 20.0);
        assert_eq!(scoring.actual_score(PlayerId(1), 3), 0.0);
        assert_eq!(scoring.actual_score(PlayerId(1), 9), 0.0);

        clock.advance(chrono::Duration::weeks(1));
        assert_eq!(scoring.actual_score(PlayerId(1), 3), 30.0);
        assert_eq!(scoring.actual_score(PlayerId(1), 4), 0.0);
    }

    #[tokio::test]
    async fn test_missing_scores_are_zero() {
        let (scoring, _) = accessor(3.0).await;
        assert_eq!(scoring.actual_score(PlayerId(2), 1), 0.0);
        assert_eq!(scoring.actual_score(PlayerId(404), 1), 0.0);
        assert_eq!(scoring.projected_score(PlayerId(404), 1), 0.0);
    }

    #[tokio::test]
    async fn test_projection_baseline_without_jitter() {
        let (scoring, _) = accessor(0.0).await;
        let mut rng = StdRng::seed_from_u64(7);

        // Previous week's score
        assert_eq!(scoring.projected_score_with(PlayerId(1), 3, &mut rng), 20.0);
        // Week 1 has no previous week, so its own score is used
        assert_eq!(scoring.projected_score_with(PlayerId(1), 1, &mut rng), 10.0);
        // Beyond recorded scores, fall back to the season projection
        assert_eq!(scoring.projected_score_with(PlayerId(1), 6, &mut rng), 15.0);
        assert_eq!(scoring.projected_score_with(PlayerId(2), 2, &mut rng), 1.0);
    }

    #[tokio::test]
    async fn test_projection_jitter_bounds_and_floor() {
        let (scoring, _) = accessor(3.0).await;
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let projected = scoring.projected_score_with(PlayerId(1), 3, &mut rng);
            assert!((17.0..=23.0).contains(&projected), "{projected} out of range");

            let low = scoring.projected_score_with(PlayerId(2), 2, &mut rng);
            assert!((0.0..=4.0).contains(&low), "{low} out of range");
        }
    }
}
