//! Fantasy week calendar
//!
//! Maps wall-clock time to a fantasy week and a per-week status. Both are pure
//! functions of the configured windows and the injected [`Clock`].

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Source of "now"
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: RwLock::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.write() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Time window of one fantasy week; both bounds are inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    pub week: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekWindow {
    /// `count` back-to-back 7-day weeks; each ends one second before the next starts
    pub fn consecutive(season_start: DateTime<Utc>, count: u32) -> Vec<WeekWindow> {
        (0..count)
            .map(|i| {
                let start = season_start + Duration::weeks(i as i64);
                WeekWindow {
                    week: i + 1,
                    start,
                    end: start + Duration::weeks(1) - Duration::seconds(1),
                }
            })
            .collect()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStatus {
    Past,
    Current,
    Future,
}

impl std::fmt::Display for WeekStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WeekStatus::Past => "past",
            WeekStatus::Current => "current",
            WeekStatus::Future => "future",
        };
        f.write_str(label)
    }
}

pub struct WeekCalendar {
    weeks: Vec<WeekWindow>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for WeekCalendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeekCalendar").field("weeks", &self.weeks).finish()
    }
}

impl WeekCalendar {
    pub fn new(mut weeks: Vec<WeekWindow>, clock: Arc<dyn Clock>) -> Self {
        weeks.sort_by_key(|w| w.start);
        Self { weeks, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn weeks(&self) -> &[WeekWindow] {
        &self.weeks
    }

    pub fn window(&self, week: u32) -> Option<&WeekWindow> {
        self.weeks.iter().find(|w| w.week == week)
    }

    /// The week containing now, else the next future week, else the last
    /// defined week, else week 1
    pub fn current_week(&self) -> u32 {
        let now = self.now();

        if let Some(window) = self.weeks.iter().find(|w| w.contains(now)) {
            return window.week;
        }
        if let Some(window) = self.weeks.iter().find(|w| w.start > now) {
            return window.week;
        }
        self.weeks.last().map(|w| w.week).unwrap_or(1)
    }

    /// Undefined weeks are `Future`
    pub fn week_status(&self, week: u32) -> WeekStatus {
        let Some(window) = self.window(week) else {
            return WeekStatus::Future;
        };

        let now = self.now();
        if now > window.end {
            WeekStatus::Past
        } else if window.contains(now) {
            WeekStatus::Current
        } else {
            WeekStatus::Future
        }
    }
}
