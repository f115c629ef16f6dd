//! # League Core
//!
//! Roster management, free-agent add/drop, trade proposals and weekly scoring
//! for a small fantasy football league.
//!
//! Every mutation validates against fresh store state and commits through the
//! store's versioned roster writes, so a player is never on two rosters and a
//! trade either moves every player it names or none. [`LeagueService`] is the
//! facade front ends use; it adds sessions, per-team mutation exclusion and
//! user notifications on top of the components below.

pub mod cache;
pub mod calendar;
pub mod config;
pub mod error;
pub mod league;
pub mod matchup;
pub mod notify;
pub mod roster;
pub mod scoring;
pub mod session;
pub mod standings;
pub mod trade;
pub mod transactions;


pub use cache::LeagueCache;
pub use calendar::{Clock, FixedClock, SystemClock, WeekCalendar, WeekStatus, WeekWindow};
pub use config::{AuthConfig, LeagueConfig, NotificationConfig, RosterRules, ScoringConfig, SeasonConfig};
pub use error::{ErrorKind, LeagueError, Result};
pub use league::LeagueService;
pub use matchup::{ComparisonRow, MatchupBoard, MatchupCard, TeamLineup, TeamMatchupView};
pub use notify::{ChannelNotifier, Notification, NotificationSink, Severity, TracingNotifier};
pub use roster::{plan_transfer, RosterStore, TransferPlan};
pub use scoring::ScoringAccessor;
pub use session::{IdentityProvider, LocalIdentityProvider, Session, SessionStore, UserHandle};
pub use standings::{player_pool, standings, PlayerFilter, PoolEntry};
pub use trade::TradeLedger;
pub use transactions::AddDropTransactor;

/// Re-export the store's entity types
pub use league_store::{
    LeagueStore, Player, PlayerId, ProposalId, Roster, ScheduledMatchup, Team, TeamId,
    TradeProposal, TradeStatus,
};

/// Current version of the league core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
