//! # League Store
//!
//! Entity model and persistence infrastructure for the fantasy league manager.
//!
//! ## Architecture
//!
//! - **LeagueStore**: Abstract trait for league storage backends
//! - **InMemoryLeagueStore**: Process-local backend (tests, demos, single-user runs)
//! - **PgLeagueStore**: PostgreSQL backend built on sqlx
//! - **rows**: The schema adapter between external snake_case rows and entities
//! - **seed**: The default demo league
//!
//! Roster writes are compare-and-swap on the roster `version` and
//! all-or-nothing across rosters. A write that would leave a player on two
//! rosters is refused.
//!
//! ## Usage
//!
//! ```rust
//! use league_store::{InMemoryLeagueStore, LeagueSeed, LeagueStore, TeamId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryLeagueStore::from_seed(LeagueSeed::default_league())?;
//!     let roster = store.load_roster(TeamId(1)).await?;
//!     assert!(roster.is_some());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod rows;
pub mod seed;
pub mod types;

pub use backend::{LeagueStore, NewTradeProposal, RosterWrite, TradeSettlement};
pub use config::{DatabaseConfig, StoreBackend, StoreConfig};
pub use error::{Result, StoreError};
pub use memory::InMemoryLeagueStore;
pub use postgres::PgLeagueStore;
pub use seed::LeagueSeed;
pub use types::{
    Player, PlayerId, ProposalId, Roster, ScheduledMatchup, Team, TeamId, TradeProposal,
    TradeStatus,
};

use std::sync::Arc;

/// Open the backend selected by `config`
///
/// The in-memory backend is seeded from `config.seed_path` when set, otherwise
/// from the default league. The PostgreSQL backend runs its migrations and is
/// seeded only when its tables are empty.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn LeagueStore>> {
    config.validate()?;
    let seed = match &config.seed_path {
        Some(path) => LeagueSeed::from_file(path)?,
        None => LeagueSeed::default_league(),
    };

    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Opening in-memory league store");
            Ok(Arc::new(InMemoryLeagueStore::from_seed(seed)?))
        }
        StoreBackend::Postgres => {
            tracing::info!("Opening PostgreSQL league store");
            let store = PgLeagueStore::connect(&config.database).await?;
            store.seed_if_empty(&seed).await?;
            Ok(Arc::new(store))
        }
    }
}
