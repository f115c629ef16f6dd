//! League service: the entry point used by front ends
//!
//! Wires the store, cache, calendar and the roster, transaction, trade and
//! scoring components together, and puts session checks, per-team mutation
//! exclusion and user notifications around every write.

use crate::cache::LeagueCache;
use crate::calendar::{Clock, WeekCalendar, WeekStatus, WeekWindow};
use crate::config::LeagueConfig;
use crate::error::{LeagueError, Result};
use crate::matchup::{MatchupBoard, MatchupCard, TeamMatchupView};
use crate::notify::{NotificationSink, Severity};
use crate::roster::RosterStore;
use crate::scoring::ScoringAccessor;
use crate::session::{IdentityProvider, LocalIdentityProvider, Session, SessionStore, UserHandle};
use crate::standings::{player_pool, standings, PlayerFilter, PoolEntry};
use crate::trade::TradeLedger;
use crate::transactions::AddDropTransactor;
use dashmap::DashSet;
use league_store::{LeagueStore, PlayerId, ProposalId, Roster, Team, TeamId, TradeProposal};
use std::sync::Arc;
use std::time::Duration;

/// Marks a team busy until dropped
struct BusyGuard<'a> {
    busy: &'a DashSet<TeamId>,
    team_id: TeamId,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.remove(&self.team_id);
    }
}

pub struct LeagueService {
    config: LeagueConfig,
    store: Arc<dyn LeagueStore>,
    cache: Arc<LeagueCache>,
    calendar: Arc<WeekCalendar>,
    rosters: RosterStore,
    transactor: AddDropTransactor,
    trades: TradeLedger,
    scoring: ScoringAccessor,
    matchups: MatchupBoard,
    identity: Arc<dyn IdentityProvider>,
    sessions: Arc<SessionStore>,
    notifier: Arc<dyn NotificationSink>,
    busy: DashSet<TeamId>,
}

impl LeagueService {
    /// Build the service and load the first cache snapshot
    pub async fn open(
        config: LeagueConfig,
        store: Arc<dyn LeagueStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(LeagueCache::new());
        cache.refresh(store.as_ref()).await?;

        let calendar = Arc::new(WeekCalendar::new(config.week_windows(), clock));
        let scoring =
            ScoringAccessor::new(calendar.clone(), cache.clone(), config.scoring.projection_jitter);
        let sessions = Arc::new(SessionStore::new());
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(LocalIdentityProvider::new(store.clone(), &config.auth, sessions.clone()));

        tracing::info!(
            "League '{}' opened: {} weeks, current week {}",
            config.league_name,
            calendar.weeks().len(),
            calendar.current_week()
        );

        Ok(Self {
            rosters: RosterStore::new(store.clone()),
            transactor: AddDropTransactor::new(store.clone()),
            trades: TradeLedger::new(store.clone(), &config.roster),
            matchups: MatchupBoard::new(cache.clone(), scoring.clone()),
            scoring,
            config,
            store,
            cache,
            calendar,
            identity,
            sessions,
            notifier,
            busy: DashSet::new(),
        })
    }

    /// Swap the identity provider along with the session table it writes to
    pub fn with_identity_provider(
        mut self,
        identity: Arc<dyn IdentityProvider>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        self.identity = identity;
        self.sessions = sessions;
        self
    }

    pub fn config(&self) -> &LeagueConfig {
        &self.config
    }

    pub fn cache(&self) -> &LeagueCache {
        &self.cache
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn refresh(&self) -> Result<()> {
        self.cache.refresh(self.store.as_ref()).await
    }

    // --- Sessions ---

    pub async fn login(&self, team_name: &str, password: &str) -> Result<Session> {
        self.identity.login(team_name, password).await
    }

    pub async fn logout(&self, handle: UserHandle) -> Result<()> {
        self.identity.logout(handle).await
    }

    pub async fn session(&self, handle: UserHandle) -> Result<Session> {
        self.identity.current_session(handle).await?.ok_or(LeagueError::NotAuthenticated)
    }

    async fn authorize(&self, handle: UserHandle, team_id: TeamId, action: &'static str) -> Result<Session> {
        let session = self.session(handle).await?;
        if session.team_id != team_id {
            tracing::warn!("Team {} tried to {} for team {}", session.team_id, action, team_id);
            return Err(LeagueError::Forbidden { team_id: session.team_id, action });
        }
        Ok(session)
    }

    fn claim(&self, team_id: TeamId) -> Result<BusyGuard<'_>> {
        if !self.busy.insert(team_id) {
            return Err(LeagueError::Busy { team_id });
        }
        Ok(BusyGuard { busy: &self.busy, team_id })
    }

    fn notify_error(&self, message: &str) {
        let duration = Duration::from_millis(self.config.notifications.error_duration_ms);
        self.notifier.notify(message, Severity::Error, duration);
    }

    /// Report the outcome and refresh the cache after a successful write
    async fn finish<T>(&self, result: Result<T>, done: &str, failed: &str) -> Result<T> {
        match result {
            Ok(value) => {
                match self.refresh().await {
                    Ok(()) => {
                        let duration = Duration::from_millis(self.config.notifications.success_duration_ms);
                        self.notifier.notify(done, Severity::Success, duration);
                    }
                    Err(e) => {
                        tracing::error!("Cache refresh after '{}' failed: {}", done, e);
                        self.notify_error("Saved, but failed to refresh data. Please reload.");
                    }
                }
                Ok(value)
            }
            Err(e) => {
                self.notify_error(&format!("{failed}: {e}"));
                Err(e)
            }
        }
    }

    // --- Mutations ---

    /// Replace the team's lineup; the starter count must match the league's slots
    pub async fn save_roster(
        &self,
        handle: UserHandle,
        team_id: TeamId,
        starters: Vec<PlayerId>,
        bench: Vec<PlayerId>,
    ) -> Result<Roster> {
        let result: Result<Roster> = async {
            self.authorize(handle, team_id, "edit this roster").await?;
            let _guard = self.claim(team_id)?;

            let expected = self.config.roster.starter_slots;
            if starters.len() != expected {
                return Err(LeagueError::InvalidLineup { expected, actual: starters.len() });
            }
            self.rosters.replace(team_id, starters, bench).await
        }
        .await;

        self.finish(result, "Roster saved!", "Failed to save roster").await
    }

    pub async fn add_drop(
        &self,
        handle: UserHandle,
        team_id: TeamId,
        add_id: PlayerId,
        drop_id: PlayerId,
    ) -> Result<Roster> {
        let result: Result<Roster> = async {
            self.authorize(handle, team_id, "add or drop players").await?;
            let _guard = self.claim(team_id)?;
            self.transactor.add_drop(team_id, add_id, drop_id).await
        }
        .await;

        self.finish(result, "Transaction complete!", "Transaction failed").await
    }

    pub async fn propose_trade(
        &self,
        handle: UserHandle,
        proposer: TeamId,
        receiver: TeamId,
        offered: Vec<PlayerId>,
        requested: Vec<PlayerId>,
    ) -> Result<TradeProposal> {
        let result: Result<TradeProposal> = async {
            self.authorize(handle, proposer, "propose trades").await?;
            let _guard = self.claim(proposer)?;
            self.trades.propose(proposer, receiver, offered, requested).await
        }
        .await;

        self.finish(result, "Trade proposal sent!", "Failed to send trade proposal").await
    }

    /// Only the receiving team may accept; both teams are held busy while it settles
    pub async fn accept_trade(&self, handle: UserHandle, id: ProposalId) -> Result<TradeProposal> {
        let result: Result<TradeProposal> = async {
            let proposal = self.trades.get(id).await?;
            self.authorize(handle, proposal.receiving_team_id, "accept this trade").await?;
            let _receiver = self.claim(proposal.receiving_team_id)?;
            let _proposer = self.claim(proposal.proposing_team_id)?;
            self.trades.accept(id).await
        }
        .await;

        self.finish(result, "Trade accepted!", "Failed to accept trade").await
    }

    /// Only the receiving team may reject; false if the proposal was already settled
    pub async fn reject_trade(&self, handle: UserHandle, id: ProposalId) -> Result<bool> {
        let result: Result<bool> = async {
            let proposal = self.trades.get(id).await?;
            self.authorize(handle, proposal.receiving_team_id, "reject this trade").await?;
            let _guard = self.claim(proposal.receiving_team_id)?;
            self.trades.reject(id).await
        }
        .await;

        match result {
            Ok(false) => {
                tracing::warn!("Trade {} was already settled; nothing rejected", id);
                self.notify_error("Trade was already settled.");
                Ok(false)
            }
            other => self.finish(other, "Trade rejected.", "Failed to reject trade").await,
        }
    }

    // --- Reads ---

    pub async fn pending_trades(&self, handle: UserHandle) -> Result<Vec<TradeProposal>> {
        let session = self.session(handle).await?;
        self.trades.list_pending_for(session.team_id).await
    }

    pub async fn outgoing_trades(&self, handle: UserHandle) -> Result<Vec<TradeProposal>> {
        let session = self.session(handle).await?;
        self.trades.list_outgoing_for(session.team_id).await
    }

    pub fn current_week(&self) -> u32 {
        self.calendar.current_week()
    }

    pub fn week_status(&self, week: u32) -> WeekStatus {
        self.calendar.week_status(week)
    }

    pub fn weeks(&self) -> &[WeekWindow] {
        self.calendar.weeks()
    }

    pub fn actual_score(&self, player_id: PlayerId, week: u32) -> f64 {
        self.scoring.actual_score(player_id, week)
    }

    pub fn projected_score(&self, player_id: PlayerId, week: u32) -> f64 {
        self.scoring.projected_score(player_id, week)
    }

    pub fn roster(&self, team_id: TeamId) -> Option<Roster> {
        self.cache.roster(team_id)
    }

    pub fn standings(&self) -> Vec<Team> {
        standings(&self.cache)
    }

    pub fn player_pool(&self, filter: PlayerFilter) -> Vec<PoolEntry> {
        player_pool(&self.cache, filter)
    }

    pub fn week_matchups(&self, week: u32) -> Vec<MatchupCard> {
        self.matchups.week(week)
    }

    pub fn team_matchup(&self, team_id: TeamId, week: u32) -> Option<TeamMatchupView> {
        self.matchups.for_team(team_id, week)
    }
}
