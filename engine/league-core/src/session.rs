//! Team identity and login sessions

use crate::config::AuthConfig;
use crate::error::{LeagueError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use league_store::{LeagueStore, TeamId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Opaque handle returned by a successful login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserHandle(pub Uuid);

impl UserHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserHandle {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(UserHandle)
    }
}

/// A logged-in team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub handle: UserHandle,
    pub team_id: TeamId,
    pub team_name: String,
    pub logged_in_at: DateTime<Utc>,
}

/// Handle -> session table
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<UserHandle, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, team_id: TeamId, team_name: String) -> Session {
        let session = Session { handle: UserHandle::new(), team_id, team_name, logged_in_at: Utc::now() };
        self.sessions.insert(session.handle, session.clone());
        session
    }

    pub fn get(&self, handle: UserHandle) -> Option<Session> {
        self.sessions.get(&handle).map(|s| s.value().clone())
    }

    /// Returns whether a session was removed
    pub fn close(&self, handle: UserHandle) -> bool {
        self.sessions.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Authenticates a team and tracks its session
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn login(&self, identifier: &str, credential: &str) -> Result<Session>;

    async fn logout(&self, handle: UserHandle) -> Result<()>;

    async fn current_session(&self, handle: UserHandle) -> Result<Option<Session>>;
}

/// Team name plus the shared league password
pub struct LocalIdentityProvider {
    store: Arc<dyn LeagueStore>,
    league_password: String,
    sessions: Arc<SessionStore>,
}

impl LocalIdentityProvider {
    pub fn new(store: Arc<dyn LeagueStore>, auth: &AuthConfig, sessions: Arc<SessionStore>) -> Self {
        Self { store, league_password: auth.league_password.clone(), sessions }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn login(&self, identifier: &str, credential: &str) -> Result<Session> {
        let teams = self.store.load_teams().await?;
        let team = teams.into_iter().find(|t| t.name.eq_ignore_ascii_case(identifier.trim()));

        match team {
            Some(team) if credential == self.league_password => {
                let session = self.sessions.open(team.id, team.name);
                tracing::info!("Team {} ({}) logged in", session.team_name, session.team_id);
                Ok(session)
            }
            _ => {
                tracing::warn!("Failed login attempt for '{}'", identifier);
                Err(LeagueError::InvalidCredentials)
            }
        }
    }

    async fn logout(&self, handle: UserHandle) -> Result<()> {
        if self.sessions.close(handle) {
            tracing::info!("Session {} logged out", handle);
        }
        Ok(())
    }

    async fn current_session(&self, handle: UserHandle) -> Result<Option<Session>> {
        Ok(self.sessions.get(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use league_store::{InMemoryLeagueStore, LeagueSeed};

    fn provider() -> (LocalIdentityProvider, Arc<SessionStore>) {
        let store = Arc::new(InMemoryLeagueStore::from_seed(LeagueSeed::default_league()).unwrap());
        let sessions = Arc::new(SessionStore::new());
        (LocalIdentityProvider::new(store, &AuthConfig::default(), sessions.clone()), sessions)
    }

    #[tokio::test]
    async fn test_login_is_case_insensitive() {
        let (provider, sessions) = provider();
        let session = provider.login("  rihito ", "1234").await.unwrap();

        assert_eq!(session.team_id, TeamId(3));
        assert_eq!(session.team_name, "Rihito");
        assert_eq!(sessions.len(), 1);
        assert_eq!(provider.current_session(session.handle).await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let (provider, sessions) = provider();
        assert!(matches!(provider.login("Rihito", "4321").await, Err(LeagueError::InvalidCredentials)));
        assert!(matches!(provider.login("Nobody", "1234").await, Err(LeagueError::InvalidCredentials)));
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let (provider, _) = provider();
        let session = provider.login("Daniel", "1234").await.unwrap();

        provider.logout(session.handle).await.unwrap();
        assert_eq!(provider.current_session(session.handle).await.unwrap(), None);
        // Logging out twice is harmless
        provider.logout(session.handle).await.unwrap();
    }

    #[test]
    fn test_handle_parsing() {
        let handle = UserHandle::new();
        assert_eq!(handle.to_string().parse::<UserHandle>().unwrap(), handle);
        assert!("not-a-uuid".parse::<UserHandle>().is_err());
    }
}
