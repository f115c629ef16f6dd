//! PostgreSQL league store
//!
//! Every multi-row write runs in one transaction with version-conditional
//! updates, so a roster planned from stale data never overwrites a newer one
//! and a failed trade settlement leaves nothing behind.

use crate::backend::{find_conflict, LeagueStore, NewTradeProposal, RosterWrite, TradeSettlement};
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::rows::{
    column_list, convert_all, MatchupRow, PlayerRow, RosterRow, TeamRow, TradeProposalRow,
    MATCHUP_FIELDS, PLAYER_FIELDS, ROSTER_FIELDS, TEAM_FIELDS, TRADE_PROPOSAL_FIELDS,
};
use crate::seed::LeagueSeed;
use crate::types::{
    Player, ProposalId, Roster, ScheduledMatchup, Team, TeamId, TradeProposal, TradeStatus,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

/// PostgreSQL-backed league store
#[derive(Debug, Clone)]
pub struct PgLeagueStore {
    db_pool: PgPool,
}

impl PgLeagueStore {
    /// Connect, then run migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.url)
            .await?;

        sqlx::migrate!("./migrations").run(&db_pool).await?;

        Ok(Self { db_pool })
    }

    /// Wrap an existing pool (migrations are the caller's concern)
    pub fn from_pool(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Insert the seed's rows when the league tables are empty
    pub async fn seed_if_empty(&self, seed: &LeagueSeed) -> Result<bool> {
        let (teams,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM teams")
            .fetch_one(&self.db_pool)
            .await?;
        if teams > 0 {
            return Ok(false);
        }

        // Validate before touching the database
        seed.clone().into_entities()?;

        let mut tx = self.db_pool.begin().await?;

        for row in &seed.players {
            sqlx::query(&format!(
                "INSERT INTO players ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
                column_list(PLAYER_FIELDS)
            ))
            .bind(row.id)
            .bind(&row.name)
            .bind(&row.position)
            .bind(&row.team)
            .bind(&row.image_url)
            .bind(row.projected_points)
            .bind(&row.weekly_scores)
            .execute(&mut *tx)
            .await?;
        }

        for row in &seed.teams {
            sqlx::query(&format!(
                "INSERT INTO teams ({}) VALUES ($1, $2, $3, $4, $5, $6)",
                column_list(TEAM_FIELDS)
            ))
            .bind(row.id)
            .bind(&row.name)
            .bind(row.wins)
            .bind(row.losses)
            .bind(row.ties)
            .bind(row.points_for)
            .execute(&mut *tx)
            .await?;
        }

        for row in &seed.rosters {
            sqlx::query(&format!(
                "INSERT INTO rosters ({}) VALUES ($1, $2, $3, $4)",
                column_list(ROSTER_FIELDS)
            ))
            .bind(row.team_id)
            .bind(&row.starters)
            .bind(&row.bench)
            .bind(row.version)
            .execute(&mut *tx)
            .await?;
        }

        for row in &seed.schedule {
            sqlx::query(&format!(
                "INSERT INTO schedule ({}) VALUES ($1, $2, $3)",
                column_list(MATCHUP_FIELDS)
            ))
            .bind(row.week)
            .bind(row.team1_id)
            .bind(row.team2_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Seeded league database: {} players, {} teams",
            seed.players.len(),
            seed.teams.len()
        );

        Ok(true)
    }

    /// Version-conditional roster writes inside an open transaction
    ///
    /// Every roster row is locked first, in team order, so ownership can be
    /// checked league-wide before anything is updated.
    async fn write_rosters(
        tx: &mut Transaction<'_, Postgres>,
        rosters: &[Roster],
    ) -> Result<RosterWrite> {
        let rows: Vec<RosterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rosters ORDER BY team_id FOR UPDATE",
            column_list(ROSTER_FIELDS)
        ))
        .fetch_all(&mut **tx)
        .await?;
        let stored: Vec<Roster> = convert_all(rows)?;

        for roster in rosters {
            match stored.iter().find(|s| s.team_id == roster.team_id) {
                None => return Ok(RosterWrite::Missing(roster.team_id)),
                Some(current) if current.version != roster.version => {
                    return Ok(RosterWrite::Stale {
                        team_id: roster.team_id,
                        expected: roster.version,
                        actual: current.version,
                    });
                }
                Some(_) => {}
            }
        }

        let mut after: Vec<&Roster> = stored
            .iter()
            .filter(|s| rosters.iter().all(|r| r.team_id != s.team_id))
            .collect();
        after.extend(rosters.iter());
        if let Some(conflict) = find_conflict(&after) {
            return Ok(conflict);
        }

        let mut written = Vec::with_capacity(rosters.len());
        for roster in rosters {
            let row = RosterRow::from(roster);
            sqlx::query(
                "UPDATE rosters SET starters = $1, bench = $2, version = version + 1 \
                 WHERE team_id = $3 AND version = $4",
            )
            .bind(&row.starters)
            .bind(&row.bench)
            .bind(row.team_id)
            .bind(row.version)
            .execute(&mut **tx)
            .await?;

            written.push(Roster { version: roster.version + 1, ..roster.clone() });
        }

        Ok(RosterWrite::Applied(written))
    }
}

#[async_trait::async_trait]
impl LeagueStore for PgLeagueStore {
    async fn load_players(&self) -> Result<Vec<Player>> {
        let rows: Vec<PlayerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM players ORDER BY id",
            column_list(PLAYER_FIELDS)
        ))
        .fetch_all(&self.db_pool)
        .await?;
        convert_all(rows)
    }

    async fn load_teams(&self) -> Result<Vec<Team>> {
        let rows: Vec<TeamRow> =
            sqlx::query_as(&format!("SELECT {} FROM teams ORDER BY id", column_list(TEAM_FIELDS)))
                .fetch_all(&self.db_pool)
                .await?;
        convert_all(rows)
    }

    async fn load_rosters(&self) -> Result<Vec<Roster>> {
        let rows: Vec<RosterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rosters ORDER BY team_id",
            column_list(ROSTER_FIELDS)
        ))
        .fetch_all(&self.db_pool)
        .await?;
        convert_all(rows)
    }

    async fn load_schedule(&self) -> Result<Vec<ScheduledMatchup>> {
        let rows: Vec<MatchupRow> = sqlx::query_as(&format!(
            "SELECT {} FROM schedule ORDER BY week, team1_id",
            column_list(MATCHUP_FIELDS)
        ))
        .fetch_all(&self.db_pool)
        .await?;
        convert_all(rows)
    }

    async fn load_trade_proposals(&self) -> Result<Vec<TradeProposal>> {
        let rows: Vec<TradeProposalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM trade_proposals ORDER BY id",
            column_list(TRADE_PROPOSAL_FIELDS)
        ))
        .fetch_all(&self.db_pool)
        .await?;
        convert_all(rows)
    }

    async fn load_roster(&self, team_id: TeamId) -> Result<Option<Roster>> {
        let row: Option<RosterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rosters WHERE team_id = $1",
            column_list(ROSTER_FIELDS)
        ))
        .bind(team_id.0)
        .fetch_optional(&self.db_pool)
        .await?;
        row.map(Roster::try_from).transpose()
    }

    async fn load_trade_proposal(&self, id: ProposalId) -> Result<Option<TradeProposal>> {
        let row: Option<TradeProposalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM trade_proposals WHERE id = $1",
            column_list(TRADE_PROPOSAL_FIELDS)
        ))
        .bind(id.0)
        .fetch_optional(&self.db_pool)
        .await?;
        row.map(TradeProposal::try_from).transpose()
    }

    async fn update_rosters(&self, rosters: &[Roster]) -> Result<RosterWrite> {
        let mut tx = self.db_pool.begin().await?;
        let outcome = Self::write_rosters(&mut tx, rosters).await?;

        if matches!(outcome, RosterWrite::Applied(_)) {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }

        Ok(outcome)
    }

    async fn insert_trade_proposal(&self, proposal: NewTradeProposal) -> Result<TradeProposal> {
        let offered: Vec<i64> = proposal.offered.iter().map(|id| id.0).collect();
        let requested: Vec<i64> = proposal.requested.iter().map(|id| id.0).collect();

        let row: TradeProposalRow = sqlx::query_as(&format!(
            "INSERT INTO trade_proposals \
             (proposing_team_id, receiving_team_id, offered_player_ids, requested_player_ids, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {}",
            column_list(TRADE_PROPOSAL_FIELDS)
        ))
        .bind(proposal.proposing_team_id.0)
        .bind(proposal.receiving_team_id.0)
        .bind(&offered)
        .bind(&requested)
        .bind(TradeStatus::Pending.as_str())
        .fetch_one(&self.db_pool)
        .await?;

        TradeProposal::try_from(row)
    }

    async fn set_trade_status(
        &self,
        id: ProposalId,
        from: TradeStatus,
        to: TradeStatus,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE trade_proposals SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(id.0)
            .bind(from.as_str())
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn settle_trade(&self, id: ProposalId, rosters: &[Roster]) -> Result<TradeSettlement> {
        let mut tx = self.db_pool.begin().await?;

        // Row lock so a concurrent reject cannot interleave with the settlement
        let row: Option<TradeProposalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM trade_proposals WHERE id = $1 FOR UPDATE",
            column_list(TRADE_PROPOSAL_FIELDS)
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?;

        let mut proposal = match row {
            None => {
                tx.rollback().await?;
                return Ok(TradeSettlement::ProposalMissing);
            }
            Some(row) => TradeProposal::try_from(row)?,
        };

        if !proposal.is_pending() {
            tx.rollback().await?;
            return Ok(TradeSettlement::NotPending(proposal.status));
        }

        let written = match Self::write_rosters(&mut tx, rosters).await? {
            RosterWrite::Applied(written) => written,
            rejected => {
                tx.rollback().await?;
                return Ok(TradeSettlement::Rosters(rejected));
            }
        };

        sqlx::query("UPDATE trade_proposals SET status = $1 WHERE id = $2")
            .bind(TradeStatus::Accepted.as_str())
            .bind(id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        proposal.status = TradeStatus::Accepted;
        Ok(TradeSettlement::Settled { proposal, rosters: written })
    }
}
