use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Row, Transaction};
use tokio::time::timeout;

use crate::domain::{Points, UserAccount};

use super::{AccountUpdate, LedgerStore, MIGRATION_001_INITIAL, ReferralWrite, StoreError};

/// PostgreSQL-backed ledger store.
///
/// Balance and referral mutations are single statements or short
/// transactions whose conflict targets serialize concurrent writers on the
/// same user id inside the database, so two in-flight credits can never read
/// the same stale balance. Every call is bounded by the configured timeout
/// and surfaces [`StoreError::Unavailable`] when the database cannot answer.
pub struct PgLedgerStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PgLedgerStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    /// Connect to the database at the given url.
    pub async fn connect(database_url: &str, op_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(op_timeout)
            .connect(database_url)
            .await
            .context("Failed to connect to ledger database")?;
        Ok(Self::new(pool, op_timeout))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Bound a store call by the operation timeout, folding both query
    /// failures and the timeout itself into `Unavailable`.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T>>,
    {
        match timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::unavailable),
            Err(_) => Err(StoreError::unavailable(anyhow!(
                "store call exceeded {:?}",
                self.op_timeout
            ))),
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserAccount>, StoreError> {
        self.bounded(async {
            let row = sqlx::query("SELECT points FROM accounts WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch account")?;

            let Some(row) = row else {
                return Ok(None);
            };

            let referrals = fetch_referrals(&self.pool, user_id).await?;

            Ok(Some(UserAccount {
                user_id: user_id.to_string(),
                points: row.get("points"),
                referrals,
            }))
        })
        .await
    }

    async fn upsert(&self, user_id: &str, update: AccountUpdate) -> Result<(), StoreError> {
        self.bounded(async {
            let mut tx = self
                .pool
                .begin()
                .await
                .context("Failed to begin transaction")?;

            ensure_account(&mut tx, user_id).await?;

            if let Some(points) = update.points {
                sqlx::query("UPDATE accounts SET points = $2 WHERE user_id = $1")
                    .bind(user_id)
                    .bind(points)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to update points")?;
            }

            if let Some(referrals) = update.referrals {
                sqlx::query("DELETE FROM referrals WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to clear referrals")?;

                for referral_id in &referrals {
                    sqlx::query(
                        "INSERT INTO referrals (user_id, referral_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                    )
                    .bind(user_id)
                    .bind(referral_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to insert referral")?;
                }
            }

            tx.commit().await.context("Failed to commit upsert")?;
            Ok(())
        })
        .await
    }

    async fn add_points(&self, user_id: &str, amount: Points) -> Result<Points, StoreError> {
        self.bounded(async {
            let row = sqlx::query(
                r#"
                INSERT INTO accounts (user_id, points)
                VALUES ($1, $2)
                ON CONFLICT (user_id) DO UPDATE SET points = accounts.points + EXCLUDED.points
                RETURNING points
                "#,
            )
            .bind(user_id)
            .bind(amount)
            .fetch_one(&self.pool)
            .await
            .context("Failed to add points")?;

            Ok(row.get("points"))
        })
        .await
    }

    async fn add_referral(
        &self,
        user_id: &str,
        referral_id: &str,
        bonus: Points,
    ) -> Result<ReferralWrite, StoreError> {
        self.bounded(async {
            let mut tx = self
                .pool
                .begin()
                .await
                .context("Failed to begin transaction")?;

            ensure_account(&mut tx, user_id).await?;

            // The primary key on (user_id, referral_id) serializes
            // concurrent writers: exactly one of them inserts the pair.
            let inserted = sqlx::query(
                "INSERT INTO referrals (user_id, referral_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(referral_id)
            .execute(&mut *tx)
            .await
            .context("Failed to insert referral")?
            .rows_affected()
                == 1;

            let points: Points = if inserted {
                sqlx::query(
                    "UPDATE accounts SET points = points + $2 WHERE user_id = $1 RETURNING points",
                )
                .bind(user_id)
                .bind(bonus)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to credit referral bonus")?
                .get("points")
            } else {
                sqlx::query("SELECT points FROM accounts WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await
                    .context("Failed to fetch balance")?
                    .get("points")
            };

            let referrals = fetch_referrals(&mut *tx, user_id).await?;

            tx.commit().await.context("Failed to commit referral")?;

            Ok(ReferralWrite {
                inserted,
                points,
                referrals,
            })
        })
        .await
    }
}

/// Create the account row if it does not exist yet.
async fn ensure_account(tx: &mut Transaction<'_, Postgres>, user_id: &str) -> Result<()> {
    sqlx::query("INSERT INTO accounts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .context("Failed to create account row")?;
    Ok(())
}

/// Referred user ids in insertion order.
async fn fetch_referrals<'e, E>(executor: E, user_id: &str) -> Result<Vec<String>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let rows =
        sqlx::query("SELECT referral_id FROM referrals WHERE user_id = $1 ORDER BY position")
            .bind(user_id)
            .fetch_all(executor)
            .await
            .context("Failed to list referrals")?;

    Ok(rows.iter().map(|row| row.get("referral_id")).collect())
}
