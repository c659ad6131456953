//! SQLite Subscription Repository
//!
//! Local development and test backend. Dates are stored as ISO `YYYY-MM-DD`
//! text, so lexical comparison matches calendar order.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use st_common::MonthDate;
use tracing::{debug, info};

use super::entity::{CostQuery, NewSubscription, Subscription, SubscriptionPatch};
use super::repository::{ensure_affected, SubscriptionRepository};
use crate::shared::error::{Result, SubscriptionError};

const SELECT_COLUMNS: &str = "id, service_name, price, user_id, start_date, end_date";

/// SQLite implementation of SubscriptionRepository
pub struct SqliteSubscriptionRepository {
    pool: SqlitePool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn parse_row(row: &SqliteRow) -> Result<Subscription> {
        let start_date: NaiveDate = row.try_get("start_date")?;
        let end_date: Option<NaiveDate> = row.try_get("end_date")?;

        Ok(Subscription {
            id: row.try_get("id")?,
            service_name: row.try_get("service_name")?,
            price: row.try_get("price")?,
            user_id: row.try_get("user_id")?,
            start_date: MonthDate::from_date(start_date),
            end_date: end_date.map(MonthDate::from_date),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for SqliteSubscriptionRepository {
    async fn create(&self, subscription: &NewSubscription) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO subscriptions (id, service_name, price, user_id, start_date, end_date) \
             VALUES (?, ?, ?, ?, ?, NULL)",
        )
        .bind(&id)
        .bind(&subscription.service_name)
        .bind(subscription.price)
        .bind(&subscription.user_id)
        .bind(subscription.start_date.as_naive())
        .execute(&self.pool)
        .await?;

        debug!(id = %id, user_id = %subscription.user_id, "Inserted subscription");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Subscription> {
        let query = format!("SELECT {} FROM subscriptions WHERE id = ?", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| SubscriptionError::not_found(id))?;

        Self::parse_row(&row)
    }

    async fn update(&self, id: &str, patch: &SubscriptionPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE subscriptions SET ");
        {
            let mut assignments = builder.separated(", ");
            if let Some(price) = patch.price {
                assignments.push("price = ").push_bind_unseparated(price);
            }
            if let Some(end_date) = patch.end_date {
                assignments.push("end_date = ").push_bind_unseparated(end_date.as_naive());
            }
        }
        builder.push(" WHERE id = ").push_bind(id.to_string());

        let result = builder.build().execute(&self.pool).await?;

        debug!(id = %id, rows_affected = result.rows_affected(), "Updated subscription");
        ensure_affected(result.rows_affected(), id)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(id = %id, rows_affected = result.rows_affected(), "Deleted subscription");
        ensure_affected(result.rows_affected(), id)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Subscription>> {
        let query = format!("SELECT {} FROM subscriptions WHERE user_id = ?", SELECT_COLUMNS);

        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut subscriptions = Vec::with_capacity(rows.len());
        for row in &rows {
            subscriptions.push(Self::parse_row(row)?);
        }

        debug!(user_id = %user_id, count = subscriptions.len(), "Listed subscriptions");
        Ok(subscriptions)
    }

    async fn total_cost(&self, query: &CostQuery) -> Result<i64> {
        let service = query.service_filter();

        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(price), 0) FROM subscriptions \
             WHERE user_id = ? \
               AND (? IS NULL OR service_name = ?) \
               AND start_date <= ? \
               AND (end_date IS NULL OR end_date >= ?)",
        )
        .bind(&query.user_id)
        .bind(service)
        .bind(service)
        .bind(query.end_date.as_naive())
        .bind(query.start_date.as_naive())
        .fetch_one(&self.pool)
        .await?;

        debug!(user_id = %query.user_id, service_name = ?service, total, "Computed total cost");
        Ok(total)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscriptions (
                id TEXT PRIMARY KEY,
                service_name TEXT NOT NULL,
                price BIGINT NOT NULL CHECK (price >= 0),
                user_id TEXT NOT NULL,
                start_date DATE NOT NULL,
                end_date DATE NULL CHECK (end_date IS NULL OR end_date >= start_date)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_subscriptions_user_id ON subscriptions(user_id)")
            .execute(&self.pool)
            .await?;

        info!("SQLite subscription schema initialized");
        Ok(())
    }
}
