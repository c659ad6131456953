//! Database bootstrap
//!
//! Pool construction for the configured backend, connection retry with
//! exponential backoff, and repository selection.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use st_config::DatabaseConfig;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::shared::error::SubscriptionError;
use crate::subscription::SubscriptionRepository;

/// Upper bound for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Unknown database kind: {0}")]
    UnknownKind(String),

    #[error("Database kind '{0}' is not compiled into this build")]
    Unsupported(String),

    #[error("Failed to connect after {attempts} attempts: {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid database URL: {0}")]
    InvalidUrl(#[source] sqlx::Error),

    #[error("Schema initialization failed: {0}")]
    Schema(#[from] SubscriptionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    Sqlite,
}

impl FromStr for DatabaseKind {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(DatabaseError::UnknownKind(other.to_string())),
        }
    }
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt - 1)`, capped.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

/// Connect to PostgreSQL, retrying with exponential backoff.
#[cfg(feature = "postgres")]
pub async fn connect_postgres(config: &DatabaseConfig) -> Result<sqlx::PgPool, DatabaseError> {
    use sqlx::postgres::PgPoolOptions;

    let attempts = config.retry_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        debug!(attempt, max_attempts = attempts, "Connecting to PostgreSQL");

        let result = PgPoolOptions::new()
            .max_connections(config.pool_max)
            .acquire_timeout(config.connect_timeout())
            .connect(&config.url)
            .await;

        match result {
            Ok(pool) => {
                if attempt > 1 {
                    info!(attempt, "Connected to PostgreSQL after retries");
                } else {
                    info!(pool_max = config.pool_max, "Connected to PostgreSQL");
                }
                return Ok(pool);
            }
            Err(e) => {
                if attempt < attempts {
                    let delay = backoff_delay(config.retry_delay(), attempt);
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        retry_delay_ms = delay.as_millis() as u64,
                        "Failed to connect to PostgreSQL, retrying..."
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    let source = last_error.unwrap_or(sqlx::Error::PoolTimedOut);
    error!(attempts, error = %source, "Failed to connect to PostgreSQL after all retries");
    Err(DatabaseError::Connect { attempts, source })
}

/// Open a SQLite pool. In-memory databases get a single pinned connection.
#[cfg(feature = "sqlite")]
pub async fn connect_sqlite(url: &str) -> Result<sqlx::SqlitePool, DatabaseError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    let options = SqliteConnectOptions::from_str(url)
        .map_err(DatabaseError::InvalidUrl)?
        .create_if_missing(true);

    let pool_options = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|source| DatabaseError::Connect { attempts: 1, source })?;

    info!(url = %url, "Opened SQLite database");
    Ok(pool)
}

/// Connect to the configured backend and initialize its schema.
pub async fn open_repository(
    config: &DatabaseConfig,
) -> Result<Arc<dyn SubscriptionRepository>, DatabaseError> {
    let kind: DatabaseKind = config.kind.parse()?;

    let repo: Arc<dyn SubscriptionRepository> = match kind {
        #[cfg(feature = "postgres")]
        DatabaseKind::Postgres => {
            let pool = connect_postgres(config).await?;
            Arc::new(crate::subscription::postgres::PostgresSubscriptionRepository::new(pool))
        }
        #[cfg(feature = "sqlite")]
        DatabaseKind::Sqlite => {
            let pool = connect_sqlite(&config.url).await?;
            Arc::new(crate::subscription::sqlite::SqliteSubscriptionRepository::new(pool))
        }
        #[allow(unreachable_patterns)]
        other => return Err(DatabaseError::Unsupported(format!("{:?}", other).to_lowercase())),
    };

    repo.init_schema().await?;
    Ok(repo)
}
