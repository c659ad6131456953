//! Subscription Error Types
//!
//! The closed set of failures every layer reports. Callers match on the
//! variant, never on message text.

use st_common::MonthDate;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("Subscription not found: {id}")]
    NotFound { id: String },

    #[error("Invalid period: end date {end_date} is before start date {start_date}")]
    InvalidPeriod {
        start_date: MonthDate,
        end_date: MonthDate,
    },

    /// Lower-layer failure. `message` is safe to show; driver detail stays
    /// in `source`.
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl SubscriptionError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn invalid_period(start_date: MonthDate, end_date: MonthDate) -> Self {
        Self::InvalidPeriod { start_date, end_date }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, SubscriptionError>;

#[cfg(any(feature = "postgres", feature = "sqlite"))]
impl From<sqlx::Error> for SubscriptionError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Storage operation failed");
        SubscriptionError::Internal {
            message: "storage operation failed".to_string(),
            source: Some(Box::new(e)),
        }
    }
}
