//! Subscription Repository Trait
//!
//! Persistence contract for subscriptions. Implementations translate every
//! storage failure into [`SubscriptionError`]; "row absent" is always
//! reported as `NotFound`, never as a generic error.

use async_trait::async_trait;

use super::entity::{CostQuery, NewSubscription, Subscription, SubscriptionPatch};
use crate::shared::error::{Result, SubscriptionError};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a new row and return its generated id
    async fn create(&self, subscription: &NewSubscription) -> Result<String>;

    /// Fetch a single subscription by id
    async fn get(&self, id: &str) -> Result<Subscription>;

    /// Write only the fields present in `patch`.
    ///
    /// An empty patch must not reach the database; implementations return
    /// `Ok(())` without issuing a statement.
    async fn update(&self, id: &str, patch: &SubscriptionPatch) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// All subscriptions owned by `user_id`, in no particular order
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Subscription>>;

    /// Sum of prices over subscriptions overlapping the query window, 0 when none match
    async fn total_cost(&self, query: &CostQuery) -> Result<i64>;

    /// Create tables and indexes if they do not exist
    async fn init_schema(&self) -> Result<()>;
}

/// Map a zero affected-row count to `NotFound`.
pub(crate) fn ensure_affected(rows_affected: u64, id: &str) -> Result<()> {
    if rows_affected == 0 {
        Err(SubscriptionError::not_found(id))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rows_is_not_found() {
        assert!(ensure_affected(0, "missing").unwrap_err().is_not_found());
        assert!(ensure_affected(1, "present").is_ok());
    }
}
