//! Subscription Service
//!
//! Orchestrates the repository and enforces the date-ordering invariant:
//! a present end date is never before the start date.

use std::sync::Arc;

use tracing::info;

use super::entity::{CostQuery, NewSubscription, Subscription, SubscriptionPatch};
use super::repository::SubscriptionRepository;
use crate::shared::context::CallerContext;
use crate::shared::error::{Result, SubscriptionError};

#[derive(Clone)]
pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionService {
    pub fn new(repo: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repo }
    }

    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id, user_id = %subscription.user_id))]
    pub async fn create(&self, ctx: &CallerContext, subscription: NewSubscription) -> Result<String> {
        let id = self.repo.create(&subscription).await?;
        info!(id = %id, service_name = %subscription.service_name, "Subscription created");
        Ok(id)
    }

    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id, id = %id))]
    pub async fn get(&self, ctx: &CallerContext, id: &str) -> Result<Subscription> {
        self.repo.get(id).await
    }

    /// Apply a partial update.
    ///
    /// A supplied end date is checked against the stored start date before
    /// anything is written. An empty patch succeeds without touching storage.
    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id, id = %id))]
    pub async fn update(&self, ctx: &CallerContext, id: &str, patch: SubscriptionPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        if let Some(end_date) = patch.end_date {
            let current = self.repo.get(id).await?;
            if end_date < current.start_date {
                return Err(SubscriptionError::invalid_period(current.start_date, end_date));
            }
        }

        self.repo.update(id, &patch).await?;
        info!(price = ?patch.price, end_date = ?patch.end_date, "Subscription updated");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id, id = %id))]
    pub async fn delete(&self, ctx: &CallerContext, id: &str) -> Result<()> {
        self.repo.delete(id).await?;
        info!("Subscription deleted");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id, user_id = %user_id))]
    pub async fn list(&self, ctx: &CallerContext, user_id: &str) -> Result<Vec<Subscription>> {
        self.repo.list_by_user(user_id).await
    }

    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id, user_id = %query.user_id))]
    pub async fn total_cost(&self, ctx: &CallerContext, query: &CostQuery) -> Result<i64> {
        self.repo.total_cost(query).await
    }
}
