//! Subscription Aggregate
//!
//! User subscriptions with monthly pricing.

pub mod entity;
pub mod repository;
pub mod service;
pub mod api;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export main types
pub use entity::{CostQuery, NewSubscription, Subscription, SubscriptionPatch};
pub use repository::SubscriptionRepository;
pub use service::SubscriptionService;
pub use api::{SubscriptionsState, subscriptions_router};
