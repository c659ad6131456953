//! Subtrack Platform
//!
//! Subscription bookkeeping for users:
//! - Create, fetch, partially update, delete and list subscriptions
//! - Aggregate monthly cost over a date window
//! - PostgreSQL and SQLite storage behind one repository trait
//! - REST API with OpenAPI documentation
//!
//! ## Module Organization
//!
//! - `subscription` - the aggregate: entity, repository contract and backends,
//!   domain service, REST endpoints
//! - `shared` - errors, request context, database bootstrap, common API types
//! - `app` - router assembly used by the server binary and the API tests

pub mod app;
pub mod shared;
pub mod subscription;

pub use shared::context::CallerContext;
pub use shared::error::{Result, SubscriptionError};

pub use subscription::entity::{CostQuery, NewSubscription, Subscription, SubscriptionPatch};
pub use subscription::repository::SubscriptionRepository;
pub use subscription::service::SubscriptionService;

#[cfg(feature = "postgres")]
pub use subscription::postgres::PostgresSubscriptionRepository;
#[cfg(feature = "sqlite")]
pub use subscription::sqlite::SqliteSubscriptionRepository;
