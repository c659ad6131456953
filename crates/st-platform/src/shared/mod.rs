//! Shared infrastructure

pub mod api_common;
pub mod context;
pub mod error;

#[cfg(any(feature = "postgres", feature = "sqlite"))]
pub mod database;
