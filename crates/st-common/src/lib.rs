//! Subtrack Common
//!
//! Value types shared by every crate in the workspace, plus the
//! structured logging bootstrap used by the binaries.

pub mod logging;
pub mod month;

pub use month::{MonthDate, MonthDateError};
