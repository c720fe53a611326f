//! Shared utilities for staffdesk
//!
//! This crate provides:
//! - ID types (EmployeeId, LeaveId, SessionId, SessionKey)
//! - Time utilities (mockable wall clock, epoch millis, calendar-day normalization)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
