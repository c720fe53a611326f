//! Shared data types for staffdesk
//!
//! This crate defines the plain data exchanged between the engines, the
//! HR directory adapter and the presentation layer:
//! - Leave records (vacations and permissions) and their statuses
//! - Create payloads handed to the directory
//! - Session states, end reasons and user-facing notices

mod events;
mod types;

pub use events::*;
pub use types::*;
