//! Session and leave integrity core for staffdesk
//!
//! This crate contains the two decision engines of staffdesk:
//! - Session monitor (Active -> Warning -> Expired) driven by inactivity
//! - Leave conflict engine (inclusive day counts, closed-interval overlap,
//!   active-status filtering) and the leave request form built on it
//!
//! Neither engine performs navigation or rendering; they return decisions
//! and events for the host to act on.

mod events;
mod leave;
mod request;
mod session;

pub use events::*;
pub use leave::*;
pub use request::*;
pub use session::*;
