//! Host interfaces for staffdesk
//!
//! This crate defines the seams between the engines and whatever embeds
//! them: where qualifying user activity comes from, how notices and forced
//! logouts reach the user, and how leave records are read and created in
//! the HR directory. It contains no platform code itself.

mod activity;
mod mock;
mod traits;

pub use activity::*;
pub use mock::*;
pub use traits::*;
