//! Polls
//!
//! In-memory timed polls: the data model and the store that holds them.
//! Open/closed status is always derived from the clock, never stored.

pub mod model;
pub mod store;

pub use model::Poll;
pub use store::{CreateOutcome, PollError, PollStore};
