//! pollbox library
//!
//! In-memory timed polls behind a small HTTP API: create a poll with a
//! closing time, cast or replace votes, tally results on demand, list polls
//! ordered by open/closed status, and clear everything. Nothing is
//! persisted; state lives for the process lifetime.

pub mod cli;
pub mod config;
pub mod logging;
pub mod polls;
pub mod server;
