//! Poll Store
//!
//! Handles poll creation, voting, tallying, and list ordering. All state is
//! in-memory and lives for the process lifetime; nothing is persisted.

use super::model::Poll;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Minutes-to-milliseconds factor for computing `end_time`.
const MS_PER_MINUTE: i64 = 60_000;

/// Rejection reasons for store operations.
///
/// The `Display` strings are the exact reason texts served as plain-text 400
/// bodies; existing consumers match on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// Poll name missing or empty.
    #[error("missing or invalid \"name\" parameter")]
    InvalidName,
    /// Duration is below one minute.
    #[error("'minutes' is not a positive integer: {0}")]
    InvalidMinutes(i64),
    /// Fewer than two options.
    #[error("'options' has length < 2, options.length: {0}")]
    TooFewOptions(usize),
    /// Voter name missing or empty.
    #[error("missing or invalid \"voterName\" parameter")]
    InvalidVoter,
    /// Chosen option is not one of the poll's declared options.
    #[error("missing or invalid \"option\" parameter")]
    InvalidOption,
    /// Vote referenced a poll name that was never created.
    #[error("poll does not exist {0}")]
    UnknownPoll(String),
    /// Tally referenced a poll name that was never created.
    #[error("poll does not exist with name: {0}")]
    NotFound(String),
}

/// Outcome of a create request. A duplicate name is a normal outcome rather
/// than an error: the adapter answers `added: false` with a 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Poll was stored; carries the stored record.
    Added(Poll),
    /// A poll with this name already exists. State is untouched.
    Duplicate,
}

/// In-memory registry of polls and their ballots.
///
/// Invariant: `polls` and `ballots` always hold the same key set. Create
/// inserts into both under both write locks, clear empties both; nothing
/// else removes entries. Locks are acquired polls-then-ballots whenever an
/// operation needs both.
#[derive(Debug, Default)]
pub struct PollStore {
    /// Stored polls by name.
    polls: RwLock<HashMap<String, Poll>>,
    /// Ballots by poll name (poll -> voter -> chosen option).
    ballots: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl PollStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a poll closing `minutes` from now.
    pub fn create(
        &self,
        name: &str,
        minutes: i64,
        options: Vec<String>,
    ) -> Result<CreateOutcome, PollError> {
        self.create_at(Utc::now().timestamp_millis(), name, minutes, options)
    }

    /// Create a poll with an explicit creation instant. `end_time` is
    /// `now_ms + minutes * 60_000`.
    pub fn create_at(
        &self,
        now_ms: i64,
        name: &str,
        minutes: i64,
        options: Vec<String>,
    ) -> Result<CreateOutcome, PollError> {
        if name.is_empty() {
            return Err(PollError::InvalidName);
        }
        if minutes < 1 {
            return Err(PollError::InvalidMinutes(minutes));
        }
        if options.len() < 2 {
            return Err(PollError::TooFewOptions(options.len()));
        }

        let mut polls = self.polls.write();
        let mut ballots = self.ballots.write();
        if polls.contains_key(name) || ballots.contains_key(name) {
            return Ok(CreateOutcome::Duplicate);
        }

        let poll = Poll {
            name: name.to_string(),
            end_time: now_ms.saturating_add(minutes.saturating_mul(MS_PER_MINUTE)),
            options,
        };
        polls.insert(name.to_string(), poll.clone());
        ballots.insert(name.to_string(), HashMap::new());

        Ok(CreateOutcome::Added(poll))
    }

    /// Whether a poll with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.polls.read().contains_key(name) || self.ballots.read().contains_key(name)
    }

    /// All polls, open ones closing soonest first, then closed ones most
    /// recently closed first.
    pub fn list(&self) -> Vec<Poll> {
        self.list_at(Utc::now().timestamp_millis())
    }

    /// Deterministic variant of [`list`](Self::list) with an explicit clock.
    pub fn list_at(&self, now_ms: i64) -> Vec<Poll> {
        let mut polls: Vec<Poll> = self.polls.read().values().cloned().collect();
        // sort_by_key is stable; ties keep their relative order
        polls.sort_by_key(|p| p.rank(now_ms));
        polls
    }

    /// Record `voter`'s selection, replacing any earlier one. Returns whether
    /// an earlier selection was replaced.
    ///
    /// There is deliberately no open-check here: the system this reimplements
    /// accepts votes after `end_time`, and that behavior is kept.
    pub fn vote(&self, poll_name: &str, voter: &str, option: &str) -> Result<bool, PollError> {
        let polls = self.polls.read();
        let mut ballots = self.ballots.write();
        let ledger = ballots
            .get_mut(poll_name)
            .ok_or_else(|| PollError::UnknownPoll(poll_name.to_string()))?;

        if voter.is_empty() {
            return Err(PollError::InvalidVoter);
        }
        let declared = polls
            .get(poll_name)
            .is_some_and(|p| p.options.iter().any(|o| o == option));
        if !declared {
            return Err(PollError::InvalidOption);
        }

        let replaced = ledger.insert(voter.to_string(), option.to_string()).is_some();
        Ok(replaced)
    }

    /// Count the current selections for a poll. Every declared option is
    /// present in the result, zero-count ones included, plus a synthetic
    /// `"total"` key counting one per voter.
    pub fn tally(&self, poll_name: &str) -> Result<BTreeMap<String, u32>, PollError> {
        let polls = self.polls.read();
        let ballots = self.ballots.read();
        let ledger = ballots
            .get(poll_name)
            .ok_or_else(|| PollError::NotFound(poll_name.to_string()))?;

        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        counts.insert("total".to_string(), 0);
        if let Some(poll) = polls.get(poll_name) {
            for option in &poll.options {
                counts.insert(option.clone(), 0);
            }
        }
        for chosen in ledger.values() {
            if let Some(total) = counts.get_mut("total") {
                *total += 1;
            }
            if let Some(count) = counts.get_mut(chosen) {
                *count += 1;
            }
        }

        Ok(counts)
    }

    /// Remove every poll and every ballot.
    pub fn clear(&self) {
        let mut polls = self.polls.write();
        let mut ballots = self.ballots.write();
        polls.clear();
        ballots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(opts: &[&str]) -> Vec<String> {
        opts.iter().map(|o| o.to_string()).collect()
    }

    #[test]
    fn test_create_poll() {
        let store = PollStore::new();
        let outcome = store.create("colors", 5, options(&["red", "blue"])).unwrap();
        let CreateOutcome::Added(poll) = outcome else {
            panic!("expected Added");
        };
        assert_eq!(poll.name, "colors");
        assert_eq!(poll.options, options(&["red", "blue"]));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_create_end_time() {
        let store = PollStore::new();
        let outcome = store
            .create_at(1_000, "p", 2, options(&["a", "b"]))
            .unwrap();
        let CreateOutcome::Added(poll) = outcome else {
            panic!("expected Added");
        };
        assert_eq!(poll.end_time, 1_000 + 2 * 60_000);
    }

    #[test]
    fn test_create_end_time_from_wall_clock() {
        let store = PollStore::new();
        let before = Utc::now().timestamp_millis();
        let outcome = store.create("p", 5, options(&["a", "b"])).unwrap();
        let after = Utc::now().timestamp_millis();
        let CreateOutcome::Added(poll) = outcome else {
            panic!("expected Added");
        };
        assert!(poll.end_time >= before + 5 * 60_000);
        assert!(poll.end_time <= after + 5 * 60_000);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let store = PollStore::new();
        assert_eq!(
            store.create("", 5, options(&["a", "b"])),
            Err(PollError::InvalidName)
        );
        assert_eq!(
            store.create("p", 0, options(&["a", "b"])),
            Err(PollError::InvalidMinutes(0))
        );
        assert_eq!(
            store.create("p", -3, options(&["a", "b"])),
            Err(PollError::InvalidMinutes(-3))
        );
        assert_eq!(
            store.create("p", 5, options(&["only"])),
            Err(PollError::TooFewOptions(1))
        );
        // nothing was stored
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_create_duplicate_leaves_original() {
        let store = PollStore::new();
        store.create("p", 5, options(&["a", "b"])).unwrap();

        let outcome = store.create("p", 30, options(&["x", "y", "z"])).unwrap();
        assert_eq!(outcome, CreateOutcome::Duplicate);

        let polls = store.list();
        assert_eq!(polls.len(), 1);
        assert_eq!(polls[0].options, options(&["a", "b"]));
    }

    #[test]
    fn test_vote_and_replace() {
        let store = PollStore::new();
        store.create("milo", 5, options(&["lp", "ish"])).unwrap();

        assert_eq!(store.vote("milo", "A", "lp"), Ok(false));
        let tally = store.tally("milo").unwrap();
        assert_eq!(tally.get("lp"), Some(&1));
        assert_eq!(tally.get("ish"), Some(&0));
        assert_eq!(tally.get("total"), Some(&1));

        assert_eq!(store.vote("milo", "A", "ish"), Ok(true));
        let tally = store.tally("milo").unwrap();
        assert_eq!(tally.get("lp"), Some(&0));
        assert_eq!(tally.get("ish"), Some(&1));
        assert_eq!(tally.get("total"), Some(&1));
    }

    #[test]
    fn test_vote_rejections() {
        let store = PollStore::new();
        store.create("p", 5, options(&["a", "b"])).unwrap();

        assert_eq!(
            store.vote("ghost", "A", "a"),
            Err(PollError::UnknownPoll("ghost".to_string()))
        );
        assert_eq!(store.vote("p", "", "a"), Err(PollError::InvalidVoter));
        assert_eq!(store.vote("p", "A", "c"), Err(PollError::InvalidOption));
        // rejected votes left the ledger empty
        assert_eq!(store.tally("p").unwrap().get("total"), Some(&0));
    }

    #[test]
    fn test_vote_accepted_after_end_time() {
        let store = PollStore::new();
        // closed long ago relative to the wall clock
        store.create_at(0, "old", 1, options(&["a", "b"])).unwrap();
        assert_eq!(store.vote("old", "A", "a"), Ok(false));
        assert_eq!(store.tally("old").unwrap().get("a"), Some(&1));
    }

    #[test]
    fn test_tally_zero_votes() {
        let store = PollStore::new();
        store.create("p", 5, options(&["a", "b", "c"])).unwrap();

        let tally = store.tally("p").unwrap();
        assert_eq!(tally.len(), 4);
        for option in ["a", "b", "c", "total"] {
            assert_eq!(tally.get(option), Some(&0));
        }
    }

    #[test]
    fn test_tally_total_matches_option_sum() {
        let store = PollStore::new();
        store.create("p", 5, options(&["a", "b", "c"])).unwrap();
        for (voter, choice) in [("v1", "a"), ("v2", "a"), ("v3", "b"), ("v4", "c")] {
            store.vote("p", voter, choice).unwrap();
        }
        // v4 changes their mind
        store.vote("p", "v4", "a").unwrap();

        let tally = store.tally("p").unwrap();
        let total = *tally.get("total").unwrap();
        let sum: u32 = tally
            .iter()
            .filter(|(k, _)| k.as_str() != "total")
            .map(|(_, v)| v)
            .sum();
        assert_eq!(total, 4);
        assert_eq!(sum, total);
        assert_eq!(tally.get("a"), Some(&3));
        assert_eq!(tally.get("c"), Some(&0));
    }

    #[test]
    fn test_tally_unknown_poll() {
        let store = PollStore::new();
        assert_eq!(
            store.tally("ghost"),
            Err(PollError::NotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_list_ordering() {
        let store = PollStore::new();
        // all created at t=0; end times in minutes: p1=10, p2=5, p3=30, p4=20
        for (name, minutes) in [("p1", 10), ("p2", 5), ("p3", 30), ("p4", 20)] {
            store.create_at(0, name, minutes, options(&["a", "b"])).unwrap();
        }

        // at t=700s, p1 and p2 are closed, p3 and p4 are open
        let listed = store.list_at(700_000);
        let names: Vec<&str> = listed.iter().map(|p| p.name.as_str()).collect();
        // open soonest-first (p4 before p3), then closed most-recent-first
        // (p1 closed at 600s, p2 at 300s)
        assert_eq!(names, vec!["p4", "p3", "p1", "p2"]);
    }

    #[test]
    fn test_list_end_time_boundary_counts_as_open() {
        let store = PollStore::new();
        store.create_at(0, "edge", 10, options(&["a", "b"])).unwrap();
        store.create_at(0, "later", 20, options(&["a", "b"])).unwrap();

        // exactly at edge's end time it still sorts as open, ahead of later
        let names: Vec<String> = store
            .list_at(600_000)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["edge", "later"]);
    }

    #[test]
    fn test_clear() {
        let store = PollStore::new();
        store.create("p", 5, options(&["a", "b"])).unwrap();
        store.vote("p", "A", "a").unwrap();

        store.clear();
        assert!(store.list().is_empty());
        assert!(!store.contains("p"));
        assert_eq!(
            store.tally("p"),
            Err(PollError::NotFound("p".to_string()))
        );
        // clearing an empty store is fine
        store.clear();
    }
}
