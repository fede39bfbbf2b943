//! Identifier assignment for new registrants.

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::UserId;
use crate::store::{RecordStore, Result, StoreError};

/// Random ids are drawn from `0..RANDOM_ID_UPPER_BOUND`.
pub const RANDOM_ID_UPPER_BOUND: UserId = 1000;

/// How new records get their `user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum IdPolicy {
    /// Random integer below 1000. Collisions are possible and surface as a
    /// duplicate-key error on insert.
    #[default]
    Random,
    /// One past the highest stored id.
    Sequential,
}

/// Source of ids for [`Registry::submit`](crate::registry::Registry::submit).
pub trait IdSource {
    fn next_id(&mut self, store: &RecordStore) -> Result<UserId>;
}

/// Draws ids uniformly from `0..RANDOM_ID_UPPER_BOUND` without looking at the
/// store.
pub struct RandomIds<R = StdRng> {
    rng: R,
}

impl RandomIds<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> RandomIds<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> IdSource for RandomIds<R> {
    fn next_id(&mut self, _store: &RecordStore) -> Result<UserId> {
        Ok(self.rng.gen_range(0..RANDOM_ID_UPPER_BOUND))
    }
}

/// `max(user_id) + 1`, starting at 0 for an empty table. A stored
/// `i64::MAX` leaves nothing to hand out.
#[derive(Debug, Default)]
pub struct SequentialIds;

impl IdSource for SequentialIds {
    fn next_id(&mut self, store: &RecordStore) -> Result<UserId> {
        match store.max_id()? {
            None => Ok(0),
            Some(max) => max.checked_add(1).ok_or(StoreError::IdsExhausted(max)),
        }
    }
}

/// Build the id source for a configured policy.
pub fn id_source(policy: IdPolicy) -> Box<dyn IdSource> {
    match policy {
        IdPolicy::Random => Box::new(RandomIds::from_entropy()),
        IdPolicy::Sequential => Box::new(SequentialIds),
    }
}
