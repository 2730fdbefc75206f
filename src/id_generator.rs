use crate::{config::IdPolicy, error::TrackError};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashSet;

/// Random redraws attempted before falling back to a linear probe.
const MAX_REDRAWS: usize = 16;

/*-----------------------------------------------------------------------------
IdGenerator
-----------------------------------------------------------------------------*/

/// Hands out track ids that are never shared with a live track.
#[derive(Debug)]
pub struct IdGenerator {
    policy: IdPolicy,
    rng: StdRng,
    next: u64,
}

impl IdGenerator {
    pub fn new(policy: IdPolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let next = match policy {
            IdPolicy::Monotonic { start } => start,
            IdPolicy::Random { min, .. } => min,
        };
        Self { policy, rng, next }
    }

    pub fn next_id(&mut self, live: &HashSet<u64>) -> Result<u64, TrackError> {
        match self.policy {
            IdPolicy::Random { min, max } => self.next_random(min, max, live),
            IdPolicy::Monotonic { start } => self.next_monotonic(start, live),
        }
    }

    fn next_random(
        &mut self,
        min: u64,
        max: u64,
        live: &HashSet<u64>,
    ) -> Result<u64, TrackError> {
        let mut candidate = min;
        for _ in 0..MAX_REDRAWS {
            candidate = self.rng.gen_range(min..=max);
            if !live.contains(&candidate) {
                return Ok(candidate);
            }
            tracing::debug!(id = candidate, "track id collision, redrawing");
        }

        // Dense range: walk forward from the last draw to the first free slot.
        let mut id = candidate;
        for _ in 0..=(max - min) {
            if !live.contains(&id) {
                tracing::warn!(
                    id,
                    live = live.len(),
                    "track id space is crowded"
                );
                return Ok(id);
            }
            id = if id == max { min } else { id + 1 };
        }
        Err(TrackError::IdSpaceExhausted { min, max })
    }

    fn next_monotonic(
        &mut self,
        start: u64,
        live: &HashSet<u64>,
    ) -> Result<u64, TrackError> {
        let first = self.next;
        loop {
            let id = self.next;
            self.next = self.next.checked_add(1).unwrap_or(start);
            if !live.contains(&id) {
                return Ok(id);
            }
            if self.next == first {
                return Err(TrackError::IdSpaceExhausted {
                    min: start,
                    max: u64::MAX,
                });
            }
        }
    }
}
