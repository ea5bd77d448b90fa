//! API key ring with round-robin rotation and per-key cooldown.
//!
//! A key marked failed is skipped until its cooldown has elapsed; all other
//! keys are handed out in turn.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default time a failed key sits out.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// A key handed out by the ring. `index` identifies it for `mark_failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLease {
    pub index: usize,
    pub key: String,
}

#[derive(Debug)]
struct RingState {
    cursor: usize,
    failed_at: Vec<Option<Instant>>,
}

/// Rotating set of API keys.
#[derive(Debug)]
pub struct KeyRing {
    keys: Vec<String>,
    cooldown: Duration,
    state: Mutex<RingState>,
}

impl KeyRing {
    pub fn new(keys: Vec<String>, cooldown: Duration) -> Self {
        let slots = keys.len();
        Self {
            keys,
            cooldown,
            state: Mutex::new(RingState {
                cursor: 0,
                failed_at: vec![None; slots],
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Next usable key, or `None` when every key is cooling down.
    pub fn next_key(&self) -> Option<KeyLease> {
        self.next_key_at(Instant::now())
    }

    /// Start the cooldown for the leased key.
    pub fn mark_failed(&self, lease: &KeyLease) {
        self.mark_failed_at(lease.index, Instant::now());
    }

    /// Number of keys currently usable.
    pub fn available(&self) -> usize {
        self.available_at(Instant::now())
    }

    pub(crate) fn next_key_at(&self, now: Instant) -> Option<KeyLease> {
        let total = self.keys.len();
        let mut state = self.lock();

        for step in 0..total {
            let index = (state.cursor + step) % total;
            if self.cooling(state.failed_at[index], now) {
                continue;
            }
            state.failed_at[index] = None;
            state.cursor = (index + 1) % total;
            return Some(KeyLease {
                index,
                key: self.keys[index].clone(),
            });
        }
        None
    }

    pub(crate) fn mark_failed_at(&self, index: usize, now: Instant) {
        let mut state = self.lock();
        if let Some(slot) = state.failed_at.get_mut(index) {
            *slot = Some(now);
            tracing::warn!(key_index = index, cooldown_secs = self.cooldown.as_secs(), "API key marked failed");
        }
    }

    pub(crate) fn available_at(&self, now: Instant) -> usize {
        let state = self.lock();
        state
            .failed_at
            .iter()
            .filter(|failed| !self.cooling(**failed, now))
            .count()
    }

    fn cooling(&self, failed_at: Option<Instant>, now: Instant) -> bool {
        failed_at.is_some_and(|at| now.saturating_duration_since(at) < self.cooldown)
    }

    fn lock(&self) -> MutexGuard<'_, RingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(keys: &[&str]) -> KeyRing {
        KeyRing::new(keys.iter().map(|k| k.to_string()).collect(), DEFAULT_COOLDOWN)
    }

    fn keys_in_order(ring: &KeyRing, now: Instant, n: usize) -> Vec<String> {
        (0..n).map(|_| ring.next_key_at(now).unwrap().key).collect()
    }

    #[test]
    fn round_robin_order() {
        let ring = ring(&["a", "b", "c"]);
        let now = Instant::now();
        assert_eq!(keys_in_order(&ring, now, 5), vec!["a", "b", "c", "a", "b"]);
    }

    #[test]
    fn failed_key_is_skipped_during_cooldown() {
        let ring = ring(&["a", "b", "c"]);
        let now = Instant::now();

        let first = ring.next_key_at(now).unwrap();
        assert_eq!(first.key, "a");
        ring.mark_failed_at(first.index, now);

        let later = now + Duration::from_secs(30);
        assert_eq!(keys_in_order(&ring, later, 4), vec!["b", "c", "b", "c"]);
        assert_eq!(ring.available_at(later), 2);
    }

    #[test]
    fn failed_key_returns_after_cooldown() {
        let ring = ring(&["a", "b"]);
        let now = Instant::now();
        ring.mark_failed_at(0, now);

        let after = now + DEFAULT_COOLDOWN;
        assert_eq!(keys_in_order(&ring, after, 2), vec!["a", "b"]);
        assert_eq!(ring.available_at(after), 2);
    }

    #[test]
    fn all_keys_cooling_yields_none() {
        let ring = ring(&["a", "b"]);
        let now = Instant::now();
        ring.mark_failed_at(0, now);
        ring.mark_failed_at(1, now);

        assert!(ring.next_key_at(now + Duration::from_secs(59)).is_none());
        assert!(ring.next_key_at(now + Duration::from_secs(60)).is_some());
    }

    #[test]
    fn empty_ring() {
        let ring = ring(&[]);
        assert!(ring.is_empty());
        assert!(ring.next_key().is_none());
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let ring = ring(&["a"]);
        ring.mark_failed_at(7, Instant::now());
        assert_eq!(ring.available(), 1);
    }
}
