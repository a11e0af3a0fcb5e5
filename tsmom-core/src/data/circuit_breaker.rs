//! Request gate for a price provider that bans or throttles clients.
//!
//! The breaker opens for `cooldown` after a hard rejection (`trip`) or after
//! `failure_threshold` failures in a row, and closes on its own once the
//! deadline passes.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Gate {
    open_until: Option<Instant>,
    failures: u32,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    gate: Mutex<Gate>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            gate: Mutex::new(Gate::default()),
            cooldown,
            failure_threshold: 3,
        }
    }

    /// Settings used for Yahoo: half an hour closed off after three misses.
    pub fn for_yahoo() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    fn gate(&self) -> MutexGuard<'_, Gate> {
        // state stays consistent even if a holder panicked
        self.gate.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_allowed(&self) -> bool {
        self.is_allowed_at(Instant::now())
    }

    fn is_allowed_at(&self, now: Instant) -> bool {
        let mut gate = self.gate();
        match gate.open_until {
            Some(deadline) if now < deadline => false,
            Some(_) => {
                *gate = Gate::default();
                true
            }
            None => true,
        }
    }

    pub fn record_success(&self) {
        self.gate().failures = 0;
    }

    pub fn record_failure(&self) {
        let mut gate = self.gate();
        gate.failures = gate.failures.saturating_add(1);
        if gate.failures >= self.failure_threshold {
            gate.open_until = Some(Instant::now() + self.cooldown);
        }
    }

    /// Open immediately, e.g. on HTTP 403.
    pub fn trip(&self) {
        self.gate().open_until = Some(Instant::now() + self.cooldown);
    }

    pub fn remaining_cooldown(&self) -> Duration {
        self.gate()
            .open_until
            .map_or(Duration::ZERO, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            })
    }
}
