//! The upload gate: at most one request in flight, plus cool-down.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    closed_until: Option<Instant>,
}

impl GateState {
    fn is_open(&self, now: Instant) -> bool {
        !self.in_flight && self.closed_until.map_or(true, |until| now >= until)
    }
}

/// Guard admitting one upload at a time.
///
/// Cloning yields another handle to the same gate.
#[derive(Debug, Clone, Default)]
pub struct UploadGate {
    state: Arc<Mutex<GateState>>,
}

impl UploadGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Close the gate for one upload.
    ///
    /// Returns `None` while another upload is outstanding or a cool-down is
    /// running. The gate reopens when the returned permit is dropped.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        let mut state = self.lock();
        if !state.is_open(Instant::now()) {
            return None;
        }
        state.in_flight = true;
        state.closed_until = None;
        Some(GatePermit {
            gate: self.clone(),
            hold: None,
        })
    }

    /// Whether an upload could start right now.
    pub fn is_open(&self) -> bool {
        self.lock().is_open(Instant::now())
    }

    /// Whether an upload is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    /// Time left on the current cool-down, if one is running.
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        self.lock()
            .closed_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    fn release(&self, hold: Option<Duration>) {
        let mut state = self.lock();
        state.in_flight = false;
        state.closed_until = hold.map(|d| Instant::now() + d);
    }
}

/// Proof that the holder owns the gate. Dropping it reopens the gate.
#[derive(Debug)]
#[must_use = "the gate reopens as soon as the permit is dropped"]
pub struct GatePermit {
    gate: UploadGate,
    hold: Option<Duration>,
}

impl GatePermit {
    /// Keep the gate closed for `duration` after this permit is released.
    pub fn hold_closed_for(&mut self, duration: Duration) {
        self.hold = Some(duration);
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.release(self.hold);
    }
}
