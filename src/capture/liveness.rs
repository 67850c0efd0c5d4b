//! Liveness flags guarding late results.
//!
//! An upload may still be outstanding when its session or processing loop is
//! torn down. The task holds a [`LivenessToken`] and checks it before
//! applying anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owner side of a liveness flag. Dead once killed or dropped.
#[derive(Debug)]
pub struct Liveness {
    flag: Arc<AtomicBool>,
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn token(&self) -> LivenessToken {
        LivenessToken {
            flags: vec![Arc::clone(&self.flag)],
        }
    }

    pub fn kill(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Drop for Liveness {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Observer side. Alive only while every owner it was joined from is alive.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    flags: Vec<Arc<AtomicBool>>,
}

impl LivenessToken {
    pub fn is_alive(&self) -> bool {
        self.flags.iter().all(|f| f.load(Ordering::SeqCst))
    }

    /// A token that dies when either `self` or `other` dies.
    pub fn join(&self, other: &LivenessToken) -> LivenessToken {
        let mut flags = self.flags.clone();
        flags.extend(other.flags.iter().cloned());
        LivenessToken { flags }
    }
}
