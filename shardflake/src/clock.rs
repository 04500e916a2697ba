//! Wall clock source.

use std::sync::{
    atomic::{self, AtomicU64},
    Arc,
};

use chrono::Utc;

/// Source of the current time in whole seconds since the unix epoch.
pub trait Clock: Send + Sync + 'static {
    fn now_secs(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        // pre-epoch clocks are clamped, the generator then sees a rollback
        Utc::now().timestamp().max(0) as u64
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can hold one clone and hand the
/// other to a generator.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn new(secs: u64) -> Self {
        Self(Arc::new(AtomicU64::new(secs)))
    }

    pub fn set(&self, secs: u64) {
        self.0.store(secs, atomic::Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, atomic::Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.0.load(atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_tracks_chrono() {
        let before = Utc::now().timestamp() as u64;
        let now = SystemClock.now_secs();
        let after = Utc::now().timestamp() as u64;
        assert!(before <= now && now <= after);
    }

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(10);
        let handle = clock.clone();
        handle.advance(2);
        assert_eq!(clock.now_secs(), 12);
        handle.set(5);
        assert_eq!(clock.now_secs(), 5);
    }
}
