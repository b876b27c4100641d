//! Clock trait with a real and a mock implementation
//!
//! # Examples
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use payrun_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! clock.sleep(Duration::from_millis(100));
//! clock.sleep(Duration::from_millis(200));
//! assert_eq!(clock.sleeps(), vec![Duration::from_millis(100), Duration::from_millis(200)]);
//! ```

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Time operations used by the request pipeline
pub trait Clock: Send + Sync {
    /// Monotonic timestamp suitable for measuring durations.
    fn now(&self) -> Instant;

    /// Wall clock time.
    fn system_time(&self) -> SystemTime;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);

    /// Whole seconds since the UNIX epoch.
    fn unix_timestamp(&self) -> u64 {
        self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }
}

/// Real system clock. Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockClock;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant, SystemTime};

    use super::Clock;

    /// Mock clock for deterministic testing
    ///
    /// `sleep` returns immediately, advances the clock and records the
    /// requested duration. Clones share state.
    #[derive(Debug, Clone)]
    pub struct MockClock {
        start: Instant,
        base_system_time: SystemTime,
        state: Arc<Mutex<MockState>>,
    }

    #[derive(Debug, Default)]
    struct MockState {
        elapsed: Duration,
        sleeps: Vec<Duration>,
    }

    impl MockClock {
        pub fn new() -> Self {
            Self::starting_at(SystemTime::now())
        }

        /// Mock clock whose wall time starts at `base_system_time`.
        pub fn starting_at(base_system_time: SystemTime) -> Self {
            Self {
                start: Instant::now(),
                base_system_time,
                state: Arc::new(Mutex::new(MockState::default())),
            }
        }

        /// Advance the clock without recording a sleep.
        pub fn advance(&self, duration: Duration) {
            // Test utility: panic on poisoned mutex to fail tests early
            self.state.lock().expect("mutex poisoned").elapsed += duration;
        }

        #[must_use]
        pub fn elapsed(&self) -> Duration {
            self.state.lock().expect("mutex poisoned").elapsed
        }

        /// Every duration passed to [`Clock::sleep`], in call order.
        #[must_use]
        pub fn sleeps(&self) -> Vec<Duration> {
            self.state.lock().expect("mutex poisoned").sleeps.clone()
        }

        #[must_use]
        pub fn total_slept(&self) -> Duration {
            self.state.lock().expect("mutex poisoned").sleeps.iter().sum()
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            self.start + self.elapsed()
        }

        fn system_time(&self) -> SystemTime {
            self.base_system_time + self.elapsed()
        }

        fn sleep(&self, duration: Duration) {
            let mut state = self.state.lock().expect("mutex poisoned");
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
    }
}
