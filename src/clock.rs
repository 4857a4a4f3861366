use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source feeding the session clock and timer
pub trait Clock: Send + Sync + 'static {
    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;
}

/// Wall-clock backed source used by the game binary
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    started: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Hand-driven clock for tests. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, to: Duration) {
        self.millis.store(to.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Turns monotonic readings into whole-second timer ticks.
/// Sub-second remainders carry over to the next reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SecondCounter {
    anchor: Duration,
}

impl SecondCounter {
    pub fn new(now: Duration) -> Self {
        Self { anchor: now }
    }

    /// Whole seconds elapsed since the previous whole second was taken
    pub fn take(&mut self, now: Duration) -> u32 {
        let secs = now.saturating_sub(self.anchor).as_secs();
        self.anchor += Duration::from_secs(secs);
        secs as u32
    }

    /// Forget elapsed time, e.g. when resuming from pause
    pub fn reset(&mut self, now: Duration) {
        self.anchor = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now(), Duration::from_millis(1500));

        let shared = clock.clone();
        shared.set(Duration::from_secs(10));
        assert_eq!(clock.now(), Duration::from_secs(10));
    }

    #[test]
    fn monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.now() > a);
    }

    #[test]
    fn second_counter_carries_remainder() {
        let mut counter = SecondCounter::new(Duration::ZERO);

        assert_eq!(counter.take(Duration::from_millis(900)), 0);
        assert_eq!(counter.take(Duration::from_millis(1100)), 1);
        assert_eq!(counter.take(Duration::from_millis(1900)), 0);
        assert_eq!(counter.take(Duration::from_millis(2000)), 1);
        assert_eq!(counter.take(Duration::from_millis(5500)), 3);
    }

    #[test]
    fn second_counter_reset_drops_elapsed_time() {
        let mut counter = SecondCounter::new(Duration::ZERO);
        counter.reset(Duration::from_secs(30));

        assert_eq!(counter.take(Duration::from_millis(30_500)), 0);
        assert_eq!(counter.take(Duration::from_secs(31)), 1);
    }

    #[test]
    fn second_counter_ignores_time_going_backwards() {
        let mut counter = SecondCounter::new(Duration::from_secs(5));
        assert_eq!(counter.take(Duration::from_secs(2)), 0);
    }
}
