//! Time source for bounded waits

use std::time::{Duration, Instant};

/// Monotonic millisecond clock used for every wait in the engine.
///
/// Tests substitute a clock that advances on each read, so timeouts elapse
/// deterministically without real time passing.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin. Must never go backwards.
    fn now_ms(&mut self) -> u64;

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u64);
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_ms(&mut self) -> u64 {
        (**self).now_ms()
    }

    fn delay_ms(&mut self, ms: u64) {
        (**self).delay_ms(ms)
    }
}

/// Clock backed by `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&mut self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let mut clock = SystemClock::new();
        let a = clock.now_ms();
        clock.delay_ms(2);
        let b = clock.now_ms();
        assert!(b >= a + 2);
    }
}
