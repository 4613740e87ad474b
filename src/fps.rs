//! Frame-rate sampling.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Width of the sampling window.
pub const WINDOW: Duration = Duration::from_millis(1000);

/// Counts ticks over a trailing one-second window.
///
/// The count approximates ticks per second; no smoothing is applied beyond the window itself.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    samples: VecDeque<Instant>,
}

impl FrameCounter {
    pub fn new() -> FrameCounter {
        FrameCounter::default()
    }

    /// Records a tick at `now` and evicts every sample more than one second older than it.
    ///
    /// Returns the number of samples in the window.
    pub fn tick(&mut self, now: Instant) -> usize {
        // a clock that went backwards must not break the FIFO ordering
        let now = match self.samples.back() {
            Some(last) if *last > now => *last,
            _ => now,
        };
        self.samples.push_back(now);
        while let Some(front) = self.samples.front() {
            if now.duration_since(*front) > WINDOW {
                self.samples.pop_front();
            } else {
                break;
            }
        }
        self.samples.len()
    }

    /// Number of samples retained at the last tick.
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> impl Iterator<Item = Instant> + '_ {
        self.samples.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn counts_ticks_in_the_trailing_second() {
        let start = Instant::now();
        let mut counter = FrameCounter::new();
        for ms in (0..=1000).step_by(100) {
            counter.tick(start + Duration::from_millis(ms));
        }
        // 0, 100, ..., 1000 are all within 1000ms of the last tick
        assert_eq!(counter.count(), 11);

        assert_eq!(counter.tick(start + Duration::from_millis(1001)), 11);
        assert_eq!(counter.tick(start + Duration::from_millis(3000)), 1);
    }

    #[test]
    fn backwards_clock_keeps_order() {
        let start = Instant::now() + Duration::from_secs(5);
        let mut counter = FrameCounter::new();
        counter.tick(start);
        counter.tick(start - Duration::from_millis(10));
        let samples: Vec<_> = counter.samples().collect();
        assert!(samples.windows(2).all(|w| w[0] <= w[1]));
    }

    proptest! {
        #[test]
        fn retained_samples_stay_within_window(
            gaps in proptest::collection::vec(0u64..700, 1..200),
        ) {
            let mut now = Instant::now();
            let mut counter = FrameCounter::new();
            for gap in gaps {
                now += Duration::from_millis(gap);
                let count = counter.tick(now);
                let samples: Vec<_> = counter.samples().collect();
                prop_assert_eq!(count, samples.len());
                prop_assert!(samples.iter().all(|t| now.duration_since(*t) <= WINDOW));
                prop_assert!(samples.windows(2).all(|w| w[0] <= w[1]));
            }
        }
    }
}
