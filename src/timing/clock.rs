use std::time::{Duration, Instant};

/// Monotonic exam clock.
///
/// `offset` is the amount of exam time that had already passed when the
/// clock was started, so a resumed timer reports a partially elapsed exam.
#[derive(Debug, Clone, Copy)]
pub struct ClockSource {
    started: Instant,
    offset: Duration,
}

impl ClockSource {
    pub fn start(offset_secs: f64) -> Self {
        Self::start_at(Instant::now(), offset_secs)
    }

    pub fn start_at(now: Instant, offset_secs: f64) -> Self {
        let offset = Duration::try_from_secs_f64(offset_secs.max(0.0)).unwrap_or_default();
        Self {
            started: now,
            offset,
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed_at(Instant::now())
    }

    /// Seconds since start plus the offset; instants before the start count as zero.
    pub fn elapsed_at(&self, now: Instant) -> f64 {
        (now.saturating_duration_since(self.started) + self.offset).as_secs_f64()
    }

    pub fn remaining(&self, total_secs: f64) -> f64 {
        self.remaining_at(Instant::now(), total_secs)
    }

    pub fn remaining_at(&self, now: Instant, total_secs: f64) -> f64 {
        (total_secs - self.elapsed_at(now)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_starts_at_offset() {
        let t0 = Instant::now();
        let clock = ClockSource::start_at(t0, 900.0);
        assert_eq!(clock.elapsed_at(t0), 900.0);
        assert_eq!(clock.elapsed_at(t0 + Duration::from_secs(100)), 1000.0);
    }

    #[test]
    fn elapsed_never_runs_backwards_past_start() {
        let t0 = Instant::now() + Duration::from_secs(10);
        let clock = ClockSource::start_at(t0, 0.0);
        assert_eq!(clock.elapsed_at(t0 - Duration::from_secs(5)), 0.0);
    }

    #[test]
    fn remaining_clamps_at_zero() {
        let t0 = Instant::now();
        let clock = ClockSource::start_at(t0, 0.0);
        assert_eq!(clock.remaining_at(t0 + Duration::from_secs(30), 60.0), 30.0);
        assert_eq!(clock.remaining_at(t0 + Duration::from_secs(90), 60.0), 0.0);
    }

    #[test]
    fn live_clock_is_monotonic() {
        let clock = ClockSource::start(0.0);
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(b >= a);
        assert!(a >= 0.0);
    }
}
