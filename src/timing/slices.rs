use super::TimerConfig;

const STEP_TOLERANCE: f64 = 1e-9;

/// Progress of the exam at one instant, as consumed by the policy and the compositor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerSnapshot {
    pub elapsed: f64,
    pub remaining: f64,
    pub fraction_complete: f64,
    pub slice_index: u64,
    pub change_index: u64,
}

/// Pure mapping from elapsed seconds to slice/fraction values for one [`TimerConfig`].
#[derive(Debug, Clone, Copy)]
pub struct SliceCalculator {
    total: f64,
    slice: f64,
    change_interval: f64,
    total_slices: u64,
    total_changes: u64,
}

impl SliceCalculator {
    pub fn new(cfg: &TimerConfig) -> Self {
        let total = cfg.total_duration();
        let slice = cfg.slice_duration();
        let change_interval = cfg.image_change_interval();
        Self {
            total,
            slice,
            change_interval,
            total_slices: step_count(total, slice),
            total_changes: step_count(total, change_interval),
        }
    }

    /// `ceil(total / slice)`; also the number of dial sections.
    pub fn total_slices(&self) -> u64 {
        self.total_slices
    }

    pub fn fraction_complete(&self, elapsed: f64) -> f64 {
        (elapsed / self.total).clamp(0.0, 1.0)
    }

    pub fn remaining(&self, elapsed: f64) -> f64 {
        (self.total - elapsed).max(0.0)
    }

    pub fn current_slice_index(&self, elapsed: f64) -> u64 {
        steps_elapsed(elapsed, self.slice).min(self.total_slices)
    }

    /// Number of image-change boundaries crossed; frozen once the exam is over.
    pub fn change_index(&self, elapsed: f64) -> u64 {
        steps_elapsed(elapsed, self.change_interval).min(self.total_changes)
    }

    pub fn snapshot(&self, elapsed: f64) -> TimerSnapshot {
        let elapsed = elapsed.max(0.0);
        TimerSnapshot {
            elapsed,
            remaining: self.remaining(elapsed),
            fraction_complete: self.fraction_complete(elapsed),
            slice_index: self.current_slice_index(elapsed),
            change_index: self.change_index(elapsed),
        }
    }
}

pub(super) fn step_count(total: f64, step: f64) -> u64 {
    let q = total / step;
    let nearest = q.round();
    let count = if (q - nearest).abs() < STEP_TOLERANCE {
        nearest
    } else {
        q.ceil()
    };
    (count as u64).max(1)
}

fn steps_elapsed(elapsed: f64, step: f64) -> u64 {
    if elapsed <= 0.0 {
        return 0;
    }
    let q = elapsed / step;
    let nearest = q.round();
    if (q - nearest).abs() < STEP_TOLERANCE {
        nearest as u64
    } else {
        q.floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn calc(total: f64, slice: f64, interval: Option<f64>) -> SliceCalculator {
        let cfg = TimerConfig::builder(total, slice, vec![PathBuf::from("a.png")])
            .image_change_interval(interval)
            .build()
            .unwrap();
        SliceCalculator::new(&cfg)
    }

    #[test]
    fn fraction_is_clamped_and_monotonic() {
        let c = calc(3600.0, 600.0, None);
        assert_eq!(c.fraction_complete(0.0), 0.0);
        assert_eq!(c.fraction_complete(3600.0), 1.0);
        assert_eq!(c.fraction_complete(7200.0), 1.0);
        let mut last = 0.0;
        for step in 0..=360 {
            let f = c.fraction_complete(step as f64 * 10.0);
            assert!((0.0..=1.0).contains(&f));
            assert!(f >= last);
            last = f;
        }
    }

    #[test]
    fn slice_index_hits_final_slice_at_total() {
        let c = calc(3600.0, 600.0, None);
        assert_eq!(c.total_slices(), 6);
        assert_eq!(c.current_slice_index(0.0), 0);
        assert_eq!(c.current_slice_index(599.9), 0);
        assert_eq!(c.current_slice_index(600.0), 1);
        assert_eq!(c.current_slice_index(3600.0), 6);
        assert_eq!(c.current_slice_index(10_000.0), 6);
    }

    #[test]
    fn uneven_division_rounds_slice_count_up() {
        let c = calc(3500.0, 600.0, None);
        assert_eq!(c.total_slices(), 6);
        let mut last = 0;
        for step in 0..=400 {
            let idx = c.current_slice_index(step as f64 * 10.0);
            assert!(idx >= last);
            assert!(idx <= c.total_slices());
            last = idx;
        }
    }

    #[test]
    fn fractional_hours_divide_exactly() {
        let c = calc(3.5 * 3600.0, 0.5 * 3600.0, None);
        assert_eq!(c.total_slices(), 7);
        let c = calc(0.3, 0.1, None);
        assert_eq!(c.total_slices(), 3);
        assert_eq!(c.current_slice_index(0.1 + 0.2), 3);
    }

    #[test]
    fn change_index_uses_its_own_interval() {
        let c = calc(3600.0, 600.0, Some(900.0));
        assert_eq!(c.change_index(899.0), 0);
        assert_eq!(c.change_index(900.0), 1);
        assert_eq!(c.change_index(3600.0), 4);
        assert_eq!(c.change_index(9000.0), 4);
    }

    #[test]
    fn snapshot_reports_remaining() {
        let c = calc(3600.0, 600.0, None);
        let snap = c.snapshot(600.0);
        assert_eq!(snap.remaining, 3000.0);
        assert!((snap.fraction_complete - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(snap.slice_index, 1);
        assert_eq!(snap.change_index, 1);
        assert_eq!(c.snapshot(4000.0).remaining, 0.0);
    }
}
