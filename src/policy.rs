use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{Error, Result};
use crate::timing::slices::SliceCalculator;
use crate::timing::{ChangePolicy, InitialImage, TimerConfig};

/// Upper bound on how many previously shown images random mode avoids.
const RECENT_HISTORY_LIMIT: usize = 3;

/// Chooses which image is active as image-change boundaries are crossed.
///
/// Rules:
/// - `update` with an unchanged change index is a no-op, so it is safe every frame.
/// - A new change index changes the image once, however many boundaries were skipped.
/// - Random mode never repeats the active image and, with more than three images,
///   also avoids the last few images shown.
#[derive(Debug)]
pub struct ImagePolicy {
    mode: ChangePolicy,
    len: usize,
    active_index: usize,
    last_change_index: u64,
    recent_history: VecDeque<usize>,
    rng: StdRng,
}

impl ImagePolicy {
    /// Build the policy for `cfg`, seeding from the config or the OS.
    pub fn from_config(cfg: &TimerConfig, initial_change_index: u64) -> Result<Self> {
        let rng = match cfg.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(
            cfg.image_change_policy(),
            cfg.image_list().len(),
            cfg.initial_image(),
            initial_change_index,
            rng,
        )
    }

    pub fn new(
        mode: ChangePolicy,
        len: usize,
        initial: InitialImage,
        initial_change_index: u64,
        mut rng: StdRng,
    ) -> Result<Self> {
        if len == 0 {
            return Err(Error::config("image policy requires at least one image"));
        }
        let active_index = match initial {
            InitialImage::Index(index) if index < len => index,
            InitialImage::Index(index) => {
                return Err(Error::config(format!(
                    "initial image index {index} is out of range for {len} images"
                )));
            }
            InitialImage::Random => rng.random_range(0..len),
        };
        Ok(Self {
            mode,
            len,
            active_index,
            last_change_index: initial_change_index,
            recent_history: VecDeque::with_capacity(RECENT_HISTORY_LIMIT),
            rng,
        })
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn last_change_index(&self) -> u64 {
        self.last_change_index
    }

    /// Observe the current change index; returns `true` when the active image changed.
    pub fn update(&mut self, current_change_index: u64) -> bool {
        if current_change_index == self.last_change_index {
            return false;
        }
        let skipped = current_change_index.abs_diff(self.last_change_index);
        self.last_change_index = current_change_index;

        let previous = self.active_index;
        let next = match self.mode {
            ChangePolicy::Cycle => (previous + 1) % self.len,
            ChangePolicy::Random => self.draw_random(),
        };
        if next == previous {
            return false;
        }
        self.remember(previous);
        self.active_index = next;
        debug!(
            from = previous,
            to = next,
            change_index = current_change_index,
            skipped,
            policy = %self.mode,
            "active image changed"
        );
        true
    }

    fn draw_random(&mut self) -> usize {
        if self.len == 1 {
            return self.active_index;
        }
        let active = self.active_index;
        let avoid_recent = self.len > 3;
        let history = &self.recent_history;
        (0..self.len)
            .filter(|&idx| idx != active && !(avoid_recent && history.contains(&idx)))
            .choose(&mut self.rng)
            .unwrap_or(active)
    }

    fn remember(&mut self, index: usize) {
        // Leave at least two candidates besides the active image.
        let limit = RECENT_HISTORY_LIMIT.min(self.len.saturating_sub(3));
        if limit == 0 {
            self.recent_history.clear();
            return;
        }
        self.recent_history.retain(|&idx| idx != index);
        self.recent_history.push_back(index);
        while self.recent_history.len() > limit {
            self.recent_history.pop_front();
        }
    }
}

/// One row of a simulated image schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledChange {
    pub change_index: u64,
    pub elapsed: f64,
    pub fraction_complete: f64,
    pub image_index: usize,
}

/// Walk the timer forward without a clock: the starting image followed by up
/// to `boundaries` image changes, stopping early when the exam ends.
pub fn simulate_schedule(cfg: &TimerConfig, boundaries: usize) -> Result<Vec<ScheduledChange>> {
    let slices = SliceCalculator::new(cfg);
    let interval = cfg.image_change_interval();
    let start = cfg.start_offset();
    let mut change_index = slices.change_index(start);
    let mut policy = ImagePolicy::from_config(cfg, change_index)?;

    let mut plan = Vec::with_capacity(boundaries + 1);
    plan.push(ScheduledChange {
        change_index,
        elapsed: start,
        fraction_complete: slices.fraction_complete(start),
        image_index: policy.active_index(),
    });
    while plan.len() <= boundaries {
        #[allow(clippy::cast_precision_loss)]
        let elapsed = ((change_index + 1) as f64 * interval).min(cfg.total_duration());
        let next = slices.change_index(elapsed);
        if next <= change_index {
            break;
        }
        change_index = next;
        policy.update(next);
        plan.push(ScheduledChange {
            change_index,
            elapsed,
            fraction_complete: slices.fraction_complete(elapsed),
            image_index: policy.active_index(),
        });
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(mode: ChangePolicy, len: usize, initial: usize) -> ImagePolicy {
        ImagePolicy::new(
            mode,
            len,
            InitialImage::Index(initial),
            0,
            StdRng::seed_from_u64(7),
        )
        .unwrap()
    }

    #[test]
    fn repeated_index_is_idempotent() {
        let mut p = policy(ChangePolicy::Cycle, 3, 0);
        assert!(!p.update(0));
        assert!(p.update(1));
        assert_eq!(p.active_index(), 1);
        for _ in 0..10 {
            assert!(!p.update(1));
        }
        assert_eq!(p.active_index(), 1);
    }

    #[test]
    fn cycle_wraps_in_order() {
        let mut p = policy(ChangePolicy::Cycle, 3, 0);
        let seen: Vec<usize> = (1..=6)
            .map(|idx| {
                p.update(idx);
                p.active_index()
            })
            .collect();
        assert_eq!(seen, vec![1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn cycle_visits_each_image_once_per_round() {
        let mut p = policy(ChangePolicy::Cycle, 5, 2);
        let mut seen: Vec<usize> = (1..=5)
            .map(|idx| {
                p.update(idx);
                p.active_index()
            })
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn skipped_boundaries_advance_once() {
        let mut p = policy(ChangePolicy::Cycle, 4, 0);
        assert!(p.update(3));
        assert_eq!(p.active_index(), 1);
        assert_eq!(p.last_change_index(), 3);
    }

    #[test]
    fn random_never_repeats_consecutively() {
        for len in 2..6 {
            let mut p = policy(ChangePolicy::Random, len, 0);
            let mut last = p.active_index();
            for idx in 1..200 {
                assert!(p.update(idx));
                assert_ne!(p.active_index(), last);
                assert!(p.active_index() < len);
                last = p.active_index();
            }
        }
    }

    #[test]
    fn random_avoids_recent_history_with_many_images() {
        let mut p = policy(ChangePolicy::Random, 6, 0);
        let mut shown = vec![p.active_index()];
        for idx in 1..100 {
            p.update(idx);
            shown.push(p.active_index());
        }
        // The active image plus three remembered ones are excluded on each draw.
        for window in shown.windows(4) {
            let mut w = window.to_vec();
            w.sort_unstable();
            w.dedup();
            assert_eq!(w.len(), 4, "short-run repeat in {window:?}");
        }
    }

    #[test]
    fn random_successors_stay_random_for_small_lists() {
        for len in 3..=5 {
            let mut successors = vec![std::collections::BTreeSet::new(); len];
            for seed in 0..8 {
                let mut p = ImagePolicy::new(
                    ChangePolicy::Random,
                    len,
                    InitialImage::Index(0),
                    0,
                    StdRng::seed_from_u64(seed),
                )
                .unwrap();
                let mut last = p.active_index();
                for idx in 1..60 {
                    p.update(idx);
                    successors[last].insert(p.active_index());
                    last = p.active_index();
                }
            }
            for (index, next) in successors.iter().enumerate() {
                assert!(
                    next.len() > 1,
                    "len {len}: image {index} is always followed by {next:?}"
                );
            }
        }
    }

    #[test]
    fn random_with_single_image_is_noop() {
        let mut p = policy(ChangePolicy::Random, 1, 0);
        assert!(!p.update(1));
        assert_eq!(p.active_index(), 0);
        assert_eq!(p.last_change_index(), 1);
    }

    #[test]
    fn seeded_draws_are_deterministic() {
        let run = || {
            let mut p = policy(ChangePolicy::Random, 8, 0);
            (1..20)
                .map(|idx| {
                    p.update(idx);
                    p.active_index()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn random_initial_image_is_in_range() {
        let p = ImagePolicy::new(
            ChangePolicy::Cycle,
            4,
            InitialImage::Random,
            0,
            StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert!(p.active_index() < 4);
    }

    #[test]
    fn empty_list_cannot_construct() {
        let err = ImagePolicy::new(
            ChangePolicy::Cycle,
            0,
            InitialImage::Index(0),
            0,
            StdRng::seed_from_u64(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn resumed_policy_does_not_replay_changes() {
        let mut p = ImagePolicy::new(
            ChangePolicy::Cycle,
            3,
            InitialImage::Index(0),
            4,
            StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert!(!p.update(4));
        assert!(p.update(5));
        assert_eq!(p.active_index(), 1);
    }

    #[test]
    fn schedule_stops_at_end_of_exam() {
        let images = ["a.png", "b.png", "c.png"].map(std::path::PathBuf::from).to_vec();
        let cfg = TimerConfig::builder(3600.0, 600.0, images)
            .image_change_policy(ChangePolicy::Cycle)
            .build()
            .unwrap();
        let plan = simulate_schedule(&cfg, 50).unwrap();
        assert_eq!(plan.len(), 7);
        let order: Vec<usize> = plan.iter().map(|c| c.image_index).collect();
        assert_eq!(order, vec![0, 1, 2, 0, 1, 2, 0]);
        assert!((plan[1].fraction_complete - 1.0 / 6.0).abs() < 1e-9);
        assert!((plan[6].elapsed - 3600.0).abs() < 1e-9);
    }

    #[test]
    fn schedule_respects_boundary_count_and_resume_point() {
        let images = ["a.png", "b.png"].map(std::path::PathBuf::from).to_vec();
        let cfg = TimerConfig::builder(3600.0, 600.0, images)
            .image_change_policy(ChangePolicy::Cycle)
            .start_remaining(Some(1800.0))
            .build()
            .unwrap();
        let plan = simulate_schedule(&cfg, 2).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].change_index, 3);
        assert!((plan[0].elapsed - 1800.0).abs() < 1e-9);
        assert_eq!(plan[1].change_index, 4);
    }
}
