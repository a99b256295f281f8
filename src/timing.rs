//! Timer configuration and the time-to-progress mapping.
//!
//! [`TimerConfig`] is the validated, immutable input of the render core. It is
//! produced once (normally from the YAML configuration) and never mutated.

pub mod clock;
pub mod slices;

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Most dial sections a timer may have; each is redrawn every frame.
pub const MAX_SECTIONS: u64 = 360;

/// How the active image advances at each image-change boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePolicy {
    /// Step through the image list in order, wrapping at the end.
    Cycle,
    /// Draw uniformly among the images that were not shown recently.
    Random,
}

impl fmt::Display for ChangePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle => f.write_str("cycle"),
            Self::Random => f.write_str("random"),
        }
    }
}

/// Which image is active before the first change boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialImage {
    Index(usize),
    /// Picked by the image policy's generator at construction.
    Random,
}

impl Default for InitialImage {
    fn default() -> Self {
        Self::Index(0)
    }
}

#[derive(Debug, Clone)]
pub struct TimerConfig {
    total_duration: f64,
    slice_duration: f64,
    start_remaining: f64,
    image_list: Vec<PathBuf>,
    initial_image: InitialImage,
    image_change_interval: f64,
    image_change_policy: ChangePolicy,
    seed: Option<u64>,
}

impl TimerConfig {
    /// Start a builder with the three required fields. All durations are in seconds.
    pub fn builder(
        total_duration: f64,
        slice_duration: f64,
        image_list: Vec<PathBuf>,
    ) -> TimerConfigBuilder {
        TimerConfigBuilder {
            total_duration,
            slice_duration,
            image_list,
            start_remaining: None,
            initial_image: InitialImage::default(),
            image_change_interval: None,
            image_change_policy: ChangePolicy::Cycle,
            seed: None,
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn slice_duration(&self) -> f64 {
        self.slice_duration
    }

    pub fn start_remaining(&self) -> f64 {
        self.start_remaining
    }

    /// Seconds that have already elapsed when the clock starts.
    pub fn start_offset(&self) -> f64 {
        self.total_duration - self.start_remaining
    }

    pub fn image_list(&self) -> &[PathBuf] {
        &self.image_list
    }

    pub fn initial_image(&self) -> InitialImage {
        self.initial_image
    }

    pub fn image_change_interval(&self) -> f64 {
        self.image_change_interval
    }

    pub fn image_change_policy(&self) -> ChangePolicy {
        self.image_change_policy
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Collects the optional fields of [`TimerConfig`]; defaults are resolved in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct TimerConfigBuilder {
    total_duration: f64,
    slice_duration: f64,
    image_list: Vec<PathBuf>,
    start_remaining: Option<f64>,
    initial_image: InitialImage,
    image_change_interval: Option<f64>,
    image_change_policy: ChangePolicy,
    seed: Option<u64>,
}

impl TimerConfigBuilder {
    pub fn start_remaining(mut self, seconds: Option<f64>) -> Self {
        self.start_remaining = seconds;
        self
    }

    pub fn initial_image(mut self, initial: InitialImage) -> Self {
        self.initial_image = initial;
        self
    }

    pub fn image_change_interval(mut self, seconds: Option<f64>) -> Self {
        self.image_change_interval = seconds;
        self
    }

    pub fn image_change_policy(mut self, policy: ChangePolicy) -> Self {
        self.image_change_policy = policy;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<TimerConfig> {
        let total = self.total_duration;
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::config(format!(
                "total duration must be positive, got {total}s"
            )));
        }
        let slice = self.slice_duration;
        if !slice.is_finite() || slice <= 0.0 || slice > total {
            return Err(Error::config(format!(
                "slice duration must be in (0, {total}]s, got {slice}s"
            )));
        }
        let sections = slices::step_count(total, slice);
        if sections > MAX_SECTIONS {
            return Err(Error::config(format!(
                "{total}s / {slice}s gives {sections} dial sections, at most {MAX_SECTIONS} allowed"
            )));
        }
        let interval = self.image_change_interval.unwrap_or(slice);
        if !interval.is_finite() || interval <= 0.0 || interval > total {
            return Err(Error::config(format!(
                "image change interval must be in (0, {total}]s, got {interval}s"
            )));
        }
        let start_remaining = self.start_remaining.unwrap_or(total);
        if !start_remaining.is_finite() || !(0.0..=total).contains(&start_remaining) {
            return Err(Error::config(format!(
                "start remaining must be in [0, {total}]s, got {start_remaining}s"
            )));
        }
        if self.image_list.is_empty() {
            return Err(Error::config("image list must not be empty"));
        }
        if let InitialImage::Index(index) = self.initial_image {
            if index >= self.image_list.len() {
                return Err(Error::config(format!(
                    "initial image index {index} is out of range for {} images",
                    self.image_list.len()
                )));
            }
        }

        Ok(TimerConfig {
            total_duration: total,
            slice_duration: slice,
            start_remaining,
            image_list: self.image_list,
            initial_image: self.initial_image,
            image_change_interval: interval,
            image_change_policy: self.image_change_policy,
            seed: self.seed,
        })
    }
}
