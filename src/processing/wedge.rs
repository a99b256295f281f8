//! Pie-wedge geometry for the time mask.
//!
//! Angles are in degrees, measured clockwise on screen (y grows downward)
//! from 12 o'clock. A wedge is tested exactly per point, so there is no
//! polygon faceting and no special case when the span wraps past 12 o'clock.

use std::f32::consts::FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wedge {
    pub center: (f32, f32),
    pub radius: f32,
    pub start_deg: f32,
    pub sweep_deg: f32,
}

impl Wedge {
    /// Mask hiding the part of the disk that has not elapsed yet.
    ///
    /// The revealed span `[0°, 360°·f)` grows clockwise from 12 o'clock; the
    /// mask covers the remaining `360°·(1 − f)`.
    pub fn remaining_mask(center: (f32, f32), radius: f32, fraction_complete: f64) -> Self {
        let f = fraction_complete.clamp(0.0, 1.0);
        let revealed = (360.0 * f) as f32;
        Self {
            center,
            radius,
            start_deg: revealed,
            sweep_deg: 360.0 - revealed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sweep_deg <= 0.0 || self.radius <= 0.0
    }

    pub fn is_full_circle(&self) -> bool {
        self.sweep_deg >= 360.0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.is_empty() {
            return false;
        }
        let dx = x - self.center.0;
        let dy = y - self.center.1;
        if dx * dx + dy * dy > self.radius * self.radius {
            return false;
        }
        if self.is_full_circle() {
            return true;
        }
        let rel = (clockwise_angle_deg(dx, dy) - self.start_deg).rem_euclid(360.0);
        rel < self.sweep_deg
    }
}

/// Clockwise angle from 12 o'clock of the offset `(dx, dy)`, in `[0, 360)`.
pub fn clockwise_angle_deg(dx: f32, dy: f32) -> f32 {
    dx.atan2(-dy).to_degrees().rem_euclid(360.0)
}

/// Point at `angle_deg` (clockwise from 12 o'clock) on a circle around `center`.
pub fn point_at(center: (f32, f32), radius: f32, angle_deg: f32) -> (f32, f32) {
    let theta = angle_deg.to_radians() - FRAC_PI_2;
    (
        center.0 + radius * theta.cos(),
        center.1 + radius * theta.sin(),
    )
}
