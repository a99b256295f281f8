use image::{Rgba, RgbaImage};

use crate::processing::draw::{blend, draw_line, draw_ring, fill, fill_rect};
use crate::processing::labels::{format_clock, tick_labels};
use crate::processing::layout::centered_at;
use crate::processing::text::TextRenderer;
use crate::processing::wedge::{Wedge, point_at};
use crate::timing::TimerConfig;
use crate::timing::slices::{SliceCalculator, TimerSnapshot};

/// Sizes and colours of the logical canvas, in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasStyle {
    pub canvas_size: u32,
    pub pizza_radius: u32,
    pub line_width: f32,
    pub separator_dash_length: f32,
    pub separator_gap_length: f32,
    pub separator_line_width: f32,
    pub clock_padding: f32,
    pub clock_background_color: [u8; 4],
    pub background_color: [u8; 4],
    pub foreground_color: [u8; 4],
    pub mask_color: [u8; 4],
}

impl Default for CanvasStyle {
    fn default() -> Self {
        Self {
            canvas_size: 800,
            pizza_radius: 300,
            line_width: 5.0,
            separator_dash_length: 5.0,
            separator_gap_length: 3.0,
            separator_line_width: 2.0,
            clock_padding: 15.0,
            clock_background_color: [0, 0, 0, 180],
            background_color: [0, 0, 0, 255],
            foreground_color: [255, 255, 255, 255],
            mask_color: [0, 0, 0, 255],
        }
    }
}

impl CanvasStyle {
    pub fn pizza_diameter(&self) -> u32 {
        self.pizza_radius * 2
    }

    #[allow(clippy::cast_precision_loss)]
    fn center(&self) -> (f32, f32) {
        let c = (self.canvas_size / 2) as f32;
        (c, c)
    }
}

/// Owns the fixed-size logical canvas and redraws it from a [`TimerSnapshot`].
///
/// Layers, bottom to top: background, pizza with the remaining-time wedge
/// masked out, section lines and outline, tick labels, the dashed 12 o'clock
/// separator and the remaining-time clock. Text layers are skipped when no
/// font is available.
#[derive(Debug)]
pub struct CanvasCompositor {
    style: CanvasStyle,
    canvas: RgbaImage,
    section_angles: Vec<f32>,
    labels: Vec<String>,
    text: Option<TextRenderer>,
    digit_radius: f32,
}

impl CanvasCompositor {
    pub fn new(style: CanvasStyle, cfg: &TimerConfig, text: Option<TextRenderer>) -> Self {
        let tick_count = SliceCalculator::new(cfg).total_slices();
        let step_deg = (cfg.slice_duration() / cfg.total_duration() * 360.0) as f32;
        let section_angles = (0..tick_count).map(|i| i as f32 * step_deg).collect();
        let labels = tick_labels(
            cfg.total_duration() / 3600.0,
            cfg.slice_duration() / 3600.0,
            tick_count,
        );
        let digit_radius = text.as_ref().map_or(0.0, TextRenderer::digit_radius);
        let canvas = RgbaImage::from_pixel(
            style.canvas_size,
            style.canvas_size,
            Rgba(style.background_color),
        );
        Self {
            style,
            canvas,
            section_angles,
            labels,
            text,
            digit_radius,
        }
    }

    pub fn style(&self) -> &CanvasStyle {
        &self.style
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Redraw the whole canvas for `snapshot` with `pizza` as the base image.
    pub fn compose(&mut self, snapshot: &TimerSnapshot, pizza: &RgbaImage) -> &RgbaImage {
        fill(&mut self.canvas, self.style.background_color);
        self.draw_pizza(snapshot.fraction_complete, pizza);
        self.draw_sections();
        if let Some(text) = self.text.take() {
            self.draw_tick_labels(&text);
            self.draw_separator();
            self.draw_clock(&text, snapshot.remaining);
            self.text = Some(text);
        }
        &self.canvas
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    fn draw_pizza(&mut self, fraction_complete: f64, pizza: &RgbaImage) {
        let center = self.style.center();
        let radius = self.style.pizza_radius as f32;
        let mask = Wedge::remaining_mask(center, radius, fraction_complete);
        let left = center.0 as i64 - i64::from(pizza.width() / 2);
        let top = center.1 as i64 - i64::from(pizza.height() / 2);
        let size = i64::from(self.style.canvas_size);
        let mask_color = Rgba(self.style.mask_color);

        for (px, py, src) in pizza.enumerate_pixels() {
            let cx = left + i64::from(px);
            let cy = top + i64::from(py);
            if cx < 0 || cy < 0 || cx >= size || cy >= size {
                continue;
            }
            let (fx, fy) = (cx as f32 + 0.5, cy as f32 + 0.5);
            let (dx, dy) = (fx - center.0, fy - center.1);
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let dst = self.canvas.get_pixel_mut(cx as u32, cy as u32);
            if mask.contains(fx, fy) {
                *dst = mask_color;
            } else {
                blend(dst, src.0, 1.0);
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_sections(&mut self) {
        let center = self.style.center();
        let width = self.style.line_width;
        let color = self.style.foreground_color;
        let length = self.style.pizza_radius as f32 - (width / 2.0).floor();
        for &angle in &self.section_angles {
            let end = point_at(center, length, angle);
            draw_line(&mut self.canvas, center, end, width, color);
        }
        draw_ring(
            &mut self.canvas,
            center,
            self.style.pizza_radius as f32,
            width,
            color,
        );
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_tick_labels(&mut self, text: &TextRenderer) {
        let center = self.style.center();
        let color = self.style.foreground_color;
        let pizza_radius = self.style.pizza_radius as f32;
        let radius = pizza_radius + 1.5 * self.digit_radius;

        let inner = self.labels.len().saturating_sub(1);
        for (angle, label) in self
            .section_angles
            .iter()
            .skip(1)
            .zip(self.labels.iter().take(inner).skip(1))
        {
            let at = point_at(center, radius, *angle);
            text.draw_centered(&mut self.canvas, label, at, color);
        }

        // "0" and the total share 12 o'clock, one on each side of the separator.
        let y = center.1 - radius;
        let ends = [(self.labels.first(), 1.0), (self.labels.last(), -1.0)];
        for (label, side) in ends {
            let Some(label) = label else { continue };
            let (w, _) = text.measure(label);
            let x = center.0 + side * (0.5 * w + 0.05 * pizza_radius);
            text.draw_centered(&mut self.canvas, label, (x, y), color);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_separator(&mut self) {
        let dash = self.style.separator_dash_length;
        let gap = self.style.separator_gap_length;
        if dash <= 0.0 {
            return;
        }
        let center = self.style.center();
        let pizza_radius = self.style.pizza_radius as f32;
        let top = (center.1 - pizza_radius - 2.3 * self.digit_radius).max(0.0);
        // At least a pixel per dash so tiny lengths still terminate.
        let advance = (dash + gap).max(1.0);
        let mut y = center.1 - pizza_radius;
        while y > top {
            let y2 = (y - dash).max(top);
            draw_line(
                &mut self.canvas,
                (center.0, y),
                (center.0, y2),
                self.style.separator_line_width,
                self.style.foreground_color,
            );
            y -= advance;
        }
    }

    fn draw_clock(&mut self, text: &TextRenderer, remaining: f64) {
        let label = format_clock(remaining);
        let center = self.style.center();
        let pad = self.style.clock_padding;
        let (w, h) = text.measure(&label);
        let (left, top) = centered_at(center.0, center.1, w, h);
        fill_rect(
            &mut self.canvas,
            left - pad,
            top - pad,
            w + 2.0 * pad,
            h + 2.0 * pad,
            self.style.clock_background_color,
        );
        text.draw_centered(&mut self.canvas, &label, center, self.style.foreground_color);
    }
}
