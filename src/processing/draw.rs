//! CPU drawing primitives on straight-alpha RGBA canvases.

use image::{Rgba, RgbaImage};

/// Source-over blend of a straight-alpha `src` colour onto `dst`, scaled by `coverage`.
pub fn blend(dst: &mut Rgba<u8>, src: [u8; 4], coverage: f32) {
    let sa = (f32::from(src[3]) / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    if sa >= 1.0 {
        *dst = Rgba(src);
        return;
    }
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= f32::EPSILON {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for c in 0..3 {
        let s = f32::from(src[c]);
        let d = f32::from(dst[c]);
        let v = (s * sa + d * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

pub fn fill(canvas: &mut RgbaImage, color: [u8; 4]) {
    for px in canvas.pixels_mut() {
        *px = Rgba(color);
    }
}

/// Blend a filled axis-aligned rectangle; the rectangle is clipped to the canvas.
pub fn fill_rect(canvas: &mut RgbaImage, x: f32, y: f32, w: f32, h: f32, color: [u8; 4]) {
    let Some((x0, y0, x1, y1)) = clip(canvas, x, y, x + w, y + h) else {
        return;
    };
    for py in y0..y1 {
        for px in x0..x1 {
            blend(canvas.get_pixel_mut(px, py), color, 1.0);
        }
    }
}

/// Thick line segment with round caps.
pub fn draw_line(
    canvas: &mut RgbaImage,
    from: (f32, f32),
    to: (f32, f32),
    width: f32,
    color: [u8; 4],
) {
    let half = (width / 2.0).max(0.5);
    let Some((x0, y0, x1, y1)) = clip(
        canvas,
        from.0.min(to.0) - half - 1.0,
        from.1.min(to.1) - half - 1.0,
        from.0.max(to.0) + half + 1.0,
        from.1.max(to.1) + half + 1.0,
    ) else {
        return;
    };
    let (vx, vy) = (to.0 - from.0, to.1 - from.1);
    let len_sq = vx * vx + vy * vy;
    for py in y0..y1 {
        for px in x0..x1 {
            let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
            let t = if len_sq > 0.0 {
                (((cx - from.0) * vx + (cy - from.1) * vy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (qx, qy) = (from.0 + t * vx, from.1 + t * vy);
            let dist = ((cx - qx).powi(2) + (cy - qy).powi(2)).sqrt();
            let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend(canvas.get_pixel_mut(px, py), color, coverage);
            }
        }
    }
}

/// Circle outline whose outer edge lies on `radius`, drawn `width` pixels inward.
pub fn draw_ring(
    canvas: &mut RgbaImage,
    center: (f32, f32),
    radius: f32,
    width: f32,
    color: [u8; 4],
) {
    let inner = (radius - width).max(0.0);
    let Some((x0, y0, x1, y1)) = clip(
        canvas,
        center.0 - radius - 1.0,
        center.1 - radius - 1.0,
        center.0 + radius + 1.0,
        center.1 + radius + 1.0,
    ) else {
        return;
    };
    for py in y0..y1 {
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - center.0;
            let dy = py as f32 + 0.5 - center.1;
            let dist = (dx * dx + dy * dy).sqrt();
            let coverage = (radius - dist + 0.5).min(dist - inner + 0.5).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend(canvas.get_pixel_mut(px, py), color, coverage);
            }
        }
    }
}

fn clip(canvas: &RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let x0 = x0.floor().clamp(0.0, w) as u32;
    let y0 = y0.floor().clamp(0.0, h) as u32;
    let x1 = x1.ceil().clamp(0.0, w) as u32;
    let y1 = y1.ceil().clamp(0.0, h) as u32;
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}
