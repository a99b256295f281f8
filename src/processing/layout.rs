/// Largest centred square inside a `src_w × src_h` image: `(x, y, side)`.
pub fn center_square(src_w: u32, src_h: u32) -> (u32, u32, u32) {
    let side = src_w.min(src_h);
    let (x, y) = center_offset(side, side, src_w, src_h);
    (x, y, side)
}

pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (u32, u32) {
    let ox = outer_w.saturating_sub(inner_w) / 2;
    let oy = outer_h.saturating_sub(inner_h) / 2;
    (ox, oy)
}

/// Top-left corner placing an `inner`-sized box centred on `(cx, cy)`, may be negative.
pub fn centered_at(cx: f32, cy: f32, inner_w: f32, inner_h: f32) -> (f32, f32) {
    (cx - inner_w / 2.0, cy - inner_h / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_square_of_landscape_and_portrait() {
        assert_eq!(center_square(400, 300), (50, 0, 300));
        assert_eq!(center_square(300, 400), (0, 50, 300));
        assert_eq!(center_square(256, 256), (0, 0, 256));
    }

    #[test]
    fn centered_box_can_overhang() {
        assert_eq!(centered_at(10.0, 10.0, 40.0, 20.0), (-10.0, 0.0));
    }
}
