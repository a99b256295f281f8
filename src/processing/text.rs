use ab_glyph::{Font, FontArc, FontVec, GlyphId, PxScale, ScaleFont, point};
use fontdb::{Database, Family, Query};
use image::RgbaImage;
use tracing::debug;

use super::draw::blend;
use super::layout::centered_at;

/// CPU text rasteriser for dial labels and the remaining-time clock.
#[derive(Clone)]
pub struct TextRenderer {
    font: FontArc,
    scale: PxScale,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("scale", &self.scale.y)
            .finish_non_exhaustive()
    }
}

impl TextRenderer {
    pub fn new(font: FontArc, size_px: f32) -> Self {
        Self {
            font,
            scale: PxScale::from(size_px),
        }
    }

    /// Look up `family` among the installed fonts, falling back to the default sans-serif face.
    pub fn from_system_font(family: &str, size_px: f32) -> Option<Self> {
        let mut db = Database::new();
        db.load_system_fonts();
        let font = load_named(&db, family).or_else(|| {
            debug!(family, "font family not installed; trying sans-serif");
            load_query(&db, Family::SansSerif)
        })?;
        Some(Self::new(font, size_px))
    }

    /// Ink box of a single line of `text`: advance width and ascent-to-descent height.
    pub fn measure(&self, text: &str) -> (f32, f32) {
        let scaled = self.font.as_scaled(self.scale);
        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        (width, scaled.ascent() - scaled.descent())
    }

    /// Half the diagonal of the box of a single digit; used to space labels off the rim.
    pub fn digit_radius(&self) -> f32 {
        let (w, h) = self.measure("0");
        0.5 * (w * w + h * h).sqrt()
    }

    /// Draw `text` with its line box centred on `center`.
    pub fn draw_centered(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        center: (f32, f32),
        color: [u8; 4],
    ) {
        let (w, h) = self.measure(text);
        let (left, top) = centered_at(center.0, center.1, w, h);
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = point(left, top + scaled.ascent());
        let mut previous: Option<GlyphId> = None;
        let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret.x += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(self.scale, caret);
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                let origin_x = bounds.min.x.floor() as i32;
                let origin_y = bounds.min.y.floor() as i32;
                outlined.draw(|gx, gy, coverage| {
                    let px = origin_x + gx as i32;
                    let py = origin_y + gy as i32;
                    if px < 0 || py < 0 || px >= cw || py >= ch {
                        return;
                    }
                    blend(canvas.get_pixel_mut(px as u32, py as u32), color, coverage);
                });
            }
            caret.x += scaled.h_advance(id);
            previous = Some(id);
        }
    }
}

fn normalize_family(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn load_named(db: &Database, family: &str) -> Option<FontArc> {
    if let Some(font) = load_query(db, Family::Name(family)) {
        return Some(font);
    }
    // Tolerate spelling variants such as "gillsansmt" for "Gill Sans MT".
    let wanted = normalize_family(family);
    let face_id = db.faces().find_map(|face| {
        let matches = face
            .families
            .iter()
            .any(|(name, _)| normalize_family(name) == wanted)
            || normalize_family(&face.post_script_name) == wanted;
        matches.then_some(face.id)
    })?;
    load_face(db, face_id)
}

fn load_query(db: &Database, family: Family<'_>) -> Option<FontArc> {
    let families = [family];
    let face_id = db.query(&Query {
        families: &families,
        ..Query::default()
    })?;
    load_face(db, face_id)
}

fn load_face(db: &Database, face_id: fontdb::ID) -> Option<FontArc> {
    db.with_face_data(face_id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index)
            .ok()
            .map(FontArc::new)
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_names_compare_loosely() {
        assert_eq!(normalize_family("Gill Sans MT"), "gillsansmt");
        assert_eq!(normalize_family("gillsansmt"), "gillsansmt");
        assert_eq!(normalize_family("DejaVu-Sans"), "dejavusans");
    }

    #[test]
    fn system_font_measures_consistently_when_available() {
        // Headless CI images may have no fonts at all.
        let Some(text) = TextRenderer::from_system_font("sans-serif", 32.0) else {
            return;
        };
        let (one, h) = text.measure("0");
        let (two, _) = text.measure("00");
        assert!(one > 0.0 && h > 0.0);
        assert!(two > one);
        assert!(text.digit_radius() > 0.0);
    }
}
