use anyhow::{Context, Result, bail};
use fast_image_resize as fir;
use image::{RgbaImage, imageops};

use super::layout::center_square;

/// Center-crop `source` to a square and resize it to `diameter × diameter`.
///
/// Cropping keeps the aspect ratio of the picture; the pizza never stretches.
pub fn square_cover(source: &RgbaImage, diameter: u32) -> Result<RgbaImage> {
    if diameter == 0 {
        bail!("target diameter must be positive");
    }
    let (x, y, side) = center_square(source.width(), source.height());
    if side == 0 {
        bail!("cannot scale an empty image");
    }
    let square = if side == source.width() && side == source.height() {
        source.clone()
    } else {
        imageops::crop_imm(source, x, y, side, side).to_image()
    };
    resize_rgba(&square, diameter, diameter)
}

fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage> {
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }

    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("failed to create source view for pizza resize")?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .context("pizza resize failed")?;
    let buffer = dst_image.into_vec();
    RgbaImage::from_raw(target_w, target_h, buffer)
        .context("failed to construct resized RGBA image")
}
