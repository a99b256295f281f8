//! Canvas composition, window placement and presentation.

pub mod compositor;
pub mod presenter;
pub mod viewport;

use anyhow::Result;
use image::RgbaImage;

use viewport::DestinationRect;

/// Backend that puts a finished logical canvas on screen.
pub trait Presenter {
    /// Window size changed; physical pixels.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Show `canvas` scaled into `dest`; the area outside `dest` is cleared.
    fn present(&mut self, canvas: &RgbaImage, dest: DestinationRect) -> Result<()>;
}
