use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageError, RgbaImage};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::processing::scale::square_cover;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Synchronous source of decoded pizza images.
pub trait ImageLoader {
    fn load(&self, id: &Path) -> Result<RgbaImage>;
}

/// Decodes image files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    root: PathBuf,
}

impl FileImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, id: &Path) -> Result<RgbaImage> {
        let path = self.root.join(id);
        decode_rgba8(&path).map_err(|source| Error::Asset { path, source })
    }
}

fn decode_rgba8(path: &Path) -> std::result::Result<RgbaImage, ImageError> {
    let img = image::ImageReader::open(path)
        .map_err(ImageError::IoError)?
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .decode()?;
    Ok(img.to_rgba8())
}

/// Image files directly inside `root`, as names relative to it, sorted by file name.
pub fn discover_images(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && is_image(e.path()))
        .map(|e| PathBuf::from(e.file_name()))
        .collect()
}

#[inline]
fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(OsStr::to_str)
            .map(|s| s.to_ascii_lowercase()),
        Some(ref e) if IMAGE_EXTENSIONS.contains(&e.as_str())
    )
}

/// Decoded images at pizza size: the active one and, once needed, the fallback.
pub struct ImageStore<L> {
    loader: L,
    diameter: u32,
    current: Option<(usize, RgbaImage)>,
    fallback_path: Option<PathBuf>,
    fallback: Option<RgbaImage>,
}

impl<L: ImageLoader> ImageStore<L> {
    pub fn new(loader: L, diameter: u32, fallback_path: Option<PathBuf>) -> Self {
        Self {
            loader,
            diameter,
            current: None,
            fallback_path,
            fallback: None,
        }
    }

    /// The image for `index` in `images`, decoding it only when the index changes.
    ///
    /// A failed decode is replaced by the fallback image when one is configured.
    pub fn get(&mut self, index: usize, images: &[PathBuf]) -> Result<&RgbaImage> {
        let image = match self.current.take() {
            Some((cached, image)) if cached == index => image,
            _ => self.prepare(index, images)?,
        };
        Ok(&self.current.insert((index, image)).1)
    }

    fn prepare(&mut self, index: usize, images: &[PathBuf]) -> Result<RgbaImage> {
        let id = images.get(index).ok_or_else(|| {
            Error::config(format!(
                "image index {index} is out of range for {} images",
                images.len()
            ))
        })?;
        let err = match self.load_scaled(id) {
            Ok(image) => {
                debug!(index, image = %id.display(), "decoded pizza image");
                return Ok(image);
            }
            Err(err) => err,
        };
        let Some(fallback_path) = self.fallback_path.clone() else {
            return Err(err);
        };
        warn!(
            image = %id.display(),
            fallback = %fallback_path.display(),
            error = %err,
            "image failed to load; substituting fallback"
        );
        let fallback = match self.fallback.take() {
            Some(image) => image,
            None => self.load_scaled(&fallback_path)?,
        };
        self.fallback = Some(fallback.clone());
        Ok(fallback)
    }

    fn load_scaled(&self, id: &Path) -> Result<RgbaImage> {
        let decoded = self.loader.load(id)?;
        square_cover(&decoded, self.diameter).map_err(|err| Error::Asset {
            path: id.to_path_buf(),
            source: ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::Generic(format!("{err:#}")),
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use image::Rgba;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn discovers_images_sorted_and_ignores_others() {
        let dir = tempdir().unwrap();
        for name in ["b.png", "a.JPG", "c.txt", "d.webp"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/e.png"), b"x").unwrap();

        let found = discover_images(dir.path());
        assert_eq!(
            found,
            vec![
                PathBuf::from("a.JPG"),
                PathBuf::from("b.png"),
                PathBuf::from("d.webp")
            ]
        );
    }

    #[test]
    fn missing_root_yields_nothing() {
        let dir = tempdir().unwrap();
        assert!(discover_images(&dir.path().join("absent")).is_empty());
    }

    #[test]
    fn file_loader_decodes_png_and_reports_bad_files() {
        let dir = tempdir().unwrap();
        RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255]))
            .save(dir.path().join("ok.png"))
            .unwrap();
        fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

        let loader = FileImageLoader::new(dir.path());
        let img = loader.load(Path::new("ok.png")).unwrap();
        assert_eq!(img.dimensions(), (4, 2));

        let err = loader.load(Path::new("broken.png")).unwrap_err();
        match err {
            Error::Asset { path, .. } => assert!(path.ends_with("broken.png")),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(loader.load(Path::new("missing.png")).is_err());
    }
}
