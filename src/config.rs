use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};

use crate::assets::discover_images;
use crate::render::compositor::CanvasStyle;
use crate::timing::{ChangePolicy, InitialImage, TimerConfig};

/// Which pizza images take part in the rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSelection {
    /// Every image file directly inside `image-root`, sorted by name.
    All,
    Listed(Vec<PathBuf>),
}

impl Default for ImageSelection {
    fn default() -> Self {
        Self::Listed(vec![PathBuf::from("000_default.png")])
    }
}

impl<'de> Deserialize<'de> for ImageSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SelectionVisitor;

        impl<'de> Visitor<'de> for SelectionVisitor {
            type Value = ImageSelection;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("`all`, an image name, or a list of image names")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value.eq_ignore_ascii_case("all") {
                    Ok(ImageSelection::All)
                } else {
                    Ok(ImageSelection::Listed(vec![PathBuf::from(value)]))
                }
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                self.visit_str(&value)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut paths = Vec::new();
                while let Some(path) = seq.next_element::<PathBuf>()? {
                    paths.push(path);
                }
                Ok(ImageSelection::Listed(paths))
            }
        }

        deserializer.deserialize_any(SelectionVisitor)
    }
}

/// Accepts an index, `random`, `none` or null; the last three pick a random first image.
fn deserialize_initial_image<'de, D>(deserializer: D) -> Result<InitialImage, D::Error>
where
    D: Deserializer<'de>,
{
    struct InitialVisitor;

    impl<'de> Visitor<'de> for InitialVisitor {
        type Value = InitialImage;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a non-negative image index, `random` or `none`")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            usize::try_from(value)
                .map(InitialImage::Index)
                .map_err(|_| E::custom(format!("initial-image index {value} is too large")))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let value = u64::try_from(value)
                .map_err(|_| E::custom(format!("initial-image must not be negative, got {value}")))?;
            self.visit_u64(value)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match value.to_ascii_lowercase().as_str() {
                "random" | "none" => Ok(InitialImage::Random),
                _ => Err(E::invalid_value(de::Unexpected::Str(value), &self)),
            }
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(InitialImage::Random)
        }
    }

    deserializer.deserialize_any(InitialVisitor)
}

fn deserialize_change_policy<'de, D>(deserializer: D) -> Result<ChangePolicy, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.to_ascii_lowercase().as_str() {
        "cycle" => Ok(ChangePolicy::Cycle),
        "random" => Ok(ChangePolicy::Random),
        _ => Err(de::Error::unknown_variant(&raw, &["random", "cycle"])),
    }
}

/// Values from the command line that take precedence over the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOverrides {
    pub seed: Option<u64>,
    pub start_remaining: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Length of the exam.
    #[serde(with = "humantime_serde")]
    pub total_duration: Duration,
    /// Length of one dial section; also the default image-change interval.
    #[serde(with = "humantime_serde")]
    pub slice_duration: Duration,
    /// Resume with this much exam time left.
    #[serde(with = "humantime_serde")]
    pub start_remaining: Option<Duration>,
    /// Directory that image names are resolved against.
    pub image_root: PathBuf,
    pub images: ImageSelection,
    #[serde(deserialize_with = "deserialize_initial_image")]
    pub initial_image: InitialImage,
    #[serde(with = "humantime_serde")]
    pub image_change_interval: Option<Duration>,
    #[serde(deserialize_with = "deserialize_change_policy")]
    pub image_change_policy: ChangePolicy,
    /// Shown in place of any image that fails to decode.
    pub fallback_image: Option<PathBuf>,
    /// Deterministic seed for random image selection.
    pub seed: Option<u64>,
    pub canvas_size: u32,
    pub pizza_radius: u32,
    pub font_family: String,
    pub font_size: f32,
    pub line_width: f32,
    pub separator_dash_length: f32,
    pub separator_gap_length: f32,
    pub separator_line_width: f32,
    pub clock_padding: f32,
    pub clock_background_color: [u8; 4],
    pub background_color: [u8; 4],
    pub foreground_color: [u8; 4],
    /// Colour of the wedge hiding the remaining time; defaults to the background.
    pub mask_color: Option<[u8; 4]>,
    /// Frame cap in frames per second.
    pub frame_rate: u32,
    pub fullscreen: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            total_duration: Duration::from_secs(3 * 3600 + 30 * 60),
            slice_duration: Duration::from_secs(30 * 60),
            start_remaining: None,
            image_root: PathBuf::from("images"),
            images: ImageSelection::default(),
            initial_image: InitialImage::Index(0),
            image_change_interval: None,
            image_change_policy: ChangePolicy::Random,
            fallback_image: None,
            seed: None,
            canvas_size: 800,
            pizza_radius: 300,
            font_family: "Gill Sans MT".to_string(),
            font_size: 56.0,
            line_width: 5.0,
            separator_dash_length: 5.0,
            separator_gap_length: 3.0,
            separator_line_width: 2.0,
            clock_padding: 15.0,
            clock_background_color: [0, 0, 0, 180],
            background_color: [0, 0, 0, 255],
            foreground_color: [255, 255, 255, 255],
            mask_color: None,
            frame_rate: 30,
            fullscreen: false,
        }
    }
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&s)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        let total = self.total_duration;
        ensure!(!total.is_zero(), "total-duration must be greater than zero");
        ensure!(
            !self.slice_duration.is_zero() && self.slice_duration <= total,
            "slice-duration must be greater than zero and at most total-duration"
        );
        if let Some(interval) = self.image_change_interval {
            ensure!(
                !interval.is_zero() && interval <= total,
                "image-change-interval must be greater than zero and at most total-duration"
            );
        }
        if let Some(remaining) = self.start_remaining {
            ensure!(
                remaining <= total,
                "start-remaining must not exceed total-duration"
            );
        }
        if let ImageSelection::Listed(images) = &self.images {
            ensure!(!images.is_empty(), "images must not be an empty list");
        }
        ensure!(self.canvas_size > 0, "canvas-size must be greater than zero");
        ensure!(self.pizza_radius > 0, "pizza-radius must be greater than zero");
        ensure!(
            u64::from(self.pizza_radius) * 2 <= u64::from(self.canvas_size),
            "pizza-radius must fit the canvas (at most canvas-size / 2)"
        );
        ensure!(self.font_size > 0.0, "font-size must be positive");
        ensure!(self.line_width > 0.0, "line-width must be positive");
        ensure!(
            self.separator_dash_length >= 0.0,
            "separator-dash-length cannot be negative"
        );
        ensure!(
            self.separator_gap_length >= 0.0,
            "separator-gap-length cannot be negative"
        );
        ensure!(
            self.separator_line_width > 0.0,
            "separator-line-width must be positive"
        );
        ensure!(self.clock_padding >= 0.0, "clock-padding cannot be negative");
        ensure!(self.frame_rate > 0, "frame-rate must be greater than zero");
        Ok(self)
    }

    /// Image names in rotation order, expanding `all` from `image-root`.
    pub fn resolve_images(&self) -> Result<Vec<PathBuf>> {
        match &self.images {
            ImageSelection::Listed(images) => Ok(images.clone()),
            ImageSelection::All => {
                let found = discover_images(&self.image_root);
                ensure!(
                    !found.is_empty(),
                    "images: all found no image files in {}",
                    self.image_root.display()
                );
                Ok(found)
            }
        }
    }

    pub fn timer_config(&self, overrides: RuntimeOverrides) -> Result<TimerConfig> {
        let images = self.resolve_images()?;
        let start_remaining = overrides.start_remaining.or(self.start_remaining);
        let cfg = TimerConfig::builder(
            self.total_duration.as_secs_f64(),
            self.slice_duration.as_secs_f64(),
            images,
        )
        .start_remaining(start_remaining.map(|d| d.as_secs_f64()))
        .initial_image(self.initial_image)
        .image_change_interval(self.image_change_interval.map(|d| d.as_secs_f64()))
        .image_change_policy(self.image_change_policy)
        .seed(overrides.seed.or(self.seed))
        .build()?;
        Ok(cfg)
    }

    pub fn canvas_style(&self) -> CanvasStyle {
        CanvasStyle {
            canvas_size: self.canvas_size,
            pizza_radius: self.pizza_radius,
            line_width: self.line_width,
            separator_dash_length: self.separator_dash_length,
            separator_gap_length: self.separator_gap_length,
            separator_line_width: self.separator_line_width,
            clock_padding: self.clock_padding,
            clock_background_color: self.clock_background_color,
            background_color: self.background_color,
            foreground_color: self.foreground_color,
            mask_color: self.mask_color.unwrap_or(self.background_color),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}
