use std::path::PathBuf;

use thiserror::Error;

/// Library error type for timer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The timer configuration violates an invariant; raised before any frame is drawn.
    #[error("invalid timer configuration: {0}")]
    Configuration(String),

    /// An image could not be read or decoded and no fallback was available.
    #[error("failed to load image {}", path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Surface or backend failure from the presenter.
    #[error("render error: {0}")]
    Render(anyhow::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
