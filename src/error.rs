use std::path::PathBuf;

use thiserror::Error;

/// Library error type for panorama capture and selection.
#[derive(Debug, Error)]
pub enum PanoramaError {
    /// A session directory or the save root could not be created.
    #[error("failed to create directory {}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The save root could not be listed.
    #[error("failed to scan panorama root {}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A stage image could not be read or decoded.
    #[error("failed to decode panorama image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A cropped frame could not be encoded or written.
    #[error("failed to write panorama image {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Framebuffer dimensions do not match the pixel data.
    #[error("framebuffer is {width}x{height} but holds {len} bytes")]
    InvalidFrame { width: u32, height: u32, len: usize },

    /// The renderer failed to hand over the current framebuffer.
    #[error("framebuffer capture failed: {0}")]
    Capture(anyhow::Error),

    /// The texture subsystem rejected a decoded image.
    #[error("texture upload failed: {0}")]
    Upload(anyhow::Error),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = PanoramaError> = std::result::Result<T, E>;
