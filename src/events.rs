use std::fmt;
use std::path::PathBuf;

use image::RgbaImage;

use crate::error::{PanoramaError, Result};

/// Capture start time in Unix milliseconds; doubles as the session directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub i64);

impl SessionId {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixels grabbed from the live framebuffer, RGBA8, row-major.
///
/// Owned by exactly one write; dropping it releases the buffer whichever way
/// the write ends.
#[derive(Debug)]
pub struct RawFrame(RgbaImage);

impl RawFrame {
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let len = pixels.len();
        RgbaImage::from_raw(width, height, pixels)
            .map(Self)
            .ok_or(PanoramaError::InvalidFrame { width, height, len })
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }
}

impl From<RgbaImage> for RawFrame {
    fn from(image: RgbaImage) -> Self {
        Self(image)
    }
}

/// Request to persist one stage of a session.
#[derive(Debug)]
pub struct WriteStage {
    pub frame: RawFrame,
    pub session: SessionId,
    pub stage: usize,
}

/// Result of a single stage write, reported by the writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Written {
        session: SessionId,
        stage: usize,
        path: PathBuf,
    },
    Failed {
        session: SessionId,
        stage: usize,
        reason: String,
    },
}

impl StageOutcome {
    pub fn stage(&self) -> usize {
        match self {
            Self::Written { stage, .. } | Self::Failed { stage, .. } => *stage,
        }
    }
}
