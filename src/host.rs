//! Seams to the host application: renderer/camera, texture upload, and the
//! menu screen that displays the background.

use std::collections::VecDeque;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use image::{ImageReader, ImageResult, RgbaImage};
use tracing::debug;

use crate::capture::Orientation;
use crate::events::RawFrame;
use crate::selector::Background;

/// The live 3D viewport.
///
/// Besides these calls the host should read
/// [`CaptureStateMachine::camera_override`](crate::capture::CaptureStateMachine::camera_override)
/// during its own camera setup every frame.
pub trait Renderer {
    /// Whether a 3D scene is loaded; captures only advance while one is.
    fn scene_loaded(&self) -> bool {
        true
    }

    fn capture_framebuffer(&mut self) -> Result<RawFrame>;

    fn set_camera_orientation(&mut self, orientation: Orientation);

    fn set_fov_override(&mut self, degrees: f32);

    fn set_gui_hidden(&mut self, hidden: bool);
}

/// Turns encoded image bytes into displayable texture handles.
pub trait TextureSubsystem: Send + Sync {
    type Texture: Clone + Send + Sync;

    fn decode_image(&self, bytes: &[u8]) -> ImageResult<RgbaImage> {
        let img = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()?;
        Ok(img.to_rgba8())
    }

    fn upload_texture(&self, image: RgbaImage) -> Result<Self::Texture>;
}

/// An open menu screen that can swap its background panorama.
pub trait MenuScreen<T> {
    fn set_panorama(&mut self, background: Background<T>);
}

/// Host-resident textures: the decoded pixels behind an `Arc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuTextures;

impl TextureSubsystem for CpuTextures {
    type Texture = Arc<RgbaImage>;

    fn upload_texture(&self, image: RgbaImage) -> Result<Self::Texture> {
        Ok(Arc::new(image))
    }
}

/// Headless renderer that hands out pre-recorded frames, one per capture.
///
/// Camera and GUI calls are recorded so a caller can inspect what a real
/// viewport would have been asked to do.
#[derive(Debug, Default)]
pub struct ReplayRenderer {
    frames: VecDeque<PathBuf>,
    pub orientations: Vec<Orientation>,
    pub fov: Option<f32>,
    pub gui_hidden: bool,
}

impl ReplayRenderer {
    pub fn new(frames: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Renderer for ReplayRenderer {
    fn capture_framebuffer(&mut self) -> Result<RawFrame> {
        let path = self
            .frames
            .pop_front()
            .ok_or_else(|| anyhow!("no recorded frames left"))?;
        debug!(path = %path.display(), "replaying frame");
        let img = image::open(&path)
            .with_context(|| format!("failed to read frame {}", path.display()))?;
        Ok(RawFrame::from(img.to_rgba8()))
    }

    fn set_camera_orientation(&mut self, orientation: Orientation) {
        self.orientations.push(orientation);
    }

    fn set_fov_override(&mut self, degrees: f32) {
        self.fov = Some(degrees);
    }

    fn set_gui_hidden(&mut self, hidden: bool) {
        self.gui_hidden = hidden;
    }
}
