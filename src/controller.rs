use std::sync::Arc;

use crate::cache::PanoramaCache;
use crate::capture::{CameraOverride, CaptureSink, CaptureStateMachine};
use crate::config::Configuration;
use crate::events::SessionId;
use crate::host::{MenuScreen, Renderer, TextureSubsystem};
use crate::selector::{Background, PanoramaSetSelector};

/// Entry points the host calls from its render loop, input handling and
/// screen management.
pub struct PanoramaController<S: CaptureSink, X: TextureSubsystem> {
    capture: CaptureStateMachine,
    sink: S,
    selector: PanoramaSetSelector<X>,
    use_custom_panorama: bool,
}

impl<S: CaptureSink, X: TextureSubsystem> PanoramaController<S, X> {
    pub fn new(cfg: &Configuration, sink: S, textures: X) -> Self {
        let cache = Arc::new(PanoramaCache::new(textures));
        let selector = PanoramaSetSelector::new(cache, cfg.panorama_save_path.clone());
        Self::with_selector(sink, selector, cfg.use_custom_panorama)
    }

    pub fn with_selector(
        sink: S,
        selector: PanoramaSetSelector<X>,
        use_custom_panorama: bool,
    ) -> Self {
        Self {
            capture: CaptureStateMachine::new(),
            sink,
            selector,
            use_custom_panorama,
        }
    }

    pub fn capture(&self) -> &CaptureStateMachine {
        &self.capture
    }

    pub fn selector(&self) -> &PanoramaSetSelector<X> {
        &self.selector
    }

    /// The capture key was pressed. Returns whether a new session started.
    pub fn on_capture_key_pressed<R>(&mut self, renderer: &mut R) -> bool
    where
        R: Renderer + ?Sized,
    {
        self.capture.start(SessionId::now(), renderer)
    }

    /// A frame finished rendering.
    pub fn on_render_frame<R>(&mut self, renderer: &mut R) -> Option<usize>
    where
        R: Renderer + ?Sized,
    {
        self.capture.tick(renderer, &self.sink)
    }

    /// Camera setup for the frame about to render.
    pub fn camera_override(&self) -> Option<CameraOverride> {
        self.capture.camera_override()
    }

    /// The main menu opened; `screen` is the menu if it is already on display.
    pub fn on_menu_opened(
        &self,
        screen: Option<&mut dyn MenuScreen<X::Texture>>,
    ) -> Background<X::Texture> {
        self.selector.apply(self.use_custom_panorama, screen)
    }
}
