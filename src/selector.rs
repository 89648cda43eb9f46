use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::cache::{PanoramaCache, PanoramaSet};
use crate::host::{MenuScreen, TextureSubsystem};

/// Resource identifier of the skybox shipped with the host.
pub const DEFAULT_PANORAMA: &str = "textures/gui/title/background/panorama";

/// What the menu draws behind itself.
#[derive(Debug)]
pub enum Background<T> {
    /// Built-in skybox, by resource identifier.
    Builtin(&'static str),
    /// A captured cube map.
    Custom(PanoramaSet<T>),
}

impl<T> Clone for Background<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Builtin(id) => Self::Builtin(*id),
            Self::Custom(set) => Self::Custom(set.clone()),
        }
    }
}

impl<T> Default for Background<T> {
    fn default() -> Self {
        Self::Builtin(DEFAULT_PANORAMA)
    }
}

impl<T> Background<T> {
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    pub fn custom_set(&self) -> Option<&PanoramaSet<T>> {
        match self {
            Self::Builtin(_) => None,
            Self::Custom(set) => Some(set),
        }
    }
}

/// Chooses the menu background and remembers the last choice for screens
/// opened later.
pub struct PanoramaSetSelector<X: TextureSubsystem> {
    cache: Arc<PanoramaCache<X>>,
    save_root: PathBuf,
    current: Mutex<Background<X::Texture>>,
}

impl<X: TextureSubsystem> PanoramaSetSelector<X> {
    pub fn new(cache: Arc<PanoramaCache<X>>, save_root: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            save_root: save_root.into(),
            current: Mutex::new(Background::default()),
        }
    }

    pub fn cache(&self) -> &Arc<PanoramaCache<X>> {
        &self.cache
    }

    pub fn save_root(&self) -> &Path {
        &self.save_root
    }

    /// A random captured set when enabled and available, otherwise the built-in skybox.
    pub fn select_background(&self, custom_enabled: bool) -> Background<X::Texture> {
        if !custom_enabled {
            debug!("custom panoramas disabled; using built-in skybox");
            return Background::default();
        }
        match self.cache.get_random_set(&self.save_root) {
            Some(set) => {
                info!(dir = %set.dir().display(), "using captured panorama");
                Background::Custom(set)
            }
            None => {
                debug!(root = %self.save_root.display(), "no complete panorama; using built-in skybox");
                Background::default()
            }
        }
    }

    /// The background stored by the last [`apply`](Self::apply).
    pub fn current(&self) -> Background<X::Texture> {
        self.current
            .lock()
            .expect("background state poisoned")
            .clone()
    }

    /// Selects a background, stores it as the shared choice and hands it to
    /// `screen` if a menu is open.
    pub fn apply(
        &self,
        custom_enabled: bool,
        screen: Option<&mut dyn MenuScreen<X::Texture>>,
    ) -> Background<X::Texture> {
        let background = self.select_background(custom_enabled);
        *self.current.lock().expect("background state poisoned") = background.clone();
        if let Some(screen) = screen {
            screen.set_panorama(background.clone());
        }
        background
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CpuTextures;
    use crate::layout::{STAGE_COUNT, stage_path};
    use image::{Rgba, RgbaImage};

    type Tex = Arc<RgbaImage>;

    #[derive(Default)]
    struct Screen(Option<Background<Tex>>);

    impl MenuScreen<Tex> for Screen {
        fn set_panorama(&mut self, background: Background<Tex>) {
            self.0 = Some(background);
        }
    }

    fn root_with_set() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("1000");
        std::fs::create_dir_all(&dir).unwrap();
        for stage in 0..STAGE_COUNT {
            RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]))
                .save(stage_path(&dir, stage))
                .unwrap();
        }
        tmp
    }

    #[test]
    fn apply_without_screen_updates_shared_state() {
        let tmp = root_with_set();
        let selector = PanoramaSetSelector::new(Arc::new(PanoramaCache::new(CpuTextures)), tmp.path());
        assert!(!selector.current().is_custom());

        let chosen = selector.apply(true, None);
        assert!(chosen.is_custom());
        assert!(selector.current().is_custom());
    }

    #[test]
    fn apply_hands_background_to_open_screen() {
        let tmp = root_with_set();
        let selector = PanoramaSetSelector::new(Arc::new(PanoramaCache::new(CpuTextures)), tmp.path());
        let mut screen = Screen::default();
        selector.apply(true, Some(&mut screen));
        let shown = screen.0.expect("screen received a background");
        assert_eq!(
            shown.custom_set().unwrap().dir(),
            tmp.path().join("1000").as_path()
        );

        let mut reopened = Screen::default();
        selector.apply(false, Some(&mut reopened));
        assert!(!reopened.0.unwrap().is_custom());
        assert!(!selector.current().is_custom());
    }
}
