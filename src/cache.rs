use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::ImageError;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::error::{PanoramaError, Result};
use crate::host::TextureSubsystem;
use crate::layout::{STAGE_COUNT, has_all_stages, stage_path};

/// A complete set of decoded cube faces, keyed by its directory.
#[derive(Debug)]
pub struct PanoramaSet<T> {
    dir: PathBuf,
    faces: Arc<[T; STAGE_COUNT]>,
}

impl<T> Clone for PanoramaSet<T> {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            faces: Arc::clone(&self.faces),
        }
    }
}

impl<T> PanoramaSet<T> {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Faces in stage order.
    pub fn faces(&self) -> &[T; STAGE_COUNT] {
        &self.faces
    }

    /// True when both sets share the same cached handles.
    pub fn same_handles(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.faces, &other.faces)
    }
}

/// Lists set directories directly under `root` that hold every stage file.
///
/// Symlinked set directories count. Sorted by name; unreadable entries below
/// the root are skipped.
pub fn complete_sets(root: &Path) -> Result<Vec<PathBuf>> {
    let mut sets = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(PanoramaError::Scan {
                    path: root.to_path_buf(),
                    source,
                });
            }
            Err(err) => {
                debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if has_all_stages(entry.path()) {
            sets.push(entry.into_path());
        } else {
            debug!(dir = %entry.path().display(), "incomplete panorama set");
        }
    }
    Ok(sets)
}

/// Memo of decoded panorama sets. Entries are only added, never replaced or evicted.
pub struct PanoramaCache<X: TextureSubsystem> {
    textures: X,
    memo: Mutex<HashMap<PathBuf, Arc<[X::Texture; STAGE_COUNT]>>>,
}

impl<X: TextureSubsystem> PanoramaCache<X> {
    pub fn new(textures: X) -> Self {
        Self {
            textures,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_sets(&self) -> usize {
        self.memo.lock().expect("panorama cache poisoned").len()
    }

    pub fn get_random_set(&self, root: &Path) -> Option<PanoramaSet<X::Texture>> {
        self.get_random_set_with(root, &mut rand::rng())
    }

    /// Picks a complete set under `root` uniformly at random and returns its textures.
    ///
    /// The listing is redone on every call. Returns `None` when the root cannot be
    /// created or read, when no set is complete, or when the chosen set fails to
    /// decode; a failed set is not memoized and may be retried later.
    pub fn get_random_set_with<R>(&self, root: &Path, rng: &mut R) -> Option<PanoramaSet<X::Texture>>
    where
        R: Rng + ?Sized,
    {
        if let Err(source) = fs::create_dir_all(root) {
            let err = PanoramaError::DirectoryCreate {
                path: root.to_path_buf(),
                source,
            };
            error!("{:#}", anyhow::Error::new(err));
            return None;
        }

        let sets = match complete_sets(root) {
            Ok(sets) => sets,
            Err(err) => {
                warn!("{:#}", anyhow::Error::new(err));
                return None;
            }
        };
        let dir = sets.choose(rng)?;
        debug!(dir = %dir.display(), candidates = sets.len(), "picked panorama set");

        match self.load(dir) {
            Ok(faces) => Some(PanoramaSet {
                dir: dir.clone(),
                faces,
            }),
            Err(err) => {
                warn!(dir = %dir.display(), "{:#}", anyhow::Error::new(err));
                None
            }
        }
    }

    fn load(&self, dir: &Path) -> Result<Arc<[X::Texture; STAGE_COUNT]>> {
        if let Some(faces) = self
            .memo
            .lock()
            .expect("panorama cache poisoned")
            .get(dir)
        {
            debug!(dir = %dir.display(), "panorama cache hit");
            return Ok(Arc::clone(faces));
        }

        // Decode outside the lock; if two callers race on one set the first insert wins.
        let mut faces = Vec::with_capacity(STAGE_COUNT);
        for stage in 0..STAGE_COUNT {
            faces.push(self.load_face(&stage_path(dir, stage))?);
        }
        let Ok(faces) = <[X::Texture; STAGE_COUNT]>::try_from(faces) else {
            unreachable!("exactly {STAGE_COUNT} faces were decoded");
        };

        let mut memo = self.memo.lock().expect("panorama cache poisoned");
        let entry = memo
            .entry(dir.to_path_buf())
            .or_insert_with(|| Arc::new(faces));
        Ok(Arc::clone(entry))
    }

    fn load_face(&self, path: &Path) -> Result<X::Texture> {
        let decode_err = |source| PanoramaError::Decode {
            path: path.to_path_buf(),
            source,
        };
        let bytes = fs::read(path).map_err(|e| decode_err(ImageError::IoError(e)))?;
        let image = self.textures.decode_image(&bytes).map_err(decode_err)?;
        self.textures
            .upload_texture(image)
            .map_err(PanoramaError::Upload)
    }
}
