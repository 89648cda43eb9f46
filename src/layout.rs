//! On-disk naming for panorama sets.
//!
//! `<save_root>/<session_id>/panorama_<stage>.png`, stage in `0..STAGE_COUNT`.

use std::path::{Path, PathBuf};

use crate::events::SessionId;

/// Faces per cube map, one per capture stage.
pub const STAGE_COUNT: usize = 6;

pub fn stage_file_name(stage: usize) -> String {
    format!("panorama_{stage}.png")
}

pub fn session_dir(root: &Path, session: SessionId) -> PathBuf {
    root.join(session.to_string())
}

pub fn stage_path(set_dir: &Path, stage: usize) -> PathBuf {
    set_dir.join(stage_file_name(stage))
}

/// True when every stage file is present. Decodability is checked on load.
pub fn has_all_stages(set_dir: &Path) -> bool {
    (0..STAGE_COUNT).all(|stage| stage_path(set_dir, stage).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_stage_index() {
        assert_eq!(stage_file_name(0), "panorama_0.png");
        assert_eq!(stage_file_name(5), "panorama_5.png");
        let dir = session_dir(Path::new("/saves"), SessionId(1_700_000_000_123));
        assert_eq!(dir, PathBuf::from("/saves/1700000000123"));
    }

    #[test]
    fn missing_stage_is_incomplete() {
        let tmp = tempfile::tempdir().unwrap();
        for stage in 0..STAGE_COUNT - 1 {
            std::fs::write(stage_path(tmp.path(), stage), b"x").unwrap();
        }
        assert!(!has_all_stages(tmp.path()));
        std::fs::write(stage_path(tmp.path(), STAGE_COUNT - 1), b"x").unwrap();
        assert!(has_all_stages(tmp.path()));
    }
}
