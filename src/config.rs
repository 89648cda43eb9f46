use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Directory holding one sub-directory per captured panorama.
    pub panorama_save_path: PathBuf,
    /// Show captured panoramas behind the menu instead of the built-in skybox.
    pub use_custom_panorama: bool,
    /// Maximum number of stage images encoded at the same time.
    pub writer_max_concurrent_writes: usize,
    /// How long shutdown waits for queued stage writes to land on disk.
    #[serde(with = "humantime_serde")]
    pub writer_drain_timeout: Duration,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.panorama_save_path.as_os_str().is_empty(),
            "panorama-save-path must not be empty"
        );
        ensure!(
            self.writer_max_concurrent_writes > 0,
            "writer-max-concurrent-writes must be greater than zero"
        );
        ensure!(
            self.writer_drain_timeout > Duration::ZERO,
            "writer-drain-timeout must be positive"
        );
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            panorama_save_path: PathBuf::from("panoramas"),
            use_custom_panorama: true,
            writer_max_concurrent_writes: 4,
            writer_drain_timeout: Duration::from_secs(10),
        }
    }
}
