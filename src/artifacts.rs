//! Screenshot artifact management.
//!
//! Failure evidence lands as timestamped PNG files under one screenshots
//! directory, created on demand.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use crate::driver::{DriverError, DriverSession};

/// Owns the screenshots directory and its file naming scheme.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    screenshots_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(screenshots_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshots_dir: screenshots_dir.into(),
        }
    }

    pub fn screenshots_dir(&self) -> &Path {
        &self.screenshots_dir
    }

    /// Build the target path for a named screenshot: `<name>_<timestamp>.png`
    /// with the name reduced to filename-safe characters.
    pub fn screenshot_path(&self, name: &str) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        self.screenshots_dir
            .join(format!("{}_{stamp}.png", sanitize(name)))
    }

    /// Capture a screenshot of the session's current viewport and return the
    /// written path.
    pub async fn capture(
        &self,
        driver: &Arc<dyn DriverSession>,
        name: &str,
    ) -> Result<PathBuf, DriverError> {
        tokio::fs::create_dir_all(&self.screenshots_dir)
            .await
            .map_err(|err| {
                DriverError::Wire(format!(
                    "failed to create screenshots directory {}: {err}",
                    self.screenshots_dir.display()
                ))
            })?;
        let path = self.screenshot_path(name);
        driver.screenshot(&path).await?;
        Ok(path)
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
