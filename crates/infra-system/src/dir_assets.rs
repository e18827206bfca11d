// Directory-backed asset loader
use async_trait::async_trait;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use ptimer_core::port::{AssetBundle, AssetEntry, AssetLoader};
use ptimer_core::{AppError, Result};

/// Reads every regular file directly inside a directory, concurrently.
///
/// Without a directory the bundle is empty and loading always succeeds.
pub struct DirAssetLoader {
    dir: Option<PathBuf>,
}

impl DirAssetLoader {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| AppError::Asset(format!("{}: {}", dir.display(), e)))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Asset(format!("{}: {}", dir.display(), e)))?
        {
            let file_type = entry.file_type().await?;
            if file_type.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    async fn load_file(path: PathBuf) -> Result<AssetEntry> {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Asset(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(asset = %name, bytes = bytes.len(), "Asset loaded");
        Ok(AssetEntry {
            name,
            bytes: bytes.len(),
        })
    }
}

#[async_trait]
impl AssetLoader for DirAssetLoader {
    async fn load(&self) -> Result<AssetBundle> {
        let Some(dir) = &self.dir else {
            debug!("No asset directory configured");
            return Ok(AssetBundle::default());
        };

        let files = Self::list_files(dir).await?;
        let entries = try_join_all(files.into_iter().map(Self::load_file)).await?;
        let bundle = AssetBundle { entries };

        info!(
            dir = %dir.display(),
            assets = bundle.len(),
            total_bytes = bundle.total_bytes(),
            "Assets loaded"
        );
        Ok(bundle)
    }
}
