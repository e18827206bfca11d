// Static asset loading port
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetEntry {
    pub name: String,
    pub bytes: usize,
}

/// Assets warmed up during bootstrap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetBundle {
    pub entries: Vec<AssetEntry>,
}

impl AssetBundle {
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|entry| entry.bytes).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Load every asset; any failure fails the whole bootstrap task
    async fn load(&self) -> Result<AssetBundle>;
}
