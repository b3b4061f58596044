use std::{
    io,
    path::{Component, Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tokio::fs;

use crate::{
    constants::{ASSET_EXTENSION, IMAGE_EXTENSIONS},
    entities::asset::Asset,
    infrastructure::storage::atomic_file::{remove_if_exists, write_atomic},
};

/// An image file found by walking the asset root.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub id: String,
    pub file_name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl ScannedFile {
    /// Minimal record for a file with no stored metadata.
    pub fn into_asset(self) -> Asset {
        Asset {
            title: self.file_name.clone(),
            id: self.id,
            owner_id: None,
            conversation_id: None,
            prompt: None,
            model_id: "unknown".to_string(),
            file_path: self.file_name,
            width: 0,
            height: 0,
            created_at: self.modified,
            meta: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskUsage {
    pub bytes: u64,
    pub files: usize,
}

impl DiskUsage {
    pub fn of(files: &[ScannedFile]) -> Self {
        DiskUsage {
            bytes: files.iter().map(|f| f.size).sum(),
            files: files.len(),
        }
    }
}

/// Binary side of the asset store: one flat directory of image files.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BlobStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_name_for(id: &str) -> String {
        format!("{}.{}", id, ASSET_EXTENSION)
    }

    /// Resolves a stored relative path, refusing anything that would leave the root.
    pub fn resolve(&self, file_path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(file_path);
        let is_plain = !file_path.is_empty()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));

        if !is_plain {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("asset path escapes the asset root: {}", file_path),
            ));
        }
        Ok(self.root.join(relative))
    }

    /// Writes the binary for `id` and returns its path relative to the root.
    pub async fn write(&self, id: &str, bytes: &[u8]) -> io::Result<String> {
        let file_name = Self::file_name_for(id);
        write_atomic(&self.root.join(&file_name), bytes).await?;
        Ok(file_name)
    }

    pub async fn read(&self, file_path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(file_path)?).await
    }

    pub async fn exists(&self, file_path: &str) -> bool {
        match self.resolve(file_path) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn remove(&self, file_path: &str) -> io::Result<bool> {
        remove_if_exists(&self.resolve(file_path)?).await
    }

    pub async fn size_of(&self, file_path: &str) -> u64 {
        match self.resolve(file_path) {
            Ok(path) => fs::metadata(path).await.map(|m| m.len()).unwrap_or(0),
            Err(_) => 0,
        }
    }

    /// Lists image files directly under the root. A missing root is empty.
    pub async fn scan(&self) -> io::Result<Vec<ScannedFile>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };

            let path = entry.path();
            let (Some(stem), Some(file_name)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.file_name().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            if stem.starts_with('.') || !is_image_file(&path) {
                continue;
            }

            let modified = metadata
                .modified()
                .or_else(|_| metadata.created())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            files.push(ScannedFile {
                id: stem.to_string(),
                file_name: file_name.to_string(),
                size: metadata.len(),
                modified,
            });
        }

        Ok(files)
    }

    pub async fn usage(&self) -> io::Result<DiskUsage> {
        Ok(DiskUsage::of(&self.scan().await?))
    }

    /// Finds the image file whose name is `<id>.<ext>`.
    pub async fn find_by_id(&self, id: &str) -> io::Result<Option<ScannedFile>> {
        Ok(self.scan().await?.into_iter().find(|f| f.id == id))
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
