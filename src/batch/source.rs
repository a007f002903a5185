use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::foundation::error::{MockupError, MockupResult};

/// Resolves scene and poster URLs to encoded image bytes.
///
/// Any failure is reported as [`MockupError::ImageDecode`] so it fails a single item.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, url: &str) -> MockupResult<Arc<Vec<u8>>>;
}

/// Reads plain paths and `file://` URLs, resolving relative ones against a root directory.
#[derive(Clone, Debug)]
pub struct FsImageSource {
    root: PathBuf,
}

impl FsImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> MockupResult<PathBuf> {
        let raw = url.strip_prefix("file://").unwrap_or(url);
        if raw.contains("://") {
            return Err(MockupError::decode(format!(
                "unsupported image url scheme in '{url}'"
            )));
        }
        let path = Path::new(raw);
        Ok(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        })
    }
}

impl ImageSource for FsImageSource {
    fn fetch(&self, url: &str) -> MockupResult<Arc<Vec<u8>>> {
        let path = self.resolve(url)?;
        std::fs::read(&path)
            .map(Arc::new)
            .map_err(|e| MockupError::decode(format!("read '{}': {e}", path.display())))
    }
}

/// In-memory images keyed by URL.
#[derive(Debug, Default)]
pub struct MemoryImageSource {
    images: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        if let Ok(mut images) = self.images.write() {
            images.insert(url.into(), Arc::new(bytes));
        }
    }

    pub fn remove(&self, url: &str) -> bool {
        self.images
            .write()
            .map(|mut images| images.remove(url).is_some())
            .unwrap_or(false)
    }
}

impl ImageSource for MemoryImageSource {
    fn fetch(&self, url: &str) -> MockupResult<Arc<Vec<u8>>> {
        let images = self
            .images
            .read()
            .map_err(|_| MockupError::Other(anyhow::anyhow!("image source lock poisoned")))?;
        images
            .get(url)
            .cloned()
            .ok_or_else(|| MockupError::decode(format!("no image at '{url}'")))
    }
}
