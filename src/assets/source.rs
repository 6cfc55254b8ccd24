use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::foundation::error::{MascotError, MascotResult};

/// Image carried by a resolved layer.
///
/// Composition produces catalog paths; the colorize stage replaces SVG paths with the recolored
/// document itself so renderers never refetch it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageRef {
    /// Catalog image path, resolved through an [`AssetSource`].
    Path(String),
    /// Self-contained SVG document.
    Svg(Arc<str>),
}

impl ImageRef {
    /// Reference a catalog path.
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Whether the referenced image is SVG (by extension for paths).
    pub fn is_svg(&self) -> bool {
        match self {
            Self::Path(p) => p.to_ascii_lowercase().ends_with(".svg"),
            Self::Svg(_) => true,
        }
    }

    /// The catalog path, if this is still an unresolved path reference.
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Self::Path(p) => Some(p),
            Self::Svg(_) => None,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &str {
        match self {
            Self::Path(p) => p,
            Self::Svg(_) => "<inline svg>",
        }
    }
}

impl From<&str> for ImageRef {
    fn from(path: &str) -> Self {
        Self::Path(path.to_owned())
    }
}

/// Read access to catalog image bytes.
///
/// Implementations must be safe to call from several worker threads at once.
pub trait AssetSource: Send + Sync {
    /// Return the raw bytes of the image at `path`.
    fn read(&self, path: &str) -> MascotResult<Vec<u8>>;
}

/// Assets rooted at a directory on disk.
#[derive(Clone, Debug)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    /// Serve catalog paths relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsAssetSource {
    fn read(&self, path: &str) -> MascotResult<Vec<u8>> {
        let rel = normalize_asset_path(path)?;
        let full = self.root.join(&rel);
        let bytes =
            std::fs::read(&full).with_context(|| format!("read asset '{}'", full.display()))?;
        Ok(bytes)
    }
}

/// In-memory assets for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetSource {
    files: BTreeMap<String, Arc<[u8]>>,
}

impl MemoryAssetSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes under `path`; later inserts replace earlier ones.
    pub fn insert(&mut self, path: &str, bytes: impl Into<Vec<u8>>) -> MascotResult<()> {
        let key = normalize_asset_path(path)?;
        let bytes: Vec<u8> = bytes.into();
        self.files.insert(key, Arc::from(bytes));
        Ok(())
    }

    /// Builder form of [`MemoryAssetSource::insert`].
    pub fn with(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> MascotResult<Self> {
        self.insert(path, bytes)?;
        Ok(self)
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files are registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AssetSource for MemoryAssetSource {
    fn read(&self, path: &str) -> MascotResult<Vec<u8>> {
        let key = normalize_asset_path(path)?;
        self.files
            .get(&key)
            .map(|b| b.to_vec())
            .ok_or_else(|| MascotError::asset(format!("no asset at '{path}'")))
    }
}

/// Normalize a catalog image path to `/`-separated segments under the asset root.
///
/// Catalog paths are site-rooted (`/assets/parts/body.svg`), so one leading `/` is accepted and
/// dropped. Empty paths and parent traversals (`..`) are rejected.
pub(crate) fn normalize_asset_path(source: &str) -> MascotResult<String> {
    let s = source.replace('\\', "/");
    let s = s.strip_prefix('/').unwrap_or(&s);
    if s.is_empty() {
        return Err(MascotError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(MascotError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(MascotError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
