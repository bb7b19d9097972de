use super::models::AlbumMetadata;
use super::MusicCatalogProvider;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads album metadata from `<library>/albums/<album id>.json`.
pub struct JsonLibraryProvider {
    albums_dir: PathBuf,
}

impl JsonLibraryProvider {
    pub fn new<P: AsRef<Path>>(library_dir: P) -> Self {
        Self {
            albums_dir: library_dir.as_ref().join("albums"),
        }
    }

    fn album_path(&self, album_id: &str) -> Result<PathBuf> {
        if album_id.is_empty() || album_id.contains(['/', '\\']) || album_id.starts_with('.') {
            anyhow::bail!("Invalid album id: {:?}", album_id);
        }
        Ok(self.albums_dir.join(format!("{}.json", album_id)))
    }
}

impl MusicCatalogProvider for JsonLibraryProvider {
    fn album(&self, album_id: &str) -> Result<AlbumMetadata> {
        let path = self.album_path(album_id)?;
        debug!("Reading album metadata from {:?}", path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read album file: {:?}", path))?;
        let album: AlbumMetadata = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse album file: {:?}", path))?;
        if album.id != album_id {
            anyhow::bail!(
                "Album file {:?} describes album {} instead of {}",
                path,
                album.id,
                album_id
            );
        }
        Ok(album)
    }
}
