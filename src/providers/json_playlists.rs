use super::models::PlaylistSnapshot;
use super::PlaylistPublisher;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Keeps playlists as `<library>/playlists/<playlist id>.json`.
pub struct JsonPlaylistPublisher {
    playlists_dir: PathBuf,
    // Serializes read-modify-write cycles on playlist files
    write_lock: Mutex<()>,
}

impl JsonPlaylistPublisher {
    pub fn new<P: AsRef<Path>>(library_dir: P) -> Result<Self> {
        let playlists_dir = library_dir.as_ref().join("playlists");
        std::fs::create_dir_all(&playlists_dir)
            .with_context(|| format!("Failed to create playlists directory: {:?}", playlists_dir))?;
        Ok(Self {
            playlists_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn playlist_path(&self, playlist_id: &str) -> PathBuf {
        self.playlists_dir.join(format!("{}.json", playlist_id))
    }

    fn load(&self, playlist_id: &str) -> Result<PlaylistSnapshot> {
        let path = self.playlist_path(playlist_id);
        if !path.exists() {
            bail!("Playlist not found: {}", playlist_id);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read playlist file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse playlist file: {:?}", path))
    }

    fn save(&self, playlist: &PlaylistSnapshot) -> Result<()> {
        let path = self.playlist_path(&playlist.id);
        let content = serde_json::to_string_pretty(playlist)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write playlist file: {:?}", path))
    }

    fn next_playlist_id(&self) -> String {
        (1..)
            .map(|n| format!("pl{:04}", n))
            .find(|id| !self.playlist_path(id).exists())
            .unwrap_or_default()
    }
}

impl PlaylistPublisher for JsonPlaylistPublisher {
    fn clear(&self, playlist_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        let mut playlist = self.load(playlist_id)?;
        playlist.track_ids.clear();
        self.save(&playlist)
    }

    fn append(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        let mut playlist = self.load(playlist_id)?;
        playlist.track_ids.extend_from_slice(track_ids);
        debug!(
            "Appended {} tracks to playlist {} ({} total)",
            track_ids.len(),
            playlist_id,
            playlist.track_ids.len()
        );
        self.save(&playlist)
    }

    fn resolve(&self, playlist_id: &str) -> Result<PlaylistSnapshot> {
        self.load(playlist_id)
    }

    fn create(&self, name: &str) -> Result<String> {
        let _guard = self.write_lock.lock().unwrap();
        let playlist = PlaylistSnapshot {
            id: self.next_playlist_id(),
            name: name.to_string(),
            track_ids: Vec::new(),
        };
        self.save(&playlist)?;
        info!("Created playlist '{}' with id {}", name, playlist.id);
        Ok(playlist.id)
    }
}
