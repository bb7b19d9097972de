//! External collaborators: album metadata lookup and playlist publication.
//!
//! The services only depend on the two traits below. The JSON-backed
//! implementations keep a local music library usable without a streaming
//! service account.

mod json_library;
mod json_playlists;
mod models;

pub use json_library::JsonLibraryProvider;
pub use json_playlists::JsonPlaylistPublisher;
pub use models::{AlbumArtist, AlbumMetadata, AlbumTrack, PlaylistSnapshot};

use anyhow::Result;

/// Source of album metadata.
pub trait MusicCatalogProvider: Send + Sync {
    fn album(&self, album_id: &str) -> Result<AlbumMetadata>;
}

/// Destination of season track sequences.
pub trait PlaylistPublisher: Send + Sync {
    /// Remove every track from the playlist.
    fn clear(&self, playlist_id: &str) -> Result<()>;

    /// Append one batch of tracks, preserving order.
    fn append(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;

    fn resolve(&self, playlist_id: &str) -> Result<PlaylistSnapshot>;

    /// Create an empty playlist and return its id.
    fn create(&self, name: &str) -> Result<String>;
}
