//! Album builders and in-memory collaborators.

use super::constants::TRACK_MS;
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tunecapsule::classify::RenameConfirmation;
use tunecapsule::providers::{
    AlbumArtist, AlbumMetadata, AlbumTrack, MusicCatalogProvider, PlaylistPublisher,
    PlaylistSnapshot,
};

// ============================================================================
// Albums
// ============================================================================

pub struct AlbumBuilder {
    album: AlbumMetadata,
}

impl AlbumBuilder {
    pub fn new(id: &str, name: &str, release_date: &str) -> Self {
        AlbumBuilder {
            album: AlbumMetadata {
                id: id.to_string(),
                name: name.to_string(),
                release_date: release_date.to_string(),
                artists: Vec::new(),
                tracks: Vec::new(),
            },
        }
    }

    pub fn artist(mut self, id: &str, name: &str) -> Self {
        self.album.artists.push(AlbumArtist {
            name: name.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn track(mut self, id: &str, name: &str, duration_ms: u64) -> Self {
        let track_number = self.album.tracks.len() as u32 + 1;
        self.album.tracks.push(AlbumTrack {
            name: name.to_string(),
            duration_ms,
            track_number,
            id: id.to_string(),
        });
        self
    }

    /// Appends `count` four-minute tracks with ids `<album id>-t<n>`.
    pub fn tracks(mut self, count: usize) -> Self {
        for _ in 0..count {
            let n = self.album.tracks.len() + 1;
            let id = format!("{}-t{}", self.album.id, n);
            let name = format!("{} {}", self.album.name, n);
            self = self.track(&id, &name, TRACK_MS);
        }
        self
    }

    pub fn build(self) -> AlbumMetadata {
        self.album
    }
}

// ============================================================================
// Music catalog provider
// ============================================================================

#[derive(Default)]
pub struct FakeLibrary {
    albums: Mutex<HashMap<String, AlbumMetadata>>,
}

impl FakeLibrary {
    /// Adds the album, replacing any previous metadata with the same id.
    pub fn put(&self, album: AlbumMetadata) {
        self.albums.lock().unwrap().insert(album.id.clone(), album);
    }
}

impl MusicCatalogProvider for FakeLibrary {
    fn album(&self, album_id: &str) -> Result<AlbumMetadata> {
        match self.albums.lock().unwrap().get(album_id) {
            Some(album) => Ok(album.clone()),
            None => bail!("Album not found: {}", album_id),
        }
    }
}

// ============================================================================
// Playlist publisher
// ============================================================================

#[derive(Default)]
pub struct FakePlaylists {
    playlists: Mutex<HashMap<String, PlaylistSnapshot>>,
    append_sizes: Mutex<Vec<usize>>,
    next_id: AtomicUsize,
    fail_appends: AtomicBool,
}

impl FakePlaylists {
    pub fn track_ids(&self, playlist_id: &str) -> Vec<String> {
        self.playlists
            .lock()
            .unwrap()
            .get(playlist_id)
            .map(|p| p.track_ids.clone())
            .unwrap_or_default()
    }

    /// Sizes of every append call so far, in call order.
    pub fn append_sizes(&self) -> Vec<usize> {
        self.append_sizes.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .playlists
            .lock()
            .unwrap()
            .values()
            .map(|p| p.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

impl PlaylistPublisher for FakePlaylists {
    fn clear(&self, playlist_id: &str) -> Result<()> {
        match self.playlists.lock().unwrap().get_mut(playlist_id) {
            Some(playlist) => {
                playlist.track_ids.clear();
                Ok(())
            }
            None => bail!("Playlist not found: {}", playlist_id),
        }
    }

    fn append(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            bail!("Playlist service unavailable");
        }
        self.append_sizes.lock().unwrap().push(track_ids.len());
        match self.playlists.lock().unwrap().get_mut(playlist_id) {
            Some(playlist) => {
                playlist.track_ids.extend_from_slice(track_ids);
                Ok(())
            }
            None => bail!("Playlist not found: {}", playlist_id),
        }
    }

    fn resolve(&self, playlist_id: &str) -> Result<PlaylistSnapshot> {
        match self.playlists.lock().unwrap().get(playlist_id) {
            Some(playlist) => Ok(playlist.clone()),
            None => bail!("Playlist not found: {}", playlist_id),
        }
    }

    fn create(&self, name: &str) -> Result<String> {
        let id = format!("pl-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.playlists.lock().unwrap().insert(
            id.clone(),
            PlaylistSnapshot {
                id: id.clone(),
                name: name.to_string(),
                track_ids: Vec::new(),
            },
        );
        Ok(id)
    }
}

// ============================================================================
// Rename confirmation
// ============================================================================

pub struct AcceptRenames;

impl RenameConfirmation for AcceptRenames {
    fn confirm_rename(&self, _artist_id: &str, _old_name: &str, _new_name: &str) -> bool {
        true
    }
}

pub struct RefuseRenames;

impl RenameConfirmation for RefuseRenames {
    fn confirm_rename(&self, _artist_id: &str, _old_name: &str, _new_name: &str) -> bool {
        false
    }
}
