//! Shapes exchanged with the music catalog provider and the playlist publisher.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlbumArtist {
    pub name: String,
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlbumTrack {
    pub name: String,
    pub duration_ms: u64,
    pub track_number: u32,
    pub id: String,
}

/// Album metadata as returned by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlbumMetadata {
    pub id: String,
    pub name: String,
    /// `year`, `year-month` or `year-month-day`
    pub release_date: String,
    pub artists: Vec<AlbumArtist>,
    pub tracks: Vec<AlbumTrack>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlaylistSnapshot {
    pub id: String,
    pub name: String,
    pub track_ids: Vec<String>,
}
