//! Builds canonical release records from provider album metadata.

use super::artist_group::CanonicalArtists;
use crate::catalog_store::{Classification, Release, Track};
use crate::errors::{TuneCapsuleError, TuneCapsuleResult};
use crate::providers::AlbumMetadata;
use chrono::{DateTime, Months, NaiveDate, Utc};
use std::collections::HashSet;

pub const RELEASE_DATE_DELIMITER: char = '-';

/// A selection of tracks from one album, classified as a unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Project {
    pub album_id: Option<String>,
    /// Overrides the album name when set.
    pub name: Option<String>,
    /// Selected track ids. Empty selects the whole album.
    pub track_ids: Vec<String>,
}

impl Project {
    pub fn album(album_id: impl Into<String>) -> Self {
        Project {
            album_id: Some(album_id.into()),
            ..Default::default()
        }
    }

    pub fn with_tracks(album_id: impl Into<String>, track_ids: Vec<String>) -> Self {
        Project {
            album_id: Some(album_id.into()),
            name: None,
            track_ids,
        }
    }

    pub fn label(&self) -> &str {
        self.album_id.as_deref().unwrap_or("<no album>")
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// Parses `year[-month[-day]]`; imprecise dates resolve to the last day
/// of the month or year they name.
pub fn parse_release_date(release_date: &str) -> TuneCapsuleResult<NaiveDate> {
    let unparseable =
        || TuneCapsuleError::UpstreamData(format!("Unparseable release date '{}'", release_date));
    let parts = release_date
        .trim()
        .split(RELEASE_DATE_DELIMITER)
        .map(|part| part.parse::<u32>().map_err(|_| unparseable()))
        .collect::<TuneCapsuleResult<Vec<u32>>>()?;

    let day = match parts.as_slice() {
        [year] => NaiveDate::from_ymd_opt(*year as i32, 12, 31),
        [year, month] => last_day_of_month(*year as i32, *month),
        [year, month, day] => NaiveDate::from_ymd_opt(*year as i32, *month, *day),
        _ => None,
    };
    day.ok_or_else(unparseable)
}

/// The album tracks whose ids appear in `selection`, in album order.
/// An empty selection keeps every track.
pub fn select_tracks(album: &AlbumMetadata, selection: &[String]) -> Vec<Track> {
    let selected: HashSet<&str> = selection.iter().map(String::as_str).collect();
    album
        .tracks
        .iter()
        .filter(|t| selected.is_empty() || selected.contains(t.id.as_str()))
        .map(|t| Track {
            name: t.name.clone(),
            duration_sec: (t.duration_ms / 1000) as u32,
            number: t.track_number,
            id: t.id.clone(),
        })
        .collect()
}

/// Canonical record for `project` on `album`.
pub fn build_release(
    album: &AlbumMetadata,
    project: &Project,
    artists: &CanonicalArtists,
    classification: Classification,
    retrieved_time: DateTime<Utc>,
) -> TuneCapsuleResult<Release> {
    let release_day = parse_release_date(&album.release_date)?;
    let tracks = select_tracks(album, &project.track_ids);
    if tracks.is_empty() {
        return Err(TuneCapsuleError::UpstreamData(format!(
            "None of the selected tracks belong to album {}",
            album.id
        )));
    }

    Ok(Release {
        release_day,
        artist_names: artists.names(),
        name: project.name.clone().unwrap_or_else(|| album.name.clone()),
        classification,
        tracks,
        retrieved_time,
        artist_group: artists.group_key.clone(),
        album_id: album.id.clone(),
    })
}
