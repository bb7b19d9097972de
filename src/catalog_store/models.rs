//! Catalog record models.
//!
//! These are the typed forms of the rows kept in the catalog database:
//! ranking/certification releases, artist groups, single links, season
//! metadata and artist score snapshots.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Seconds of slack allowed when matching two tracks with the same name.
pub const TRACK_DURATION_TOLERANCE_SEC: u32 = 5;

// =============================================================================
// Classifications
// =============================================================================

/// Ordered quality scale, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ranking {
    E,
    C,
    B,
    A,
}

impl Ranking {
    /// The two rankings that feed autoseasons.
    pub const TOP_TWO: [Ranking; 2] = [Ranking::A, Ranking::B];

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "A" => Some(Ranking::A),
            "B" => Some(Ranking::B),
            "C" => Some(Ranking::C),
            "E" => Some(Ranking::E),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Ranking::A => "A",
            Ranking::B => "B",
            Ranking::C => "C",
            Ranking::E => "E",
        }
    }

    /// Points per track (or per album value unit) in the cumulative score.
    pub fn weight(&self) -> f64 {
        match self {
            Ranking::A => 1.8,
            Ranking::B => 1.0,
            Ranking::C => 0.2,
            Ranking::E => 0.0,
        }
    }

    pub fn is_top_two(&self) -> bool {
        matches!(self, Ranking::A | Ranking::B)
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Either a ranking symbol or a free-text certification token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Ranking(Ranking),
    Certification(String),
}

impl Classification {
    /// Interprets an already upper-cased token.
    pub fn from_token(token: &str) -> Self {
        match Ranking::from_symbol(token) {
            Some(ranking) => Classification::Ranking(ranking),
            None => Classification::Certification(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Classification::Ranking(ranking) => ranking.symbol(),
            Classification::Certification(token) => token,
        }
    }

    pub fn ranking(&self) -> Option<Ranking> {
        match self {
            Classification::Ranking(ranking) => Some(*ranking),
            Classification::Certification(_) => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Releases
// =============================================================================

/// Logical identity of a release, shared by its ranking and certifications.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseKey {
    pub release_day: NaiveDate,
    pub artist_names: Vec<String>,
    pub name: String,
}

impl fmt::Display for ReleaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({})",
            self.artist_names.join(", "),
            self.name,
            self.release_day
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub duration_sec: u32,
    pub number: u32,
    pub id: String,
}

impl Track {
    /// Same name and durations within the matching tolerance.
    pub fn matches(&self, other: &Track) -> bool {
        self.name == other.name
            && self.duration_sec.abs_diff(other.duration_sec) <= TRACK_DURATION_TOLERANCE_SEC
    }
}

/// A classified release: one row of either the ranking or the certification table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub release_day: NaiveDate,
    pub artist_names: Vec<String>,
    pub name: String,
    pub classification: Classification,
    pub tracks: Vec<Track>,
    pub retrieved_time: DateTime<Utc>,
    pub artist_group: String,
    pub album_id: String,
}

impl Release {
    pub fn key(&self) -> ReleaseKey {
        ReleaseKey {
            release_day: self.release_day,
            artist_names: self.artist_names.clone(),
            name: self.name.clone(),
        }
    }

    pub fn ranking(&self) -> Option<Ranking> {
        self.classification.ranking()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn distinct_track_count(&self) -> usize {
        self.tracks
            .iter()
            .map(|t| t.id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn duration_sec(&self) -> u64 {
        self.tracks.iter().map(|t| t.duration_sec as u64).sum()
    }

    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.id.as_str())
    }

    pub fn track_names(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.name.clone()).collect()
    }

    /// Equality on everything except the retrieval timestamp.
    pub fn same_content(&self, other: &Release) -> bool {
        self.release_day == other.release_day
            && self.artist_names == other.artist_names
            && self.name == other.name
            && self.classification == other.classification
            && self.tracks == other.tracks
            && self.artist_group == other.artist_group
            && self.album_id == other.album_id
    }

    /// Every track of `self` has a matching track in `other`.
    pub fn tracks_contained_in(&self, other: &Release) -> bool {
        !self.tracks.is_empty()
            && self
                .tracks
                .iter()
                .all(|track| other.tracks.iter().any(|candidate| track.matches(candidate)))
    }
}

// =============================================================================
// Artist groups
// =============================================================================

pub const GROUP_KEY_SEPARATOR: char = '+';

/// Splits a group key back into its member artist ids.
pub fn group_member_ids(group_key: &str) -> impl Iterator<Item = &str> {
    group_key.split(GROUP_KEY_SEPARATOR).filter(|id| !id.is_empty())
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistGroupMember {
    pub artist_group: String,
    pub artist_name: String,
    pub artist_id: String,
}

// =============================================================================
// Singles
// =============================================================================

/// Records that `single`'s tracks are all present on `album`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleLink {
    pub single: ReleaseKey,
    pub single_track_names: Vec<String>,
    pub album: ReleaseKey,
    pub album_track_names: Vec<String>,
}

impl SingleLink {
    pub fn between(single: &Release, album: &Release) -> Self {
        SingleLink {
            single: single.key(),
            single_track_names: single.track_names(),
            album: album.key(),
            album_track_names: album.track_names(),
        }
    }
}

// =============================================================================
// Seasons
// =============================================================================

/// Inclusive-inclusive year bounds, `None` meaning unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct YearRange {
    pub min: Option<i32>,
    pub max: Option<i32>,
}

impl YearRange {
    pub const UNBOUNDED: YearRange = YearRange {
        min: None,
        max: None,
    };

    pub fn years(min: i32, max: i32) -> Self {
        YearRange {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn single(year: i32) -> Self {
        Self::years(year, year)
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => write!(f, "{}", min),
            (Some(min), Some(max)) => write!(f, "{}-{}", min, max),
            (Some(min), None) => write!(f, "{}-", min),
            (None, Some(max)) => write!(f, "-{}", max),
            (None, None) => f.write_str("all time"),
        }
    }
}

/// Inclusive-start, exclusive-stop day window, `None` meaning unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DayWindow {
    pub start: Option<NaiveDate>,
    pub stop: Option<NaiveDate>,
}

impl DayWindow {
    pub const UNBOUNDED: DayWindow = DayWindow {
        start: None,
        stop: None,
    };

    pub fn between(start: NaiveDate, stop: NaiveDate) -> Self {
        DayWindow {
            start: Some(start),
            stop: Some(stop),
        }
    }

    /// `[Jan 1 min, Jan 1 max+1)`.
    pub fn for_years(min_year: i32, max_year: i32) -> Self {
        Self::between(beginning_of_year(min_year), beginning_of_year(max_year + 1))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start.map_or(true, |start| day >= start) && self.stop.map_or(true, |stop| day < stop)
    }

    /// Year bounds covered by this window; a stop on Jan 1 closes the prior year.
    pub fn year_range(&self) -> YearRange {
        let max = self.stop.map(|stop| {
            if stop.month() == 1 && stop.day() == 1 {
                stop.year() - 1
            } else {
                stop.year()
            }
        });
        YearRange {
            min: self.start.map(|start| start.year()),
            max,
        }
    }
}

pub fn beginning_of_year(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MAX)
}

/// What a season collects: a numbered autoseason slot or a classification set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SeasonClassification {
    Slot(u32),
    Set(String),
}

impl SeasonClassification {
    pub fn from_db_str(s: &str) -> Self {
        match s.parse::<u32>() {
            Ok(slot) if s.chars().all(|c| c.is_ascii_digit()) => SeasonClassification::Slot(slot),
            _ => SeasonClassification::Set(s.to_string()),
        }
    }

    pub fn to_db_string(&self) -> String {
        match self {
            SeasonClassification::Slot(slot) => slot.to_string(),
            SeasonClassification::Set(set) => set.clone(),
        }
    }

    /// The classifications whose records belong to the season.
    pub fn classifications(&self) -> Vec<Classification> {
        match self {
            SeasonClassification::Slot(_) => Ranking::TOP_TWO
                .iter()
                .map(|r| Classification::Ranking(*r))
                .collect(),
            SeasonClassification::Set(set) => {
                let mut seen = HashSet::new();
                set.split_whitespace()
                    .filter(|token| seen.insert(*token))
                    .map(Classification::from_token)
                    .collect()
            }
        }
    }
}

impl fmt::Display for SeasonClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_db_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeasonMetadata {
    pub years: YearRange,
    pub classification: SeasonClassification,
    pub window: DayWindow,
    pub playlist_id: String,
}

impl SeasonMetadata {
    /// Year bounds are derived from the window.
    pub fn new(classification: SeasonClassification, window: DayWindow, playlist_id: String) -> Self {
        SeasonMetadata {
            years: window.year_range(),
            classification,
            window,
            playlist_id,
        }
    }
}

// =============================================================================
// Scores
// =============================================================================

/// Score snapshot for an artist id or an artist group key.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtistScore {
    pub subject: String,
    pub as_of: NaiveDate,
    pub score: f64,
}
