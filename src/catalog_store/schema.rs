//! SQLite schema definitions for the TuneCapsule catalog.
//!
//! List-valued columns (artist names, track names, ...) hold JSON arrays.
//! Dates are ISO-8601 text so that range comparisons sort correctly.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, OnConflict, SqlType, Table, VersionedSchema};

/// Columns shared by the ranking and certification tables.
macro_rules! release_columns {
    () => {
        &[
            sqlite_column!("release_day", &SqlType::Text, non_null = true),
            sqlite_column!("artist_names", &SqlType::Text, non_null = true), // JSON array
            sqlite_column!("name", &SqlType::Text, non_null = true),
            sqlite_column!("classification", &SqlType::Text, non_null = true),
            sqlite_column!("track_names", &SqlType::Text, non_null = true), // JSON array
            sqlite_column!("track_durations_sec", &SqlType::Text, non_null = true), // JSON array
            sqlite_column!("track_numbers", &SqlType::Text, non_null = true), // JSON array
            sqlite_column!("track_ids", &SqlType::Text, non_null = true), // JSON array
            sqlite_column!("retrieved_time", &SqlType::Text, non_null = true),
            sqlite_column!("artist_group", &SqlType::Text, non_null = true),
            sqlite_column!("album_id", &SqlType::Text, non_null = true),
        ]
    };
}

/// One ranking per release.
const RANKING_TABLE: Table = Table {
    name: "ranking",
    columns: release_columns!(),
    primary_key: &["release_day", "artist_names", "name"],
    on_conflict: OnConflict::Abort,
    indices: &[
        ("idx_ranking_group", "artist_group"),
        ("idx_ranking_classification", "classification"),
    ],
};

/// Any number of certifications per release.
const CERTIFICATION_TABLE: Table = Table {
    name: "certification",
    columns: release_columns!(),
    primary_key: &["release_day", "artist_names", "name", "classification"],
    on_conflict: OnConflict::Abort,
    indices: &[
        ("idx_certification_group", "artist_group"),
        ("idx_certification_classification", "classification"),
    ],
};

const SEASON_TABLE: Table = Table {
    name: "season",
    columns: &[
        sqlite_column!("min_year", &SqlType::Integer), // NULL = unbounded
        sqlite_column!("max_year", &SqlType::Integer), // NULL = unbounded
        sqlite_column!("classification", &SqlType::Text, non_null = true),
        sqlite_column!("start_date", &SqlType::Text),
        sqlite_column!("stop_date", &SqlType::Text),
        sqlite_column!("playlist_id", &SqlType::Text, non_null = true),
    ],
    primary_key: &["min_year", "max_year", "classification"],
    on_conflict: OnConflict::Replace,
    indices: &[],
};

const ARTIST_GROUP_TABLE: Table = Table {
    name: "artist_group",
    columns: &[
        sqlite_column!("artist_group", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_id", &SqlType::Text, non_null = true),
    ],
    primary_key: &["artist_group", "artist_id"],
    on_conflict: OnConflict::Ignore,
    indices: &[("idx_artist_group_artist", "artist_id")],
};

const SINGLE_LINK_TABLE: Table = Table {
    name: "single_link",
    columns: &[
        sqlite_column!("single_release_day", &SqlType::Text, non_null = true),
        sqlite_column!("artist_names", &SqlType::Text, non_null = true), // JSON array
        sqlite_column!("single_name", &SqlType::Text, non_null = true),
        sqlite_column!("single_track_names", &SqlType::Text, non_null = true), // JSON array
        sqlite_column!("album_release_day", &SqlType::Text, non_null = true),
        sqlite_column!("album_artist_names", &SqlType::Text, non_null = true), // JSON array
        sqlite_column!("album_name", &SqlType::Text, non_null = true),
        sqlite_column!("album_track_names", &SqlType::Text, non_null = true), // JSON array
    ],
    primary_key: &[
        "single_release_day",
        "artist_names",
        "single_name",
        "single_track_names",
    ],
    on_conflict: OnConflict::Replace,
    indices: &[],
};

const ARTIST_SCORE_TABLE: Table = Table {
    name: "artist_score",
    columns: &[
        sqlite_column!("subject", &SqlType::Text, non_null = true), // artist id or group key
        sqlite_column!("as_of_date", &SqlType::Text, non_null = true),
        sqlite_column!("score", &SqlType::Real, non_null = true),
    ],
    primary_key: &["subject", "as_of_date"],
    on_conflict: OnConflict::Replace,
    indices: &[("idx_artist_score_date", "as_of_date")],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        RANKING_TABLE,
        CERTIFICATION_TABLE,
        SEASON_TABLE,
        ARTIST_GROUP_TABLE,
        SINGLE_LINK_TABLE,
        ARTIST_SCORE_TABLE,
    ],
    migration: None,
}];
