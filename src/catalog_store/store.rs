//! SQLite-backed catalog store implementation.

use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use crate::sqlite_persistence::migrate_if_needed;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const RELEASE_COLUMNS: &str = "release_day, artist_names, name, classification, track_names, \
     track_durations_sec, track_numbers, track_ids, retrieved_time, artist_group, album_id";

const SEASON_COLUMNS: &str =
    "min_year, max_year, classification, start_date, stop_date, playlist_id";

const SINGLE_LINK_COLUMNS: &str = "single_release_day, artist_names, single_name, \
     single_track_names, album_release_day, album_artist_names, album_name, album_track_names";

/// Matches rows whose `artist_group` key contains the artist id bound to `?1`.
const GROUP_CONTAINS_ARTIST: &str = "instr('+' || artist_group || '+', '+' || ?1 || '+') > 0";

/// A release key before and after an artist rename.
struct RenamedKey {
    release_day: NaiveDate,
    old_names: String,
    new_names: String,
    name: String,
}

/// SQLite-backed catalog store.
///
/// Holds a single connection: the catalog has one writer per session and
/// every top-level operation runs on this handle.
pub struct SqliteCatalogStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("Failed to serialize list column")
}

fn json_column<T: DeserializeOwned>(row: &Row, index: usize) -> rusqlite::Result<T> {
    let text: String = row.get(index)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn release_table(classification: &Classification) -> &'static str {
    match classification {
        Classification::Ranking(_) => "ranking",
        Classification::Certification(_) => "certification",
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl SqliteCatalogStore {
    /// Open (or create) the catalog database at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let mut conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open catalog database")?;
        migrate_if_needed(&mut conn, CATALOG_VERSIONED_SCHEMAS)?;

        let store = SqliteCatalogStore {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
        };
        store.log_summary();
        Ok(store)
    }

    /// A throwaway catalog living only as long as the store.
    pub fn in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migrate_if_needed(&mut conn, CATALOG_VERSIONED_SCHEMAS)?;
        Ok(SqliteCatalogStore {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    fn log_summary(&self) {
        let conn = self.conn();
        let count = |table: &str| -> i64 {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
                .unwrap_or(0)
        };
        info!(
            "Opened catalog: {} rankings, {} certifications, {} seasons",
            count("ranking"),
            count("certification"),
            count("season")
        );
    }

    // =========================================================================
    // Row parsing
    // =========================================================================

    fn parse_release_row(row: &Row) -> rusqlite::Result<Release> {
        let classification: String = row.get(3)?;
        let names: Vec<String> = json_column(row, 4)?;
        let durations: Vec<u32> = json_column(row, 5)?;
        let numbers: Vec<u32> = json_column(row, 6)?;
        let ids: Vec<String> = json_column(row, 7)?;
        if durations.len() != names.len() || numbers.len() != names.len() || ids.len() != names.len()
        {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                "parallel track columns differ in length".into(),
            ));
        }
        let tracks = names
            .into_iter()
            .zip(durations)
            .zip(numbers)
            .zip(ids)
            .map(|(((name, duration_sec), number), id)| Track {
                name,
                duration_sec,
                number,
                id,
            })
            .collect();

        Ok(Release {
            release_day: row.get(0)?,
            artist_names: json_column(row, 1)?,
            name: row.get(2)?,
            classification: Classification::from_token(&classification),
            tracks,
            retrieved_time: row.get(8)?,
            artist_group: row.get(9)?,
            album_id: row.get(10)?,
        })
    }

    fn parse_season_row(row: &Row) -> rusqlite::Result<SeasonMetadata> {
        let classification: String = row.get(2)?;
        Ok(SeasonMetadata {
            years: YearRange {
                min: row.get(0)?,
                max: row.get(1)?,
            },
            classification: SeasonClassification::from_db_str(&classification),
            window: DayWindow {
                start: row.get(3)?,
                stop: row.get(4)?,
            },
            playlist_id: row.get(5)?,
        })
    }

    fn parse_single_link_row(row: &Row) -> rusqlite::Result<SingleLink> {
        Ok(SingleLink {
            single: ReleaseKey {
                release_day: row.get(0)?,
                artist_names: json_column(row, 1)?,
                name: row.get(2)?,
            },
            single_track_names: json_column(row, 3)?,
            album: ReleaseKey {
                release_day: row.get(4)?,
                artist_names: json_column(row, 5)?,
                name: row.get(6)?,
            },
            album_track_names: json_column(row, 7)?,
        })
    }

    fn query_releases(
        conn: &Connection,
        sql: &str,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Vec<Release>> {
        let mut stmt = conn.prepare_cached(sql)?;
        let releases = stmt
            .query_map(params_from_iter(values), Self::parse_release_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(releases)
    }

    fn releases_with_artist(&self, table: &str, artist_id: &str) -> Result<Vec<Release>> {
        let conn = self.conn();
        Self::query_releases(
            &conn,
            &format!(
                "SELECT {} FROM {} WHERE {} ORDER BY release_day, name",
                RELEASE_COLUMNS, table, GROUP_CONTAINS_ARTIST
            ),
            [Value::Text(artist_id.to_string())],
        )
    }

    fn table_releases_in_window(
        conn: &Connection,
        table: &str,
        classifications: &[&str],
        window: DayWindow,
    ) -> Result<Vec<Release>> {
        if classifications.is_empty() {
            return Ok(Vec::new());
        }
        let mut sql = format!(
            "SELECT {} FROM {} WHERE classification IN ({})",
            RELEASE_COLUMNS,
            table,
            placeholders(classifications.len())
        );
        let mut values: Vec<Value> = classifications
            .iter()
            .map(|c| Value::Text(c.to_string()))
            .collect();
        if let Some(start) = window.start {
            sql.push_str(" AND release_day >= ?");
            values.push(Value::Text(start.to_string()));
        }
        if let Some(stop) = window.stop {
            sql.push_str(" AND release_day < ?");
            values.push(Value::Text(stop.to_string()));
        }
        sql.push_str(" ORDER BY release_day, artist_names, name");
        Self::query_releases(conn, &sql, values)
    }

    /// Rewrites the artist name lists of every release in `table` that
    /// references `artist_id`. Returns the keys that changed.
    fn rename_in_release_table(
        conn: &Connection,
        table: &str,
        artist_id: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<Vec<RenamedKey>> {
        let rows: Vec<(NaiveDate, String, String, String)> = {
            let mut stmt = conn.prepare(&format!(
                "SELECT DISTINCT release_day, artist_names, name, artist_group FROM {} WHERE {}",
                table, GROUP_CONTAINS_ARTIST
            ))?;
            let rows = stmt
                .query_map(params![artist_id], |r| {
                    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut renamed = Vec::new();
        for (release_day, names_json, name, artist_group) in rows {
            let mut names: Vec<String> = serde_json::from_str(&names_json)?;
            // Names are stored in the same order as the ids of the group key
            match group_member_ids(&artist_group).position(|id| id == artist_id) {
                Some(position) if position < names.len() => names[position] = new_name.to_string(),
                _ => names
                    .iter_mut()
                    .filter(|n| n.as_str() == old_name)
                    .for_each(|n| *n = new_name.to_string()),
            }
            let new_names_json = to_json(&names)?;
            let updated = conn.execute(
                &format!(
                    "UPDATE {} SET artist_names = ?1 WHERE release_day = ?2 AND artist_names = ?3 AND name = ?4",
                    table
                ),
                params![new_names_json, release_day, names_json, name],
            )?;
            if updated > 0 {
                renamed.push(RenamedKey {
                    release_day,
                    old_names: names_json,
                    new_names: new_names_json,
                    name,
                });
            }
        }
        Ok(renamed)
    }

    /// Points links at the renamed keys. Links of other artists who happen to
    /// share the old name are left alone.
    fn rename_in_single_links(conn: &Connection, renamed: &[RenamedKey]) -> Result<usize> {
        let mut updated = 0;
        for key in renamed {
            updated += conn.execute(
                "UPDATE single_link SET artist_names = ?1 \
                 WHERE single_release_day = ?2 AND artist_names = ?3 AND single_name = ?4",
                params![key.new_names, key.release_day, key.old_names, key.name],
            )?;
            updated += conn.execute(
                "UPDATE single_link SET album_artist_names = ?1 \
                 WHERE album_release_day = ?2 AND album_artist_names = ?3 AND album_name = ?4",
                params![key.new_names, key.release_day, key.old_names, key.name],
            )?;
        }
        Ok(updated)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn begin(&self) -> Result<()> {
        self.conn().execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.conn().execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.conn().execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn find_ranking(&self, key: &ReleaseKey) -> Result<Option<Release>> {
        let conn = self.conn();
        let release = conn
            .query_row(
                &format!(
                    "SELECT {} FROM ranking WHERE release_day = ?1 AND artist_names = ?2 AND name = ?3",
                    RELEASE_COLUMNS
                ),
                params![key.release_day, to_json(&key.artist_names)?, key.name],
                Self::parse_release_row,
            )
            .optional()?;
        Ok(release)
    }

    fn find_certification(
        &self,
        key: &ReleaseKey,
        certification: &str,
    ) -> Result<Option<Release>> {
        let conn = self.conn();
        let release = conn
            .query_row(
                &format!(
                    "SELECT {} FROM certification WHERE release_day = ?1 AND artist_names = ?2 AND name = ?3 AND classification = ?4",
                    RELEASE_COLUMNS
                ),
                params![
                    key.release_day,
                    to_json(&key.artist_names)?,
                    key.name,
                    certification
                ],
                Self::parse_release_row,
            )
            .optional()?;
        Ok(release)
    }

    fn insert_release(&self, release: &Release) -> Result<()> {
        let table = release_table(&release.classification);
        let durations: Vec<u32> = release.tracks.iter().map(|t| t.duration_sec).collect();
        let numbers: Vec<u32> = release.tracks.iter().map(|t| t.number).collect();
        let ids: Vec<&str> = release.track_ids().collect();

        self.conn()
            .execute(
                &format!(
                    "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    table, RELEASE_COLUMNS
                ),
                params![
                    release.release_day,
                    to_json(&release.artist_names)?,
                    release.name,
                    release.classification.as_str(),
                    to_json(&release.track_names())?,
                    to_json(&durations)?,
                    to_json(&numbers)?,
                    to_json(&ids)?,
                    release.retrieved_time,
                    release.artist_group,
                    release.album_id,
                ],
            )
            .with_context(|| format!("Failed to insert {} into {}", release.key(), table))?;
        debug!("Inserted {} [{}] into {}", release.key(), release.classification, table);
        Ok(())
    }

    fn delete_ranking(&self, key: &ReleaseKey) -> Result<()> {
        self.conn().execute(
            "DELETE FROM ranking WHERE release_day = ?1 AND artist_names = ?2 AND name = ?3",
            params![key.release_day, to_json(&key.artist_names)?, key.name],
        )?;
        Ok(())
    }

    fn delete_certification(&self, key: &ReleaseKey, certification: &str) -> Result<()> {
        self.conn().execute(
            "DELETE FROM certification WHERE release_day = ?1 AND artist_names = ?2 AND name = ?3 AND classification = ?4",
            params![
                key.release_day,
                to_json(&key.artist_names)?,
                key.name,
                certification
            ],
        )?;
        Ok(())
    }

    fn rankings_with_artist(&self, artist_id: &str) -> Result<Vec<Release>> {
        self.releases_with_artist("ranking", artist_id)
    }

    fn certifications_with_artist(&self, artist_id: &str) -> Result<Vec<Release>> {
        self.releases_with_artist("certification", artist_id)
    }

    fn releases_in_window(
        &self,
        classifications: &[Classification],
        window: DayWindow,
    ) -> Result<Vec<Release>> {
        let (rankings, certifications): (Vec<&Classification>, Vec<&Classification>) =
            classifications
                .iter()
                .partition(|c| matches!(c, Classification::Ranking(_)));
        let rankings: Vec<&str> = rankings.into_iter().map(Classification::as_str).collect();
        let certifications: Vec<&str> = certifications
            .into_iter()
            .map(Classification::as_str)
            .collect();

        let conn = self.conn();
        let mut releases = Self::table_releases_in_window(&conn, "ranking", &rankings, window)?;
        releases.extend(Self::table_releases_in_window(
            &conn,
            "certification",
            &certifications,
            window,
        )?);
        releases.sort_by_key(|r| r.release_day);
        Ok(releases)
    }

    fn earliest_ranking_day(&self) -> Result<Option<NaiveDate>> {
        let day = self
            .conn()
            .query_row("SELECT MIN(release_day) FROM ranking", [], |r| {
                r.get::<_, Option<NaiveDate>>(0)
            })?;
        Ok(day)
    }

    fn artist_group_members(&self, artist_group: &str) -> Result<Vec<ArtistGroupMember>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT artist_group, artist_name, artist_id FROM artist_group WHERE artist_group = ?1 ORDER BY artist_id",
        )?;
        let members = stmt
            .query_map(params![artist_group], |r| {
                Ok(ArtistGroupMember {
                    artist_group: r.get(0)?,
                    artist_name: r.get(1)?,
                    artist_id: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    fn insert_artist_group_member(&self, member: &ArtistGroupMember) -> Result<()> {
        self.conn().execute(
            "INSERT INTO artist_group (artist_group, artist_name, artist_id) VALUES (?1, ?2, ?3)",
            params![member.artist_group, member.artist_name, member.artist_id],
        )?;
        Ok(())
    }

    fn rename_artist(&self, artist_id: &str, old_name: &str, new_name: &str) -> Result<usize> {
        let conn = self.conn();
        conn.execute(
            "UPDATE artist_group SET artist_name = ?2 WHERE artist_id = ?1",
            params![artist_id, new_name],
        )?;
        let mut renamed = Vec::new();
        for table in ["ranking", "certification"] {
            renamed.extend(Self::rename_in_release_table(
                &conn, table, artist_id, old_name, new_name,
            )?);
        }
        let links = Self::rename_in_single_links(&conn, &renamed)?;
        info!(
            "Renamed artist {} from '{}' to '{}' across {} releases and {} links",
            artist_id,
            old_name,
            new_name,
            renamed.len(),
            links
        );
        Ok(renamed.len())
    }

    fn store_single_link(&self, link: &SingleLink) -> Result<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO single_link ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                SINGLE_LINK_COLUMNS
            ),
            params![
                link.single.release_day,
                to_json(&link.single.artist_names)?,
                link.single.name,
                to_json(&link.single_track_names)?,
                link.album.release_day,
                to_json(&link.album.artist_names)?,
                link.album.name,
                to_json(&link.album_track_names)?,
            ],
        )?;
        Ok(())
    }

    fn single_links(&self) -> Result<Vec<SingleLink>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {} FROM single_link", SINGLE_LINK_COLUMNS))?;
        let links = stmt
            .query_map([], Self::parse_single_link_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    fn store_season(&self, season: &SeasonMetadata) -> Result<()> {
        let conn = self.conn();
        let classification = season.classification.to_db_string();
        // NULL years never collide in the primary key, so replace explicitly
        conn.execute(
            "DELETE FROM season WHERE min_year IS ?1 AND max_year IS ?2 AND classification = ?3",
            params![season.years.min, season.years.max, classification],
        )?;
        conn.execute(
            &format!(
                "INSERT INTO season ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                SEASON_COLUMNS
            ),
            params![
                season.years.min,
                season.years.max,
                classification,
                season.window.start,
                season.window.stop,
                season.playlist_id,
            ],
        )?;
        Ok(())
    }

    fn find_season(
        &self,
        years: YearRange,
        classification: &SeasonClassification,
    ) -> Result<Option<SeasonMetadata>> {
        let season = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {} FROM season WHERE min_year IS ?1 AND max_year IS ?2 AND classification = ?3",
                    SEASON_COLUMNS
                ),
                params![years.min, years.max, classification.to_db_string()],
                Self::parse_season_row,
            )
            .optional()?;
        Ok(season)
    }

    fn latest_slot_stop(&self, year: i32, slot: u32) -> Result<Option<NaiveDate>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM season WHERE min_year = ?1 AND max_year = ?1",
            SEASON_COLUMNS
        ))?;
        let seasons = stmt
            .query_map(params![year], Self::parse_season_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(seasons
            .into_iter()
            .filter(|s| matches!(s.classification, SeasonClassification::Slot(k) if k < slot))
            .filter_map(|s| s.window.stop)
            .max())
    }

    fn list_seasons(&self) -> Result<Vec<SeasonMetadata>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM season ORDER BY min_year, max_year, classification",
            SEASON_COLUMNS
        ))?;
        let seasons = stmt
            .query_map([], Self::parse_season_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(seasons)
    }

    fn store_artist_score(&self, score: &ArtistScore) -> Result<()> {
        self.conn().execute(
            "INSERT INTO artist_score (subject, as_of_date, score) VALUES (?1, ?2, ?3)",
            params![score.subject, score.as_of, score.score],
        )?;
        Ok(())
    }

    fn artist_scores_at(&self, as_of: NaiveDate) -> Result<HashMap<String, f64>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare_cached("SELECT subject, score FROM artist_score WHERE as_of_date = ?1")?;
        let scores = stmt
            .query_map(params![as_of], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<HashMap<String, f64>, _>>()?;
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::in_transaction;
    use chrono::{TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn release(
        release_day: NaiveDate,
        artist: (&str, &str),
        name: &str,
        classification: &str,
        track_count: usize,
    ) -> Release {
        Release {
            release_day,
            artist_names: vec![artist.0.to_string()],
            name: name.to_string(),
            classification: Classification::from_token(classification),
            tracks: (0..track_count)
                .map(|i| Track {
                    name: format!("{} {}", name, i + 1),
                    duration_sec: 200,
                    number: i as u32 + 1,
                    id: format!("{}-{}", name, i + 1),
                })
                .collect(),
            retrieved_time: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            artist_group: artist.1.to_string(),
            album_id: format!("album-{}", name),
        }
    }

    #[test]
    fn test_insert_and_find_ranking() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let ranked = release(day(2020, 3, 1), ("Band", "band"), "Record", "A", 3);
        store.insert_release(&ranked).unwrap();

        let found = store.find_ranking(&ranked.key()).unwrap().unwrap();
        assert_eq!(found, ranked);
        assert!(store.find_certification(&ranked.key(), "A").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_ranking_insert_fails() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let ranked = release(day(2020, 3, 1), ("Band", "band"), "Record", "A", 3);
        store.insert_release(&ranked).unwrap();
        assert!(store.insert_release(&ranked).is_err());
    }

    #[test]
    fn test_many_certifications_per_release() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let first = release(day(2020, 3, 1), ("Band", "band"), "Record", "🔂", 3);
        let second = release(day(2020, 3, 1), ("Band", "band"), "Record", "🎧", 3);
        store.insert_release(&first).unwrap();
        store.insert_release(&second).unwrap();

        assert!(store.find_certification(&first.key(), "🔂").unwrap().is_some());
        assert!(store.find_certification(&first.key(), "🎧").unwrap().is_some());

        store.delete_certification(&first.key(), "🔂").unwrap();
        assert!(store.find_certification(&first.key(), "🔂").unwrap().is_none());
        assert!(store.find_certification(&first.key(), "🎧").unwrap().is_some());
    }

    #[test]
    fn test_rankings_with_artist_matches_whole_ids_only() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        store
            .insert_release(&release(day(2020, 1, 1), ("Ab", "ab"), "One", "A", 2))
            .unwrap();
        store
            .insert_release(&release(day(2020, 2, 1), ("Abc", "abc"), "Two", "B", 2))
            .unwrap();
        let mut duo = release(day(2020, 3, 1), ("Ab", "ab"), "Three", "C", 2);
        duo.artist_names = vec!["Ab".to_string(), "Zed".to_string()];
        duo.artist_group = "ab+zed".to_string();
        store.insert_release(&duo).unwrap();

        let names: Vec<String> = store
            .rankings_with_artist("ab")
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["One", "Three"]);
    }

    #[test]
    fn test_releases_in_window_reads_both_tables() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        store
            .insert_release(&release(day(2020, 1, 1), ("X", "x"), "Start", "A", 2))
            .unwrap();
        store
            .insert_release(&release(day(2020, 5, 31), ("X", "x"), "Inside", "C", 2))
            .unwrap();
        store
            .insert_release(&release(day(2020, 4, 1), ("X", "x"), "Cert", "🔂", 2))
            .unwrap();
        store
            .insert_release(&release(day(2020, 6, 1), ("X", "x"), "Stop", "A", 2))
            .unwrap();

        let window = DayWindow::between(day(2020, 1, 1), day(2020, 6, 1));
        let classifications = vec![
            Classification::Ranking(Ranking::A),
            Classification::Ranking(Ranking::C),
            Classification::Certification("🔂".to_string()),
        ];
        let names: Vec<String> = store
            .releases_in_window(&classifications, window)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Start", "Cert", "Inside"]);

        let unbounded = store
            .releases_in_window(&classifications, DayWindow::UNBOUNDED)
            .unwrap();
        assert_eq!(unbounded.len(), 4);
    }

    #[test]
    fn test_rename_artist_cascades() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let mut duo = release(day(2020, 3, 1), ("Old", "a1"), "Duet", "A", 2);
        duo.artist_names = vec!["Old".to_string(), "Other".to_string()];
        duo.artist_group = "a1+a2".to_string();
        store.insert_release(&duo).unwrap();
        let mut cert = duo.clone();
        cert.classification = Classification::Certification("🔂".to_string());
        store.insert_release(&cert).unwrap();
        store
            .insert_artist_group_member(&ArtistGroupMember {
                artist_group: "a1+a2".to_string(),
                artist_name: "Old".to_string(),
                artist_id: "a1".to_string(),
            })
            .unwrap();
        let single = release(day(2020, 1, 1), ("Old", "a1"), "Lead", "B", 1);
        store.insert_release(&single).unwrap();
        store
            .store_single_link(&SingleLink::between(&single, &duo))
            .unwrap();

        let renamed = store.rename_artist("a1", "Old", "New").unwrap();
        assert_eq!(renamed, 3);

        let mut renamed_key = duo.key();
        renamed_key.artist_names = vec!["New".to_string(), "Other".to_string()];
        assert!(store.find_ranking(&renamed_key).unwrap().is_some());
        assert!(store.find_ranking(&duo.key()).unwrap().is_none());
        assert!(store
            .find_certification(&renamed_key, "🔂")
            .unwrap()
            .is_some());
        assert_eq!(
            store.artist_group_members("a1+a2").unwrap()[0].artist_name,
            "New"
        );
        let link = &store.single_links().unwrap()[0];
        assert_eq!(link.single.artist_names, vec!["New"]);
        assert_eq!(link.album.artist_names, vec!["New", "Other"]);
    }

    #[test]
    fn test_rename_leaves_links_of_namesakes_alone() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let renamed_single = release(day(2020, 1, 1), ("Sam", "s1"), "Spark", "A", 1);
        let renamed_album = release(day(2020, 2, 1), ("Sam", "s1"), "Sparks", "C", 3);
        let namesake_single = release(day(2020, 1, 1), ("Sam", "s2"), "Drift", "A", 1);
        let namesake_album = release(day(2020, 2, 1), ("Sam", "s2"), "Drifting", "C", 3);
        for r in [&renamed_single, &renamed_album, &namesake_single, &namesake_album] {
            store.insert_release(r).unwrap();
        }
        store
            .store_single_link(&SingleLink::between(&renamed_single, &renamed_album))
            .unwrap();
        store
            .store_single_link(&SingleLink::between(&namesake_single, &namesake_album))
            .unwrap();

        store.rename_artist("s1", "Sam", "Samuel").unwrap();

        let links = store.single_links().unwrap();
        let spark = links.iter().find(|l| l.single.name == "Spark").unwrap();
        assert_eq!(spark.single.artist_names, vec!["Samuel"]);
        assert_eq!(spark.album.artist_names, vec!["Samuel"]);
        let drift = links.iter().find(|l| l.single.name == "Drift").unwrap();
        assert_eq!(drift.single, namesake_single.key());
        assert_eq!(drift.album, namesake_album.key());
        assert!(store.find_ranking(&drift.single).unwrap().is_some());
    }

    #[test]
    fn test_store_season_replaces_unbounded_key() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let classification = SeasonClassification::Set("🔂".to_string());
        store
            .store_season(&SeasonMetadata::new(
                classification.clone(),
                DayWindow::UNBOUNDED,
                "first".to_string(),
            ))
            .unwrap();
        store
            .store_season(&SeasonMetadata::new(
                classification.clone(),
                DayWindow::UNBOUNDED,
                "second".to_string(),
            ))
            .unwrap();

        assert_eq!(store.list_seasons().unwrap().len(), 1);
        let found = store
            .find_season(YearRange::UNBOUNDED, &classification)
            .unwrap()
            .unwrap();
        assert_eq!(found.playlist_id, "second");
        assert!(store
            .find_season(YearRange::single(2020), &classification)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_latest_slot_stop_only_considers_lower_slots() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let slots = [
            (1, day(2020, 1, 1), day(2020, 4, 2)),
            (2, day(2020, 4, 2), day(2020, 8, 20)),
            (3, day(2020, 8, 20), day(2021, 1, 1)),
        ];
        for (slot, start, stop) in slots {
            store
                .store_season(&SeasonMetadata::new(
                    SeasonClassification::Slot(slot),
                    DayWindow::between(start, stop),
                    format!("p{}", slot),
                ))
                .unwrap();
        }

        assert_eq!(store.latest_slot_stop(2020, 1).unwrap(), None);
        assert_eq!(store.latest_slot_stop(2020, 3).unwrap(), Some(day(2020, 8, 20)));
        assert_eq!(store.latest_slot_stop(2020, 10).unwrap(), Some(day(2021, 1, 1)));
        assert_eq!(store.latest_slot_stop(2019, 10).unwrap(), None);
    }

    #[test]
    fn test_artist_scores_replace_per_day() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let as_of = day(2020, 12, 31);
        for score in [1.0, 2.5] {
            store
                .store_artist_score(&ArtistScore {
                    subject: "x".to_string(),
                    as_of,
                    score,
                })
                .unwrap();
        }
        let scores = store.artist_scores_at(as_of).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores["x"], 2.5);
        assert!(store.artist_scores_at(day(2021, 1, 1)).unwrap().is_empty());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let ranked = release(day(2020, 3, 1), ("Band", "band"), "Record", "A", 3);

        let result: Result<()> = in_transaction(&store, || {
            store.insert_release(&ranked)?;
            anyhow::bail!("boom")
        });
        assert!(result.is_err());
        assert!(store.find_ranking(&ranked.key()).unwrap().is_none());

        in_transaction(&store, || store.insert_release(&ranked)).unwrap();
        assert!(store.find_ranking(&ranked.key()).unwrap().is_some());
    }

    #[test]
    fn test_reopening_file_database_keeps_records() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("catalog.db");
        let ranked = release(day(2020, 3, 1), ("Band", "band"), "Record", "A", 3);
        {
            let store = SqliteCatalogStore::new(&db_path).unwrap();
            store.insert_release(&ranked).unwrap();
        }
        let store = SqliteCatalogStore::new(&db_path).unwrap();
        assert_eq!(store.db_path(), Some(db_path.as_path()));
        assert_eq!(
            store.earliest_ranking_day().unwrap(),
            Some(day(2020, 3, 1))
        );
    }
}
