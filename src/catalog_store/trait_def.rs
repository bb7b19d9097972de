//! CatalogStore trait definition.
//!
//! The engines only ever talk to the catalog through this trait, so a store
//! handle can be opened once per session and injected everywhere, and tests
//! can run against an in-memory database.

use super::models::*;
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Trait for catalog storage backends.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Transactions
    // =========================================================================

    /// Opens the write boundary of a top-level operation.
    fn begin(&self) -> Result<()>;

    fn commit(&self) -> Result<()>;

    fn rollback(&self) -> Result<()>;

    // =========================================================================
    // Releases
    // =========================================================================

    /// Get the ranking recorded for a release, if any.
    fn find_ranking(&self, key: &ReleaseKey) -> Result<Option<Release>>;

    /// Get one certification of a release, if recorded.
    fn find_certification(&self, key: &ReleaseKey, certification: &str)
        -> Result<Option<Release>>;

    /// Insert into the ranking or certification table depending on the
    /// release's classification. Fails if the key already exists.
    fn insert_release(&self, release: &Release) -> Result<()>;

    fn delete_ranking(&self, key: &ReleaseKey) -> Result<()>;

    fn delete_certification(&self, key: &ReleaseKey, certification: &str) -> Result<()>;

    /// All rankings whose artist group contains `artist_id`, oldest first.
    fn rankings_with_artist(&self, artist_id: &str) -> Result<Vec<Release>>;

    /// All certifications whose artist group contains `artist_id`, oldest first.
    fn certifications_with_artist(&self, artist_id: &str) -> Result<Vec<Release>>;

    /// Releases carrying any of `classifications` inside `window`, ordered by
    /// release day. Ranking classifications read the ranking table, the rest
    /// read the certification table.
    fn releases_in_window(
        &self,
        classifications: &[Classification],
        window: DayWindow,
    ) -> Result<Vec<Release>>;

    /// Day of the oldest ranked release.
    fn earliest_ranking_day(&self) -> Result<Option<NaiveDate>>;

    // =========================================================================
    // Artist groups
    // =========================================================================

    fn artist_group_members(&self, artist_group: &str) -> Result<Vec<ArtistGroupMember>>;

    fn insert_artist_group_member(&self, member: &ArtistGroupMember) -> Result<()>;

    /// Renames an artist everywhere: group entries, releases and single links.
    /// Returns the number of release rows rewritten.
    fn rename_artist(&self, artist_id: &str, old_name: &str, new_name: &str) -> Result<usize>;

    // =========================================================================
    // Singles
    // =========================================================================

    /// Insert a single link, replacing any link with the same single key.
    fn store_single_link(&self, link: &SingleLink) -> Result<()>;

    fn single_links(&self) -> Result<Vec<SingleLink>>;

    // =========================================================================
    // Seasons
    // =========================================================================

    /// Insert season metadata, replacing any season with the same key.
    fn store_season(&self, season: &SeasonMetadata) -> Result<()>;

    fn find_season(
        &self,
        years: YearRange,
        classification: &SeasonClassification,
    ) -> Result<Option<SeasonMetadata>>;

    /// Latest stop date among the autoseason slots of `year` numbered below `slot`.
    fn latest_slot_stop(&self, year: i32, slot: u32) -> Result<Option<NaiveDate>>;

    fn list_seasons(&self) -> Result<Vec<SeasonMetadata>>;

    // =========================================================================
    // Scores
    // =========================================================================

    /// Insert a score snapshot, replacing any snapshot with the same key.
    fn store_artist_score(&self, score: &ArtistScore) -> Result<()>;

    /// Every snapshot taken on `as_of`, keyed by subject.
    fn artist_scores_at(&self, as_of: NaiveDate) -> Result<HashMap<String, f64>>;
}

/// Runs `operation` between `begin` and `commit`, rolling back on error.
pub fn in_transaction<T, E>(
    store: &dyn CatalogStore,
    operation: impl FnOnce() -> Result<T, E>,
) -> Result<T, E>
where
    E: From<anyhow::Error>,
{
    store.begin()?;
    match operation() {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = store.rollback() {
                tracing::error!("Failed to roll back catalog transaction: {}", rollback_err);
            }
            Err(err)
        }
    }
}
