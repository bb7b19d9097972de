//! Season service: resolves a query to windows, publishes track sequences,
//! and keeps season metadata for later updates.

use super::content::{eligible_releases, ordered_track_ids};
use super::partition::Partitioner;
use super::query::{parse_request, SeasonRequest};
use crate::catalog_store::{
    beginning_of_year, in_transaction, CatalogStore, DayWindow, SeasonClassification,
    SeasonMetadata, YearRange,
};
use crate::errors::{TuneCapsuleError, TuneCapsuleResult};
use crate::providers::PlaylistPublisher;
use crate::scoring::ScoringEngine;
use chrono::{Datelike, Local, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_IDEAL_AUTOSEASON_LENGTH: usize = 80;
pub const DEFAULT_PLAYLIST_BATCH_SIZE: usize = 100;

#[derive(Clone, Debug)]
pub struct SeasonSettings {
    pub ideal_autoseason_length: usize,
    pub playlist_batch_size: usize,
    /// Releases carrying any of these certifications never enter a season.
    pub excluded_certifications: Vec<String>,
}

impl Default for SeasonSettings {
    fn default() -> Self {
        Self {
            ideal_autoseason_length: DEFAULT_IDEAL_AUTOSEASON_LENGTH,
            playlist_batch_size: DEFAULT_PLAYLIST_BATCH_SIZE,
            excluded_certifications: vec!["🚫".to_string()],
        }
    }
}

/// One season written to its playlist.
#[derive(Clone, Debug, PartialEq)]
pub struct PublishedSeason {
    pub metadata: SeasonMetadata,
    pub track_count: usize,
}

/// `"<year> <n>"` or `"<min>-<max> <n>"`.
pub fn autoseason_name(years: YearRange, slot: u32) -> String {
    format!("{} {}", years, slot)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Day scores are taken at: the last day inside the window, never after today.
pub fn score_as_of(window: DayWindow, today: NaiveDate) -> NaiveDate {
    window
        .stop
        .and_then(|stop| stop.pred_opt())
        .map_or(today, |last_day| last_day.min(today))
}

/// Where a season's tracks go.
enum PlaylistTarget {
    Existing(String),
    /// Created under this name when the season is published.
    New(String),
}

pub struct SeasonEngine {
    store: Arc<dyn CatalogStore>,
    publisher: Arc<dyn PlaylistPublisher>,
    scoring: ScoringEngine,
    settings: SeasonSettings,
}

impl SeasonEngine {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        publisher: Arc<dyn PlaylistPublisher>,
        settings: SeasonSettings,
    ) -> Self {
        Self {
            scoring: ScoringEngine::new(store.clone()),
            store,
            publisher,
            settings,
        }
    }

    fn partitioner(&self) -> Partitioner<'_> {
        Partitioner::new(
            self.store.as_ref(),
            &self.settings.excluded_certifications,
            self.settings.ideal_autoseason_length,
        )
    }

    /// Runs a season query. `target_playlist` receives newly created seasons;
    /// without it an existing season keeps its playlist and a new one gets a
    /// freshly created playlist.
    pub fn run(
        &self,
        query: &str,
        target_playlist: Option<&str>,
    ) -> TuneCapsuleResult<Vec<PublishedSeason>> {
        let request = parse_request(query)?;
        info!("Season query '{}' resolved to {:?}", query.trim(), request);

        match request {
            SeasonRequest::UpdateYear(year) => self.update_year(year),
            SeasonRequest::UpdateYears { min_year, max_year } => {
                self.update_years(min_year, max_year)
            }
            SeasonRequest::ReuploadSlot { years, slot } => self
                .reupload(years, &SeasonClassification::Slot(slot))
                .map(|s| vec![s]),
            SeasonRequest::ReuploadSet {
                years,
                classification,
            } => self
                .reupload(years, &SeasonClassification::Set(classification))
                .map(|s| vec![s]),
            SeasonRequest::CreateSlot {
                min_year,
                max_year,
                slot,
            } => self
                .create_slot(min_year, max_year, slot, target_playlist)
                .map(|s| vec![s]),
            SeasonRequest::CreateSet {
                years,
                classification,
            } => self
                .create_set(years, classification, target_playlist)
                .map(|s| vec![s]),
        }
    }

    /// Recomputes and publishes every auto-slot of `year`.
    pub fn update_year(&self, year: i32) -> TuneCapsuleResult<Vec<PublishedSeason>> {
        let windows = self.partitioner().calculate_year(year)?;
        let mut published = Vec::with_capacity(windows.len());
        for (slot, window) in (1..).zip(windows) {
            published.push(self.ensure_autoseason(YearRange::single(year), slot, window)?);
        }
        Ok(published)
    }

    /// Groups years into autoseason ranges of about the ideal length.
    /// Years that fill a season on their own are partitioned individually.
    pub fn update_years(
        &self,
        min_year: Option<i32>,
        max_year: Option<i32>,
    ) -> TuneCapsuleResult<Vec<PublishedSeason>> {
        let max_year = max_year.unwrap_or_else(|| today().year());
        let mut target_min = match min_year {
            Some(year) => year,
            None => self
                .store
                .earliest_ranking_day()?
                .ok_or_else(|| TuneCapsuleError::NoResults("no ranked releases".into()))?
                .year(),
        };
        let ideal = self.settings.ideal_autoseason_length;
        let partitioner = self.partitioner();

        let mut published = Vec::new();
        let mut target_max = target_min;
        let mut total = 0;
        while target_max <= max_year {
            let year_count = partitioner.year_track_count(target_max)?;
            total += year_count;
            if total < ideal && target_max < max_year {
                target_max += 1;
                continue;
            }

            if target_min != target_max && year_count >= ideal {
                // That year gets its own seasons on the next pass
                target_max -= 1;
                total -= year_count;
            }
            if target_min == target_max {
                published.extend(self.update_year(target_min)?);
            } else if total > 0 {
                published.push(self.ensure_autoseason(
                    YearRange::years(target_min, target_max),
                    1,
                    DayWindow::for_years(target_min, target_max),
                )?);
            }
            total = 0;
            target_min = target_max + 1;
            target_max = target_min;
        }
        Ok(published)
    }

    /// Publishes an auto-slot, creating its playlist the first time.
    fn ensure_autoseason(
        &self,
        years: YearRange,
        slot: u32,
        window: DayWindow,
    ) -> TuneCapsuleResult<PublishedSeason> {
        let classification = SeasonClassification::Slot(slot);
        let playlist = match self.store.find_season(years, &classification)? {
            Some(existing) => PlaylistTarget::Existing(existing.playlist_id),
            None => PlaylistTarget::New(autoseason_name(years, slot)),
        };
        self.publish(classification, window, playlist, true)
    }

    fn reupload(
        &self,
        years: YearRange,
        classification: &SeasonClassification,
    ) -> TuneCapsuleResult<PublishedSeason> {
        let existing = self.store.find_season(years, classification)?.ok_or_else(|| {
            TuneCapsuleError::NoResults(format!("no season {} {}", years, classification))
        })?;
        self.publish(
            existing.classification,
            existing.window,
            PlaylistTarget::Existing(existing.playlist_id),
            false,
        )
    }

    fn create_slot(
        &self,
        min_year: i32,
        max_year: i32,
        slot: u32,
        target_playlist: Option<&str>,
    ) -> TuneCapsuleResult<PublishedSeason> {
        let years = YearRange::years(min_year, max_year);
        let end = beginning_of_year(max_year + 1);
        let start = self
            .store
            .latest_slot_stop(min_year, slot)?
            .unwrap_or_else(|| beginning_of_year(min_year));
        if start >= end {
            info!("Lower slots of {} already run to {}", years, end);
            return Err(TuneCapsuleError::NoResults(format!(
                "season {} {} has no days left after the lower slots",
                years, slot
            )));
        }
        let stop = self.partitioner().calculate_end(start, max_year)?;
        let window = DayWindow::between(start, stop);
        let classification = SeasonClassification::Slot(slot);
        let playlist =
            self.playlist_for(window.year_range(), &classification, target_playlist, || {
                autoseason_name(years, slot)
            })?;
        self.publish(classification, window, playlist, true)
    }

    fn create_set(
        &self,
        years: YearRange,
        classification: String,
        target_playlist: Option<&str>,
    ) -> TuneCapsuleResult<PublishedSeason> {
        let window = match (years.min, years.max) {
            (Some(min), Some(max)) => DayWindow::for_years(min, max),
            _ => DayWindow::UNBOUNDED,
        };
        let classification = SeasonClassification::Set(classification);
        let playlist = self.playlist_for(years, &classification, target_playlist, || {
            format!("{} {}", years, classification)
        })?;
        self.publish(classification, window, playlist, true)
    }

    /// The target playlist, else the stored one, else a new playlist.
    fn playlist_for(
        &self,
        years: YearRange,
        classification: &SeasonClassification,
        target_playlist: Option<&str>,
        name: impl FnOnce() -> String,
    ) -> TuneCapsuleResult<PlaylistTarget> {
        if let Some(playlist_id) = target_playlist {
            return Ok(PlaylistTarget::Existing(playlist_id.to_string()));
        }
        if let Some(existing) = self.store.find_season(years, classification)? {
            return Ok(PlaylistTarget::Existing(existing.playlist_id));
        }
        Ok(PlaylistTarget::New(name()))
    }

    /// Scores eligible groups, stores metadata, and replaces the playlist
    /// contents, all inside one catalog transaction. A new playlist is only
    /// created once the season is known to have tracks.
    fn publish(
        &self,
        classification: SeasonClassification,
        window: DayWindow,
        playlist: PlaylistTarget,
        store_metadata: bool,
    ) -> TuneCapsuleResult<PublishedSeason> {
        let store = self.store.as_ref();
        in_transaction(store, || {
            let releases = eligible_releases(
                store,
                &classification,
                window,
                &self.settings.excluded_certifications,
            )?;
            let as_of = score_as_of(window, today());
            let mut group_scores: HashMap<String, f64> = HashMap::new();
            for release in &releases {
                if !group_scores.contains_key(&release.artist_group) {
                    let score = self.scoring.store_group_score(&release.artist_group, as_of)?;
                    group_scores.insert(release.artist_group.clone(), score);
                }
            }

            let track_ids = ordered_track_ids(releases, &group_scores);
            if track_ids.is_empty() {
                let years = window.year_range();
                warn!("Season {} {} has no eligible tracks", years, classification);
                return Err(TuneCapsuleError::NoResults(format!(
                    "season {} {} has no eligible tracks",
                    years, classification
                )));
            }

            let playlist_id = match &playlist {
                PlaylistTarget::Existing(playlist_id) => playlist_id.clone(),
                PlaylistTarget::New(name) => {
                    let playlist_id = self.publisher.create(name)?;
                    info!("Created playlist {} '{}'", playlist_id, name);
                    playlist_id
                }
            };
            let metadata = SeasonMetadata::new(classification.clone(), window, playlist_id);
            if store_metadata {
                store.store_season(&metadata)?;
            }

            self.publisher.clear(&metadata.playlist_id)?;
            for batch in track_ids.chunks(self.settings.playlist_batch_size.max(1)) {
                self.publisher.append(&metadata.playlist_id, batch)?;
            }
            info!(
                "Published {} tracks to playlist {} for season {} {}",
                track_ids.len(),
                metadata.playlist_id,
                metadata.years,
                metadata.classification
            );
            Ok(PublishedSeason {
                track_count: track_ids.len(),
                metadata,
            })
        })
    }
}
