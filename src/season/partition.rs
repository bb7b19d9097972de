//! Auto-partitioning of time into windows of roughly the ideal track count.

use super::content::{distinct_track_count, eligible_releases};
use crate::catalog_store::{beginning_of_year, CatalogStore, DayWindow, SeasonClassification};
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

const AUTOSEASON: SeasonClassification = SeasonClassification::Slot(1);

pub struct Partitioner<'a> {
    store: &'a dyn CatalogStore,
    excluded_certifications: &'a [String],
    ideal_length: usize,
}

impl<'a> Partitioner<'a> {
    pub fn new(
        store: &'a dyn CatalogStore,
        excluded_certifications: &'a [String],
        ideal_length: usize,
    ) -> Self {
        Self {
            store,
            excluded_certifications,
            ideal_length,
        }
    }

    /// Distinct autoseason-eligible tracks inside `window`.
    pub fn track_count(&self, window: DayWindow) -> Result<usize> {
        let releases = eligible_releases(
            self.store,
            &AUTOSEASON,
            window,
            self.excluded_certifications,
        )?;
        Ok(distinct_track_count(&releases))
    }

    pub fn year_track_count(&self, year: i32) -> Result<usize> {
        self.track_count(DayWindow::for_years(year, year))
    }

    /// Stop date of the autoseason starting at `start`.
    ///
    /// Walks release days accumulating new distinct tracks. On the day the
    /// ideal is reached, that day is left out only when stopping before it
    /// lands strictly closer to the ideal (and leaves a non-empty window).
    /// Without reaching the ideal the season runs to the end of `max_year`.
    pub fn calculate_end(&self, start: NaiveDate, max_year: i32) -> Result<NaiveDate> {
        let stop_max = beginning_of_year(max_year + 1);
        if start >= stop_max {
            return Ok(stop_max);
        }
        let releases = eligible_releases(
            self.store,
            &AUTOSEASON,
            DayWindow::between(start, stop_max),
            self.excluded_certifications,
        )?;

        let mut seen = HashSet::new();
        let mut total = 0;
        let mut index = 0;
        while index < releases.len() {
            let day = releases[index].release_day;
            let mut day_tracks = 0;
            while index < releases.len() && releases[index].release_day == day {
                day_tracks += releases[index]
                    .track_ids()
                    .filter(|id| seen.insert(*id))
                    .count();
                index += 1;
            }
            total += day_tracks;

            if total >= self.ideal_length {
                let without = total - day_tracks;
                let stop = if without > 0
                    && self.ideal_length - without < total - self.ideal_length
                {
                    day
                } else {
                    day.succ_opt().unwrap_or(day)
                };
                debug!(
                    "Autoseason from {} stops at {} ({} tracks without boundary day, {} with)",
                    start, stop, without, total
                );
                return Ok(stop);
            }
        }
        Ok(stop_max)
    }

    /// Consecutive windows covering `year` from Jan 1. A year without
    /// eligible tracks has no windows, and a trailing stretch without
    /// eligible tracks is folded into the last window.
    pub fn calculate_year(&self, year: i32) -> Result<Vec<DayWindow>> {
        if self.year_track_count(year)? == 0 {
            return Ok(Vec::new());
        }

        let year_end = beginning_of_year(year + 1);
        let mut windows = Vec::new();
        let mut start = beginning_of_year(year);
        while start < year_end {
            let mut stop = self.calculate_end(start, year)?;
            if stop < year_end && self.track_count(DayWindow::between(stop, year_end))? == 0 {
                stop = year_end;
            }
            windows.push(DayWindow::between(start, stop));
            start = stop;
        }
        debug!("Year {} partitions into {} autoseasons", year, windows.len());
        Ok(windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{Classification, Release, SqliteCatalogStore, Track};
    use chrono::Utc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add(store: &SqliteCatalogStore, release_day: NaiveDate, rank: &str, tracks: usize) {
        let name = format!("{} {}", release_day, rank);
        store
            .insert_release(&Release {
                release_day,
                artist_names: vec!["X".to_string()],
                name: name.clone(),
                classification: Classification::from_token(rank),
                tracks: (0..tracks)
                    .map(|i| Track {
                        name: format!("{} {}", name, i),
                        duration_sec: 200,
                        number: i as u32 + 1,
                        id: format!("{}-{}", name, i),
                    })
                    .collect(),
                retrieved_time: Utc::now(),
                artist_group: "x".to_string(),
                album_id: name,
            })
            .unwrap();
    }

    #[test]
    fn test_empty_year_has_no_windows() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        add(&store, day(2020, 3, 1), "C", 50);
        let partitioner = Partitioner::new(&store, &[], 80);
        assert!(partitioner.calculate_year(2020).unwrap().is_empty());
        assert!(partitioner.calculate_year(2019).unwrap().is_empty());
    }

    #[test]
    fn test_boundary_day_excluded_when_strictly_closer() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        add(&store, day(2020, 2, 1), "A", 70);
        add(&store, day(2020, 3, 1), "B", 30);
        let partitioner = Partitioner::new(&store, &[], 80);
        // 80 - 70 = 10 < 100 - 80 = 20
        assert_eq!(
            partitioner.calculate_end(day(2020, 1, 1), 2020).unwrap(),
            day(2020, 3, 1)
        );
    }

    #[test]
    fn test_boundary_day_included_when_closer() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        add(&store, day(2020, 2, 1), "A", 60);
        add(&store, day(2020, 3, 1), "B", 25);
        let partitioner = Partitioner::new(&store, &[], 80);
        // 80 - 60 = 20 > 85 - 80 = 5
        assert_eq!(
            partitioner.calculate_end(day(2020, 1, 1), 2020).unwrap(),
            day(2020, 3, 2)
        );
    }

    #[test]
    fn test_boundary_tie_favours_inclusion() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        add(&store, day(2020, 2, 1), "A", 70);
        add(&store, day(2020, 3, 1), "B", 20);
        let partitioner = Partitioner::new(&store, &[], 80);
        // 80 - 70 = 10 == 90 - 80
        assert_eq!(
            partitioner.calculate_end(day(2020, 1, 1), 2020).unwrap(),
            day(2020, 3, 2)
        );
    }

    #[test]
    fn test_unreached_ideal_runs_to_year_end() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        add(&store, day(2020, 2, 1), "A", 10);
        let partitioner = Partitioner::new(&store, &[], 80);
        assert_eq!(
            partitioner.calculate_end(day(2020, 1, 1), 2020).unwrap(),
            day(2021, 1, 1)
        );
    }

    #[test]
    fn test_year_partition_covers_year_without_empty_windows() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        add(&store, day(2020, 2, 1), "A", 50);
        add(&store, day(2020, 3, 1), "B", 40);
        add(&store, day(2020, 6, 1), "A", 45);
        add(&store, day(2020, 7, 1), "B", 40);
        let partitioner = Partitioner::new(&store, &[], 80);

        let windows = partitioner.calculate_year(2020).unwrap();
        assert_eq!(
            windows,
            vec![
                DayWindow::between(day(2020, 1, 1), day(2020, 3, 2)),
                DayWindow::between(day(2020, 3, 2), day(2021, 1, 1)),
            ]
        );
    }

    #[test]
    fn test_trailing_empty_stretch_folds_into_last_window() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        add(&store, day(2020, 2, 1), "A", 80);
        add(&store, day(2020, 5, 1), "C", 30);
        let partitioner = Partitioner::new(&store, &[], 80);

        let windows = partitioner.calculate_year(2020).unwrap();
        assert_eq!(windows, vec![DayWindow::for_years(2020, 2020)]);
    }
}
