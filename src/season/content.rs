//! Which releases belong to a season, and in what order their tracks play.

use crate::catalog_store::{
    CatalogStore, Classification, DayWindow, Release, ReleaseKey, SeasonClassification,
};
use anyhow::Result;
use std::collections::{HashMap, HashSet};

/// Releases of `classification` inside `window`, minus releases carrying an
/// excluded certification and singles whose album is itself eligible.
/// Ordered by release day.
pub fn eligible_releases(
    store: &dyn CatalogStore,
    classification: &SeasonClassification,
    window: DayWindow,
    excluded_certifications: &[String],
) -> Result<Vec<Release>> {
    let candidates = store.releases_in_window(&classification.classifications(), window)?;

    let excluded: HashSet<ReleaseKey> = if excluded_certifications.is_empty() {
        HashSet::new()
    } else {
        let exclusions: Vec<Classification> = excluded_certifications
            .iter()
            .map(|c| Classification::Certification(c.clone()))
            .collect();
        store
            .releases_in_window(&exclusions, window)?
            .iter()
            .map(Release::key)
            .collect()
    };
    let candidates: Vec<Release> = candidates
        .into_iter()
        .filter(|r| !excluded.contains(&r.key()))
        .collect();

    let candidate_keys: HashSet<ReleaseKey> = candidates.iter().map(Release::key).collect();
    let absorbed: HashSet<ReleaseKey> = store
        .single_links()?
        .into_iter()
        .filter(|link| candidate_keys.contains(&link.album))
        .map(|link| link.single)
        .collect();

    Ok(candidates
        .into_iter()
        .filter(|r| !absorbed.contains(&r.key()))
        .collect())
}

/// Track ids in release-day order, higher scoring artist groups first within
/// a day. Each id is emitted once.
pub fn ordered_track_ids(
    mut releases: Vec<Release>,
    group_scores: &HashMap<String, f64>,
) -> Vec<String> {
    let score = |release: &Release| group_scores.get(&release.artist_group).copied().unwrap_or(0.0);
    releases.sort_by(|a, b| {
        a.release_day
            .cmp(&b.release_day)
            .then_with(|| score(b).total_cmp(&score(a)))
    });

    let mut seen = HashSet::new();
    releases
        .iter()
        .flat_map(|r| r.track_ids())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Number of distinct eligible track ids.
pub fn distinct_track_count(releases: &[Release]) -> usize {
    releases
        .iter()
        .flat_map(|r| r.track_ids())
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{SingleLink, SqliteCatalogStore, Track};
    use chrono::{NaiveDate, Utc};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, d).unwrap()
    }

    fn release(release_day: NaiveDate, group: &str, name: &str, class: &str, ids: &[&str]) -> Release {
        Release {
            release_day,
            artist_names: vec![group.to_uppercase()],
            name: name.to_string(),
            classification: Classification::from_token(class),
            tracks: ids
                .iter()
                .enumerate()
                .map(|(i, id)| Track {
                    name: id.to_string(),
                    duration_sec: 200,
                    number: i as u32 + 1,
                    id: id.to_string(),
                })
                .collect(),
            retrieved_time: Utc::now(),
            artist_group: group.to_string(),
            album_id: format!("alb-{}", name),
        }
    }

    fn names(releases: &[Release]) -> Vec<&str> {
        releases.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_excluded_certification_removes_release() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let kept = release(day(1, 5), "x", "Kept", "A", &["k1"]);
        let banned = release(day(2, 5), "x", "Banned", "B", &["b1"]);
        let mut ban = banned.clone();
        ban.classification = Classification::from_token("🚫");
        for r in [&kept, &banned, &ban] {
            store.insert_release(r).unwrap();
        }

        let eligible = eligible_releases(
            &store,
            &SeasonClassification::Slot(1),
            DayWindow::for_years(2020, 2020),
            &["🚫".to_string()],
        )
        .unwrap();
        assert_eq!(names(&eligible), vec!["Kept"]);
    }

    #[test]
    fn test_single_dropped_only_when_album_is_eligible() {
        let store = SqliteCatalogStore::in_memory().unwrap();
        let single = release(day(1, 5), "x", "Single", "A", &["s1"]);
        let album = release(day(6, 5), "x", "Album", "B", &["s1", "a2"]);
        store.insert_release(&single).unwrap();
        store.insert_release(&album).unwrap();
        store
            .store_single_link(&SingleLink::between(&single, &album))
            .unwrap();

        let whole_year = eligible_releases(
            &store,
            &SeasonClassification::Slot(1),
            DayWindow::for_years(2020, 2020),
            &[],
        )
        .unwrap();
        assert_eq!(names(&whole_year), vec!["Album"]);

        let before_album = eligible_releases(
            &store,
            &SeasonClassification::Slot(1),
            DayWindow::between(day(1, 1), day(6, 1)),
            &[],
        )
        .unwrap();
        assert_eq!(names(&before_album), vec!["Single"]);

        // Album not part of an "A" season
        let only_a = eligible_releases(
            &store,
            &SeasonClassification::Set("A".to_string()),
            DayWindow::for_years(2020, 2020),
            &[],
        )
        .unwrap();
        assert_eq!(names(&only_a), vec!["Single"]);
    }

    #[test]
    fn test_ordering_by_day_then_score() {
        let releases = vec![
            release(day(3, 1), "low", "L", "A", &["l1", "shared"]),
            release(day(3, 1), "high", "H", "A", &["h1", "shared"]),
            release(day(1, 1), "low", "Early", "B", &["e1"]),
        ];
        let scores = HashMap::from([("low".to_string(), 1.0), ("high".to_string(), 9.0)]);

        assert_eq!(
            ordered_track_ids(releases, &scores),
            vec!["e1", "h1", "shared", "l1"]
        );
    }

    #[test]
    fn test_distinct_track_count() {
        let releases = vec![
            release(day(3, 1), "x", "One", "A", &["t1", "t2"]),
            release(day(3, 2), "x", "Two", "A", &["t2", "t3"]),
        ];
        assert_eq!(distinct_track_count(&releases), 3);
    }
}
