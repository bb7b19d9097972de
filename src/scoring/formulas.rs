//! Score formulas (v1.0).
//!
//! Both scores take the artist's records as input and ignore anything
//! released after `as_of`.

use crate::catalog_store::{Ranking, Release};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Length of an average song, used to turn album duration into track units.
pub const STANDARD_TRACK_SEC: f64 = 210.0;

/// Releases under both limits count per track ("multi-singles").
pub const SINGLE_MAX_TRACKS: usize = 5;
pub const SINGLE_MAX_DURATION_SEC: u64 = 15 * 60;

/// Albums in `[15, 63)` minutes earn the larger bonus.
pub const LONG_ALBUM_BONUS_MAX_SEC: u64 = 63 * 60;

/// Share of A-ranked time the snapshot window must keep.
pub const SNAPSHOT_DOMINANCE_RATIO: f64 = 0.70;

pub const TROPHY_CERTIFICATION: &str = "🏆";
pub const TROPHY_STANDARD: f64 = 12.0;
pub const REPEAT_CERTIFICATION: &str = "🔂";
pub const REPEAT_PER_TRACK: f64 = 0.5;
pub const HEADPHONES_CERTIFICATION: &str = "🎧";
pub const HEADPHONES_PER_TRACK: f64 = 0.25;

/// Value of a release in track units before ranking weight is applied.
pub fn project_value(release: &Release) -> f64 {
    let duration_sec = release.duration_sec();
    if release.distinct_track_count() < SINGLE_MAX_TRACKS
        && duration_sec < SINGLE_MAX_DURATION_SEC
    {
        return release.track_count() as f64;
    }
    let bonus = if (SINGLE_MAX_DURATION_SEC..LONG_ALBUM_BONUS_MAX_SEC).contains(&duration_sec) {
        2.0
    } else {
        1.0
    };
    duration_sec as f64 / STANDARD_TRACK_SEC + bonus
}

/// Contribution of one certification record; unknown tokens count nothing.
pub fn certification_value(certification: &Release) -> f64 {
    let tracks = certification.track_count() as f64;
    match certification.classification.as_str() {
        TROPHY_CERTIFICATION => {
            (TROPHY_STANDARD - Ranking::A.weight() * project_value(certification)).abs()
        }
        REPEAT_CERTIFICATION => REPEAT_PER_TRACK * tracks,
        HEADPHONES_CERTIFICATION => HEADPHONES_PER_TRACK * tracks,
        _ => 0.0,
    }
}

/// "Street Cred": weighted volume of ranked music plus certification bonuses.
pub fn cumulative_score(rankings: &[Release], certifications: &[Release], as_of: NaiveDate) -> f64 {
    let ranked: f64 = rankings
        .iter()
        .filter(|r| r.release_day <= as_of)
        .filter_map(|r| r.ranking().map(|rank| rank.weight() * project_value(r)))
        .sum();
    let certified: f64 = certifications
        .iter()
        .filter(|c| c.release_day <= as_of)
        .map(certification_value)
        .sum();
    ranked + certified
}

/// "Heat Check": minutes of recent music that stays top-ranked and mostly A.
///
/// Walks newest first and stops at the first release ranked below the top
/// two. Durations gather per rank as pending; they are committed whenever the
/// A share of committed plus pending time exceeds the dominance ratio.
/// Whatever is still pending at the end is dropped.
pub fn snapshot_score(rankings: &[Release], as_of: NaiveDate) -> f64 {
    let mut history: Vec<&Release> = rankings.iter().filter(|r| r.release_day <= as_of).collect();
    history.sort_by(|a, b| {
        b.release_day
            .cmp(&a.release_day)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut committed: HashMap<Ranking, f64> = HashMap::new();
    let mut pending: HashMap<Ranking, f64> = HashMap::new();
    for release in history {
        let Some(rank) = release.ranking().filter(Ranking::is_top_two) else {
            break;
        };
        *pending.entry(rank).or_default() += release.duration_sec() as f64 / 60.0;

        let total: f64 = committed.values().chain(pending.values()).sum();
        let a_time = committed.get(&Ranking::A).copied().unwrap_or(0.0)
            + pending.get(&Ranking::A).copied().unwrap_or(0.0);
        if total > 0.0 && a_time / total > SNAPSHOT_DOMINANCE_RATIO {
            for (rank, minutes) in pending.drain() {
                *committed.entry(rank).or_default() += minutes;
            }
        }
    }
    committed.values().sum()
}
