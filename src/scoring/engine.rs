//! Artist and artist-group scores read from the catalog store.

use super::formulas::{cumulative_score, snapshot_score};
use crate::catalog_store::{group_member_ids, ArtistScore, CatalogStore};
use anyhow::Result;
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreBreakdown {
    pub cumulative: f64,
    pub snapshot: f64,
}

impl ScoreBreakdown {
    pub fn overall(&self) -> f64 {
        self.cumulative + self.snapshot
    }
}

impl fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} (street cred {:.2} + heat check {:.2})",
            self.overall(),
            self.cumulative,
            self.snapshot
        )
    }
}

/// Computes artist scores from the catalog and stores score snapshots.
pub struct ScoringEngine {
    store: Arc<dyn CatalogStore>,
}

impl ScoringEngine {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn artist_score(&self, artist_id: &str, as_of: NaiveDate) -> Result<ScoreBreakdown> {
        let rankings = self.store.rankings_with_artist(artist_id)?;
        let certifications = self.store.certifications_with_artist(artist_id)?;
        Ok(ScoreBreakdown {
            cumulative: cumulative_score(&rankings, &certifications, as_of),
            snapshot: snapshot_score(&rankings, as_of),
        })
    }

    /// Stores the overall score of every member and, under the group key,
    /// the best of them. Returns the group score.
    pub fn store_group_score(&self, artist_group: &str, as_of: NaiveDate) -> Result<f64> {
        let mut group_score: Option<f64> = None;
        for artist_id in group_member_ids(artist_group) {
            let score = self.artist_score(artist_id, as_of)?.overall();
            self.store.store_artist_score(&ArtistScore {
                subject: artist_id.to_string(),
                as_of,
                score,
            })?;
            group_score = Some(group_score.map_or(score, |best| best.max(score)));
        }

        let score = group_score.unwrap_or(0.0);
        self.store.store_artist_score(&ArtistScore {
            subject: artist_group.to_string(),
            as_of,
            score,
        })?;
        debug!("Group {} scores {:.2} as of {}", artist_group, score, as_of);
        Ok(score)
    }
}
