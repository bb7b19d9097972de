//! Classification service: turns projects plus a classification token into
//! ranking and certification records.

use super::artist_group::{ensure_artist_group, CanonicalArtists, RenameConfirmation};
use super::record::{build_release, select_tracks, Project};
use super::single_check::{single_check, SingleCheck};
use crate::catalog_store::{in_transaction, CatalogStore, Classification, Release, ReleaseKey};
use crate::errors::{TuneCapsuleError, TuneCapsuleResult};
use crate::providers::{AlbumMetadata, MusicCatalogProvider};
use chrono::Utc;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// A re-rank may drop at most this many tracks minus one.
pub const RERANK_SHRINK_LIMIT: usize = 4;

/// What happened to one project of a classify request.
#[derive(Debug)]
pub enum ClassifyOutcome {
    Inserted,
    Reranked,
    /// Certification extended with `added` new tracks.
    Merged { added: usize },
    /// Already recorded with identical content.
    Unchanged,
    /// Same logical key recorded from a different album.
    Conflict { existing_album_id: String },
    /// Re-rank refused because the track list shrank too much.
    Skipped { existing_tracks: usize, new_tracks: usize },
    /// New ranking is a single of an equal-or-better ranked album.
    Absorbed { album: ReleaseKey },
    Failed(TuneCapsuleError),
}

impl ClassifyOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ClassifyOutcome::Failed(_))
    }
}

impl fmt::Display for ClassifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyOutcome::Inserted => f.write_str("inserted"),
            ClassifyOutcome::Reranked => f.write_str("re-ranked"),
            ClassifyOutcome::Merged { added } => write!(f, "merged {} new tracks", added),
            ClassifyOutcome::Unchanged => f.write_str("unchanged"),
            ClassifyOutcome::Conflict { existing_album_id } => {
                write!(f, "conflict with album {}", existing_album_id)
            }
            ClassifyOutcome::Skipped {
                existing_tracks,
                new_tracks,
            } => write!(
                f,
                "skipped, track list shrank from {} to {}",
                existing_tracks, new_tracks
            ),
            ClassifyOutcome::Absorbed { album } => write!(f, "absorbed by {}", album),
            ClassifyOutcome::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

#[derive(Debug)]
pub struct ReleaseReport {
    pub project: String,
    /// Canonical record built for the project, when it got that far.
    pub release: Option<ReleaseKey>,
    pub classification: String,
    pub track_count: usize,
    pub outcome: ClassifyOutcome,
}

impl fmt::Display for ReleaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.release {
            Some(key) => write!(
                f,
                "{} [{}] {} tracks: {}",
                key, self.classification, self.track_count, self.outcome
            ),
            None => write!(f, "{}: {}", self.project, self.outcome),
        }
    }
}

#[derive(Debug, Default)]
pub struct ClassificationReport {
    pub entries: Vec<ReleaseReport>,
}

impl ClassificationReport {
    pub fn failures(&self) -> impl Iterator<Item = &ReleaseReport> {
        self.entries.iter().filter(|e| e.outcome.is_failure())
    }
}

/// First token of the text, upper-cased. Numeric tokens name season slots.
pub fn parse_classification(classification_text: &str) -> TuneCapsuleResult<Classification> {
    let token = classification_text
        .split_whitespace()
        .next()
        .ok_or_else(|| TuneCapsuleError::InvalidClassification("empty classification".into()))?
        .to_uppercase();
    if token.chars().all(|c| c.is_numeric()) {
        return Err(TuneCapsuleError::InvalidClassification(format!(
            "'{}' is numeric; numbers are reserved for season slots",
            token
        )));
    }
    Ok(Classification::from_token(&token))
}

pub struct Classifier {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn MusicCatalogProvider>,
    confirmation: Arc<dyn RenameConfirmation>,
}

impl Classifier {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        provider: Arc<dyn MusicCatalogProvider>,
        confirmation: Arc<dyn RenameConfirmation>,
    ) -> Self {
        Self {
            store,
            provider,
            confirmation,
        }
    }

    /// Classifies every project. Only an invalid classification text fails
    /// the whole call; per-project problems land in the report.
    pub fn classify(
        &self,
        projects: &[Project],
        classification_text: &str,
    ) -> TuneCapsuleResult<ClassificationReport> {
        let classification = parse_classification(classification_text)?;
        let mut report = ClassificationReport::default();

        for project in projects {
            let entry = match self.classify_project(project, &classification) {
                Ok((release, outcome)) => ReleaseReport {
                    project: project.label().to_string(),
                    release: Some(release.key()),
                    classification: classification.to_string(),
                    track_count: release.track_count(),
                    outcome,
                },
                Err(err) => {
                    warn!("Classification of {} failed: {}", project.label(), err);
                    ReleaseReport {
                        project: project.label().to_string(),
                        release: None,
                        classification: classification.to_string(),
                        track_count: 0,
                        outcome: ClassifyOutcome::Failed(err),
                    }
                }
            };
            info!("{}", entry);
            report.entries.push(entry);
        }
        Ok(report)
    }

    fn classify_project(
        &self,
        project: &Project,
        classification: &Classification,
    ) -> TuneCapsuleResult<(Release, ClassifyOutcome)> {
        let album_id = project.album_id.as_deref().ok_or_else(|| {
            TuneCapsuleError::InvalidClassification("project has no album identity".into())
        })?;
        let album = self
            .provider
            .album(album_id)
            .map_err(|e| TuneCapsuleError::UpstreamData(format!("{:#}", e)))?;
        let artists = CanonicalArtists::from_album(&album)?;
        let release = build_release(
            &album,
            project,
            &artists,
            classification.clone(),
            Utc::now(),
        )?;

        let store = self.store.as_ref();
        let outcome = in_transaction(store, || {
            ensure_artist_group(store, &artists, self.confirmation.as_ref())?;
            match classification {
                Classification::Ranking(_) => self.classify_ranking(&release),
                Classification::Certification(token) => {
                    self.classify_certification(&release, token, &album)
                }
            }
        })?;
        Ok((release, outcome))
    }

    fn insert_after_single_check(&self, release: &Release) -> TuneCapsuleResult<Option<ReleaseKey>> {
        match single_check(self.store.as_ref(), release)? {
            SingleCheck::Insert => {
                self.store.insert_release(release)?;
                Ok(None)
            }
            SingleCheck::Absorbed(album) => Ok(Some(album)),
        }
    }

    fn classify_ranking(&self, release: &Release) -> TuneCapsuleResult<ClassifyOutcome> {
        let Some(existing) = self.store.find_ranking(&release.key())? else {
            return Ok(match self.insert_after_single_check(release)? {
                None => ClassifyOutcome::Inserted,
                Some(album) => ClassifyOutcome::Absorbed { album },
            });
        };

        if existing.album_id != release.album_id {
            return Ok(ClassifyOutcome::Conflict {
                existing_album_id: existing.album_id,
            });
        }
        if existing.same_content(release) {
            return Ok(ClassifyOutcome::Unchanged);
        }
        if existing.track_count() >= release.track_count() + RERANK_SHRINK_LIMIT {
            return Ok(ClassifyOutcome::Skipped {
                existing_tracks: existing.track_count(),
                new_tracks: release.track_count(),
            });
        }

        info!(
            "Re-ranking {} from {} to {}",
            release.key(),
            existing.classification,
            release.classification
        );
        self.store.delete_ranking(&existing.key())?;
        Ok(match self.insert_after_single_check(release)? {
            None => ClassifyOutcome::Reranked,
            Some(album) => ClassifyOutcome::Absorbed { album },
        })
    }

    fn classify_certification(
        &self,
        release: &Release,
        certification: &str,
        album: &AlbumMetadata,
    ) -> TuneCapsuleResult<ClassifyOutcome> {
        let Some(existing) = self
            .store
            .find_certification(&release.key(), certification)?
        else {
            self.store.insert_release(release)?;
            return Ok(ClassifyOutcome::Inserted);
        };

        if existing.album_id != release.album_id {
            return Ok(ClassifyOutcome::Conflict {
                existing_album_id: existing.album_id,
            });
        }

        let existing_ids: HashSet<&str> = existing.track_ids().collect();
        let mut combined: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for id in existing.track_ids().chain(release.track_ids()) {
            if seen.insert(id) {
                combined.push(id.to_string());
            }
        }
        let added = combined
            .iter()
            .filter(|id| !existing_ids.contains(id.as_str()))
            .count();
        if added == 0 {
            return Ok(ClassifyOutcome::Unchanged);
        }

        // Rebuilt in album order; tracks the album no longer lists are kept
        let mut tracks = select_tracks(album, &combined);
        let resolved: HashSet<String> = tracks.iter().map(|t| t.id.clone()).collect();
        tracks.extend(
            existing
                .tracks
                .iter()
                .filter(|t| !resolved.contains(&t.id))
                .cloned(),
        );
        let merged = Release {
            tracks,
            ..release.clone()
        };

        self.store
            .delete_certification(&existing.key(), certification)?;
        self.store.insert_release(&merged)?;
        Ok(ClassifyOutcome::Merged { added })
    }
}
