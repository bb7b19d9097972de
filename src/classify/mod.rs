//! Classification engine.
//!
//! Builds a canonical release record for each project, keeps artist groups
//! consistent, decides between insert, re-rank and merge, and runs the
//! single/album overlap check for new rankings.

mod artist_group;
mod classifier;
mod record;
mod single_check;

pub use artist_group::{ensure_artist_group, CanonicalArtists, RenameConfirmation};
pub use classifier::{
    parse_classification, ClassificationReport, ClassifyOutcome, Classifier, ReleaseReport,
    RERANK_SHRINK_LIMIT,
};
pub use record::{build_release, parse_release_date, select_tracks, Project};
pub use single_check::{single_check, SingleCheck};
