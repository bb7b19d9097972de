//! TuneCapsule Library
//!
//! Music release classification, seasonal playlist generation and artist
//! scoring over a local SQLite catalog.

pub mod catalog_store;
pub mod classify;
pub mod config;
pub mod errors;
pub mod providers;
pub mod scoring;
pub mod season;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use classify::{ClassificationReport, Classifier, Project, RenameConfirmation};
pub use errors::{TuneCapsuleError, TuneCapsuleResult};
pub use providers::{
    JsonLibraryProvider, JsonPlaylistPublisher, MusicCatalogProvider, PlaylistPublisher,
};
pub use scoring::{ScoreBreakdown, ScoringEngine};
pub use season::{PublishedSeason, SeasonEngine, SeasonSettings};
