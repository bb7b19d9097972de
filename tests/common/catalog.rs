//! A file-backed catalog wired to in-memory collaborators.

use super::fixtures::{AcceptRenames, FakeLibrary, FakePlaylists};
use std::sync::Arc;
use tempfile::TempDir;
use tunecapsule::catalog_store::SqliteCatalogStore;
use tunecapsule::classify::{ClassificationReport, Classifier, Project, RenameConfirmation};
use tunecapsule::providers::AlbumMetadata;
use tunecapsule::season::{SeasonEngine, SeasonSettings};

pub struct TestCatalog {
    pub store: Arc<SqliteCatalogStore>,
    pub library: Arc<FakeLibrary>,
    pub playlists: Arc<FakePlaylists>,
    _temp_dir: TempDir,
}

impl TestCatalog {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("catalog.db");
        let store =
            Arc::new(SqliteCatalogStore::new(&db_path).expect("Failed to create catalog store"));
        TestCatalog {
            store,
            library: Arc::new(FakeLibrary::default()),
            playlists: Arc::new(FakePlaylists::default()),
            _temp_dir: temp_dir,
        }
    }

    pub fn add_album(&self, album: AlbumMetadata) {
        self.library.put(album);
    }

    pub fn classifier_with(&self, confirmation: Arc<dyn RenameConfirmation>) -> Classifier {
        Classifier::new(self.store.clone(), self.library.clone(), confirmation)
    }

    pub fn classifier(&self) -> Classifier {
        self.classifier_with(Arc::new(AcceptRenames))
    }

    /// Classifies whole albums and panics if the call itself fails.
    pub fn classify(&self, classification: &str, album_ids: &[&str]) -> ClassificationReport {
        let projects: Vec<Project> = album_ids.iter().map(|id| Project::album(*id)).collect();
        self.classifier()
            .classify(&projects, classification)
            .expect("classification failed")
    }

    pub fn seasons_with(&self, settings: SeasonSettings) -> SeasonEngine {
        SeasonEngine::new(self.store.clone(), self.playlists.clone(), settings)
    }

    pub fn seasons(&self) -> SeasonEngine {
        self.seasons_with(SeasonSettings::default())
    }
}
