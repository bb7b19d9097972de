mod file_config;

pub use file_config::{FileConfig, SeasonsConfig};

use crate::season::SeasonSettings;
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "tunecapsule.db";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub library_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Root of the local music library (albums/ and playlists/).
    pub library_dir: PathBuf,
    pub seasons: SeasonSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let library_dir = file
            .library_dir
            .map(PathBuf::from)
            .or_else(|| cli.library_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "library_dir must be specified via --library-dir or in config file"
                )
            })?;

        if !library_dir.exists() {
            bail!("Library directory does not exist: {:?}", library_dir);
        }
        if !library_dir.is_dir() {
            bail!("library_dir is not a directory: {:?}", library_dir);
        }

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| library_dir.join(DEFAULT_DB_FILE_NAME));

        let defaults = SeasonSettings::default();
        let seasons_file = file.seasons.unwrap_or_default();
        let seasons = SeasonSettings {
            ideal_autoseason_length: seasons_file
                .ideal_autoseason_length
                .unwrap_or(defaults.ideal_autoseason_length),
            playlist_batch_size: seasons_file
                .playlist_batch_size
                .unwrap_or(defaults.playlist_batch_size),
            excluded_certifications: seasons_file
                .excluded_certifications
                .unwrap_or(defaults.excluded_certifications),
        };
        if seasons.ideal_autoseason_length == 0 {
            bail!("ideal_autoseason_length must be greater than zero");
        }
        if seasons.playlist_batch_size == 0 {
            bail!("playlist_batch_size must be greater than zero");
        }

        Ok(Self {
            db_path,
            library_dir,
            seasons,
        })
    }
}
