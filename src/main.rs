use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli_style;

use cli_style::{
    get_prompt, get_styles, print_error, print_field, print_goodbye, print_help, print_nothing,
    print_outcome, print_published, print_score, print_section_footer, print_section_header,
    print_welcome, CommandHelp, TableBuilder, Tone,
};

use tunecapsule::catalog_store::{CatalogStore, SqliteCatalogStore};
use tunecapsule::classify::{Classifier, ClassifyOutcome, Project, RenameConfirmation};
use tunecapsule::config::{AppConfig, CliConfig, FileConfig};
use tunecapsule::providers::{JsonLibraryProvider, JsonPlaylistPublisher};
use tunecapsule::scoring::ScoringEngine;
use tunecapsule::season::SeasonEngine;

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Path to the SQLite catalog database. Defaults to
    /// `<library-dir>/tunecapsule.db`.
    #[clap(long = "db", value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding `albums/` metadata and `playlists/`.
    #[clap(long, value_parser = parse_path)]
    pub library_dir: Option<PathBuf>,
}

#[derive(Parser)]
#[command(styles=get_styles(),name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Classifies albums with a ranking (A, B, C, E) or a certification symbol.
    Classify {
        classification: String,

        #[clap(required = true)]
        album_ids: Vec<String>,

        /// Only classify these track ids (comma separated).
        #[clap(long, value_delimiter = ',')]
        tracks: Vec<String>,

        /// Store the release under this name instead of the album name.
        #[clap(long)]
        name: Option<String>,
    },

    /// Creates or refreshes seasons, e.g. `season 2020 3`, `season update 2019`,
    /// `season 2015-19 🔂`.
    Season {
        #[clap(required = true, allow_hyphen_values = true)]
        query: Vec<String>,

        /// Publish newly created seasons to this playlist.
        #[clap(long)]
        playlist: Option<String>,
    },

    /// Shows the score of an artist.
    Score {
        artist_id: String,

        /// Score as of this day (YYYY-MM-DD). Defaults to today.
        #[clap(long)]
        as_of: Option<NaiveDate>,
    },

    /// Lists stored season metadata.
    Seasons,

    /// Shows the paths of the current catalog and library.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const COMMANDS_HELP: &[CommandHelp] = &[
    CommandHelp {
        name: "classify",
        args: "<classification> <album_id>... [--tracks ids] [--name name]",
        description: "Rank or certify albums",
    },
    CommandHelp {
        name: "score",
        args: "<artist_id> [--as-of day]",
        description: "Show an artist score",
    },
    CommandHelp {
        name: "season",
        args: "[update] [years] [slot|classification] [--playlist id]",
        description: "Publish seasons",
    },
    CommandHelp {
        name: "seasons",
        args: "",
        description: "List stored seasons",
    },
    CommandHelp {
        name: "where",
        args: "",
        description: "Show catalog and library paths",
    },
    CommandHelp {
        name: "help",
        args: "",
        description: "Show this help",
    },
    CommandHelp {
        name: "exit",
        args: "",
        description: "Close this program",
    },
];

/// Asks on the terminal before an artist's stored name is replaced.
struct TerminalRenameConfirmation;

impl RenameConfirmation for TerminalRenameConfirmation {
    fn confirm_rename(&self, artist_id: &str, old_name: &str, new_name: &str) -> bool {
        print_outcome(
            Tone::Caution,
            &format!(
                "Artist {} was stored as '{}' but is now called '{}'. Rename? [y/N]",
                artist_id, old_name, new_name
            ),
        );
        cli_style::flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

struct Services {
    config: AppConfig,
    store: Arc<SqliteCatalogStore>,
    classifier: Classifier,
    seasons: SeasonEngine,
    scoring: ScoringEngine,
}

impl Services {
    fn new(config: AppConfig) -> Result<Self> {
        info!("Opening SQLite catalog database at {:?}...", config.db_path);
        let store = Arc::new(SqliteCatalogStore::new(&config.db_path)?);
        let provider = Arc::new(JsonLibraryProvider::new(&config.library_dir));
        let publisher = Arc::new(JsonPlaylistPublisher::new(&config.library_dir)?);

        let classifier = Classifier::new(
            store.clone(),
            provider,
            Arc::new(TerminalRenameConfirmation),
        );
        let seasons = SeasonEngine::new(store.clone(), publisher, config.seasons.clone());
        let scoring = ScoringEngine::new(store.clone());
        Ok(Services {
            config,
            store,
            classifier,
            seasons,
            scoring,
        })
    }

    fn classify(
        &self,
        classification: &str,
        album_ids: Vec<String>,
        tracks: Vec<String>,
        name: Option<String>,
    ) -> CommandExecutionResult {
        if album_ids.len() > 1 && (!tracks.is_empty() || name.is_some()) {
            return CommandExecutionResult::Error(
                "--tracks and --name apply to a single album".to_string(),
            );
        }
        let projects: Vec<Project> = album_ids
            .into_iter()
            .map(|album_id| Project {
                album_id: Some(album_id),
                name: name.clone(),
                track_ids: tracks.clone(),
            })
            .collect();

        let report = match self.classifier.classify(&projects, classification) {
            Ok(report) => report,
            Err(err) => return CommandExecutionResult::Error(err.to_string()),
        };

        print_section_header("Classification");
        for entry in &report.entries {
            let tone = match &entry.outcome {
                ClassifyOutcome::Failed(_) => Tone::Failed,
                ClassifyOutcome::Conflict { .. } | ClassifyOutcome::Skipped { .. } => Tone::Caution,
                ClassifyOutcome::Unchanged => Tone::Unchanged,
                _ => Tone::Done,
            };
            print_outcome(tone, &entry.to_string());
        }
        print_section_footer();
        CommandExecutionResult::Ok
    }

    fn season(&self, query: &[String], playlist: Option<&str>) -> CommandExecutionResult {
        let query = query.join(" ");
        match self.seasons.run(&query, playlist) {
            Ok(published) => {
                print_section_header("Seasons");
                if published.is_empty() {
                    print_nothing("No season had eligible tracks");
                }
                for season in &published {
                    print_published(season);
                }
                print_section_footer();
                CommandExecutionResult::Ok
            }
            Err(err) => CommandExecutionResult::Error(err.to_string()),
        }
    }

    fn score(&self, artist_id: &str, as_of: Option<NaiveDate>) -> CommandExecutionResult {
        let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
        match self.scoring.artist_score(artist_id, as_of) {
            Ok(score) => {
                print_section_header(&format!("Score of {}", artist_id));
                print_field("As of", &as_of.to_string());
                print_score(&score);
                print_section_footer();
                CommandExecutionResult::Ok
            }
            Err(err) => CommandExecutionResult::Error(format!("{:#}", err)),
        }
    }

    fn list_seasons(&self) -> CommandExecutionResult {
        let seasons = match self.store.list_seasons() {
            Ok(seasons) => seasons,
            Err(err) => return CommandExecutionResult::Error(format!("{:#}", err)),
        };

        print_section_header("Stored Seasons");
        if seasons.is_empty() {
            print_nothing("No seasons published yet");
            print_section_footer();
            return CommandExecutionResult::Ok;
        }
        let mut table = TableBuilder::new(&["Years", "Season", "Start", "Stop", "Playlist"]);
        for season in seasons {
            table.add_row(vec![
                season.years.to_string(),
                season.classification.to_string(),
                season
                    .window
                    .start
                    .map_or("-".to_string(), |d| d.to_string()),
                season
                    .window
                    .stop
                    .map_or("-".to_string(), |d| d.to_string()),
                season.playlist_id,
            ]);
        }
        table.print();
        print_section_footer();
        CommandExecutionResult::Ok
    }

    fn print_where(&self) {
        print_section_header("Paths");
        print_field("Catalog", &self.config.db_path.display().to_string());
        print_field("Library", &self.config.library_dir.display().to_string());
        print_field(
            "Autoseasons",
            &format!(
                "about {} tracks, batches of {}",
                self.config.seasons.ideal_autoseason_length,
                self.config.seasons.playlist_batch_size
            ),
        );
        print_section_footer();
    }
}

fn execute_command(line: String, services: &Services) -> CommandExecutionResult {
    if line.trim().is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());
    if args.first().map(String::as_str) == Some("help") {
        print_help(COMMANDS_HELP);
        return CommandExecutionResult::Ok;
    }

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => match cli.command {
            InnerCommand::Classify {
                classification,
                album_ids,
                tracks,
                name,
            } => services.classify(&classification, album_ids, tracks, name),
            InnerCommand::Season { query, playlist } => {
                services.season(&query, playlist.as_deref())
            }
            InnerCommand::Score { artist_id, as_of } => services.score(&artist_id, as_of),
            InnerCommand::Seasons => services.list_seasons(),
            InnerCommand::Where => {
                services.print_where();
                CommandExecutionResult::Ok
            }
            InnerCommand::Exit => CommandExecutionResult::Exit,
        },
        Err(e) => {
            println!("{}", e);
            CommandExecutionResult::Ok
        }
    }
}

#[derive(rustyline_derive::Hinter)]
struct MyHelper {
    commands_names: Vec<String>,
}

impl MyHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        MyHelper { commands_names }
    }
}

impl Completer for MyHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for MyHelper {}
impl Validator for MyHelper {}
impl Helper for MyHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        library_dir: cli_args.library_dir,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;
    let services = Services::new(config)?;

    print_welcome(
        &services.config.db_path.display().to_string(),
        &services.config.library_dir.display().to_string(),
    );

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<MyHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(MyHelper::new()));

    let prompt = get_prompt();
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &services) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        print_error(&err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                print_error(&format!("{:?}", e));
                break;
            }
        }
    }
    print_goodbye();
    Ok(())
}
