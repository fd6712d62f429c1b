use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};

use literary_lens::catalog::YearRange;
use literary_lens::{CatalogFilter, Command, Config, DraftCommand, HistoryCommand};

#[derive(Parser, Debug)]
#[command(
    name = "literary-lens",
    version,
    about = "Compare text against a literary catalog and translate it"
)]
struct Cli {
    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings", global = true)]
    read_settings: Option<String>,

    /// Book catalog JSON (overrides settings [catalog] path)
    #[arg(long = "catalog", global = true)]
    catalog: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// List catalog books
    Books {
        #[command(flatten)]
        filter: FilterArgs,

        /// Look up books by title or author only
        #[arg(long = "lookup")]
        lookup: Option<String>,
    },
    /// Show books grouped into literary periods
    Timeline {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Analyze stdin text against the selected books
    Analyze {
        /// Book id to compare against (repeatable)
        #[arg(short = 'b', long = "book", required = true)]
        books: Vec<u64>,

        /// Restrict to these dimensions (themes, theory, temporal, geographic, genre, linguistic)
        #[arg(long = "only", value_delimiter = ',')]
        only: Vec<String>,
    },
    /// Translate stdin text
    Translate {
        /// Source language code ("auto" to detect, "spanglish" for word-by-word Spanish)
        #[arg(short = 'f', long = "from", default_value = "auto")]
        from: String,

        /// Target language code
        #[arg(short = 't', long = "to", default_value = "en")]
        to: String,
    },
    /// Detect the language of stdin text
    Detect,
    /// List supported language codes
    Languages,
    /// Manage saved analyses
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Manage the saved text draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
    /// Run the JSON HTTP API
    Serve {
        /// Listen address (default from settings [server] addr)
        #[arg(long = "addr")]
        addr: Option<String>,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Match title, author, themes or abstract
    #[arg(short = 's', long = "search")]
    search: Option<String>,

    /// Genre (poetry, history, biography, autobiography, diaspora, "the body")
    #[arg(short = 'g', long = "genre")]
    genre: Option<String>,

    /// Connecting theory
    #[arg(long = "theory")]
    theory: Option<String>,

    /// Inclusive year range, e.g. 1900-1950
    #[arg(short = 'y', long = "years")]
    years: Option<String>,
}

impl FilterArgs {
    fn into_filter(self) -> Result<CatalogFilter> {
        let years = self.years.as_deref().map(YearRange::parse).transpose()?;
        Ok(CatalogFilter {
            search: self.search,
            genre: self.genre,
            theory: self.theory,
            years,
        })
    }
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List saved analyses, newest first
    List,
    /// Print one saved analysis as JSON
    Show { id: u64 },
    /// Delete one saved analysis
    Delete { id: u64 },
    /// Delete every saved analysis
    Clear,
    /// Write all saved analyses to a JSON file
    Export {
        #[arg(long = "dir", default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum DraftAction {
    /// Save stdin as the draft
    Save,
    /// Print the saved draft
    Show,
    /// Remove the saved draft
    Clear,
}

impl CliCommand {
    fn into_command(self) -> Result<Command> {
        Ok(match self {
            CliCommand::Books { filter, lookup } => Command::Books {
                filter: filter.into_filter()?,
                lookup,
            },
            CliCommand::Timeline { filter } => Command::Timeline {
                filter: filter.into_filter()?,
            },
            CliCommand::Analyze { books, only } => Command::Analyze { books, only },
            CliCommand::Translate { from, to } => Command::Translate { from, to },
            CliCommand::Detect => Command::Detect,
            CliCommand::Languages => Command::Languages,
            CliCommand::History { action } => Command::History(match action {
                HistoryAction::List => HistoryCommand::List,
                HistoryAction::Show { id } => HistoryCommand::Show(id),
                HistoryAction::Delete { id } => HistoryCommand::Delete(id),
                HistoryAction::Clear => HistoryCommand::Clear,
                HistoryAction::Export { dir } => HistoryCommand::Export { dir },
            }),
            CliCommand::Draft { action } => Command::Draft(match action {
                DraftAction::Save => DraftCommand::Save,
                DraftAction::Show => DraftCommand::Show,
                DraftAction::Clear => DraftCommand::Clear,
            }),
            CliCommand::Serve { addr } => Command::Serve { addr },
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    literary_lens::logging::init(cli.verbose)?;

    let command = cli.command.into_command()?;
    let input = if command.needs_input() {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        let text = String::from_utf8(buffer).map_err(|_| anyhow!("stdin must be UTF-8 text"))?;
        Some(text)
    } else {
        None
    };

    let output = literary_lens::run(
        Config {
            settings_path: cli.read_settings,
            catalog_path: cli.catalog,
            command,
        },
        input,
    )
    .await?;

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
