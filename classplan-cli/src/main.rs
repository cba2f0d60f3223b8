mod app;
mod client;
mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::App;

#[derive(Parser)]
#[command(name = "classplan")]
#[command(about = "Browse a course-section catalog and turn filters into calendar events")]
struct Cli {
    /// Catalog api base url (overrides the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Serve the catalog from a JSON fixture instead of the api
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Log catalog requests and filter derivations to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Filters shared by every command that resolves a selection.
#[derive(Args, Clone)]
pub struct FilterArgs {
    /// Term id or name (e.g. "Spring 2024")
    #[arg(short, long)]
    pub term: String,

    /// Block ids. Defaults to the full-term block.
    #[arg(short, long)]
    pub block: Vec<u32>,

    /// Subject ids
    #[arg(short, long)]
    pub subject: Vec<u32>,

    /// Instructor ids
    #[arg(short, long)]
    pub instructor: Vec<u32>,

    /// Only offer subjects taught by the selected instructors
    #[arg(long)]
    pub subjects_by_instructors: bool,

    /// Offer every instructor, not only those teaching the selected subjects
    #[arg(long)]
    pub no_instructors_by_subjects: bool,
}

/// Filters that only narrow the section search.
#[derive(Args, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Building ids
    #[arg(long)]
    pub building: Vec<u32>,

    /// Room ids
    #[arg(long)]
    pub room: Vec<u32>,

    /// Meeting types by name or number (default: class)
    #[arg(short, long)]
    pub meeting_type: Vec<String>,

    /// Include all-day (e.g. online) sections
    #[arg(long)]
    pub show_all_day: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List terms and their blocks
    Terms,
    /// Resolve the filter fields and show what can be picked
    Options {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show calendar events for a selection
    Events {
        #[command(flatten)]
        search: SearchArgs,

        /// Color override, e.g. instructor-12=#ff8800 (repeatable)
        #[arg(short, long)]
        color: Vec<String>,

        /// Print FullCalendar event JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the CSV export for a selection
    Export {
        #[command(flatten)]
        search: SearchArgs,

        /// Where to write the CSV
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show the catalog import status
    Status {
        /// Wait until a running import finishes
        #[arg(long)]
        wait: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let app = App::load(cli.api_url, cli.fixture)?;

    match cli.command {
        Commands::Terms => commands::terms::run(&app).await,
        Commands::Options { filters, json } => commands::options::run(&app, &filters, json).await,
        Commands::Events {
            search,
            color,
            json,
        } => commands::events::run(&app, &search, &color, json).await,
        Commands::Export { search, output } => commands::export::run(&app, &search, &output).await,
        Commands::Status { wait } => commands::status::run(&app, wait).await,
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
