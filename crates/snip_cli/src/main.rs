//! Command-line access to the snippet cache.
//!
//! Provides `snip mgmt` for statistics, listings and maintenance, `snip show`
//! for printing a single snippet, `snip purge-doc` for dropping one
//! document's snippets, and `snip ingest` for feeding the cache from a build.

#![warn(missing_docs)]

mod context;
mod ingest;
mod mgmt;
mod show;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// A snippet cache for documentation builds.
#[derive(Parser, Debug)]
#[command(
    name = "snip",
    version,
    about = "Snippet cache for documentation builds",
    after_help = "A cache directory must not be used by two snip processes at the same time."
)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `snip.toml` configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Snippet management: statistics, listings, maintenance.
    #[command(visible_alias = "m")]
    Mgmt(MgmtArgs),
    /// Print one snippet by ID.
    #[command(visible_alias = "s")]
    Show(ShowArgs),
    /// Drop every snippet of one document.
    PurgeDoc(PurgeDocArgs),
    /// Update the cache from a JSON batch of extracted snippets.
    Ingest(IngestArgs),
}

/// Arguments for the `snip mgmt` subcommand.
#[derive(Parser, Debug)]
pub struct MgmtArgs {
    /// Show snippet statistics.
    #[arg(short, long)]
    pub stat: bool,

    /// List all snippets.
    #[arg(short, long)]
    pub list: bool,

    /// Snippet kinds to list (`d` headline, `c` code, `*` any).
    #[arg(short, long, default_value = "*")]
    pub kinds: String,

    /// Print the summary index.
    #[arg(short = 'i', long)]
    pub dump_index: bool,

    /// Print the effective configuration.
    #[arg(short, long)]
    pub dump_config: bool,

    /// Remove every snippet from the cache.
    #[arg(long)]
    pub purge: bool,
}

/// Arguments for the `snip show` subcommand.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Snippet ID.
    pub id: String,

    /// Print the source location instead of the snippet text.
    #[arg(long)]
    pub location: bool,
}

/// Arguments for the `snip purge-doc` subcommand.
#[derive(Parser, Debug)]
pub struct PurgeDocArgs {
    /// Project name (use "" for unnamed projects).
    pub project: String,

    /// Document name.
    pub docname: String,
}

/// Arguments for the `snip ingest` subcommand.
#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Path to the JSON batch file.
    pub batch: PathBuf,

    /// Project name, overriding the batch and the configuration.
    #[arg(short, long)]
    pub project: Option<String>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a config file.
    pub config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Mgmt(ref args) => mgmt::run(args, &global),
        Command::Show(ref args) => show::run(args, &global),
        Command::PurgeDoc(ref args) => mgmt::purge_doc(args, &global),
        Command::Ingest(ref args) => ingest::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs a stderr `tracing` subscriber for the crates of this workspace.
fn init_tracing(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = format!("snip_cache={level},snip_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
