//! CLI command definitions, routing, and tracing setup.

use std::path::Path;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use dunning_core::{
    ChoiceSource, ProgressReporter, ask_workbook_path, build_sink, choose_output_mode,
    deliver_all, prepare,
};
use dunning_shared::{AppConfig, init_config, load_config};
use dunning_storage::PreferenceStore;
use tracing::info;

use crate::prompt::{CliProgress, TerminalChoices, spinner};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// dunning: overdue invoice notices from a receivables workbook.
#[derive(Parser)]
#[command(
    name = "dunning",
    version,
    about = "Generate overdue invoice notices per customer from a spreadsheet.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Without a subcommand the interactive run starts.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

const CRATES: [&str; 6] = [
    "dunning",
    "dunning_core",
    "dunning_shared",
    "dunning_workbook",
    "dunning_render",
    "dunning_storage",
];

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        None => cmd_run(),
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Interactive run
// ---------------------------------------------------------------------------

fn cmd_run() -> Result<()> {
    let config: AppConfig = load_config()?;
    let mut prefs = PreferenceStore::open();
    info!(prefs = %prefs.path().display(), "preferences opened");

    let bar = spinner();
    let mut source = TerminalChoices::new(bar.clone());
    let progress = CliProgress::new(bar);

    source.show("=== Overdue Notice Generator ===");
    source.show("Creates overdue payment notices per customer from a spreadsheet.");
    source.show("");

    let default = config.input.default_workbook.as_deref().map(Path::new);
    let path = ask_workbook_path(&mut source, default)?;
    let run = prepare(&path, &config, &mut source, &mut prefs, &progress)?;
    progress.phase("Waiting for output choice");
    source.show(&format!("Prepared {} notices", run.notices.len()));

    let mode = choose_output_mode(&mut source)?;
    info!(?mode, "output mode selected");
    let mut sink = build_sink(mode, &config, &run, &mut source, &mut prefs)?;
    let summary = deliver_all(&run.notices, sink.as_mut(), &mut source, &progress)?;
    progress.done();

    println!();
    println!("  Run complete!");
    println!("  Notices:   {}", run.notices.len());
    println!("  Delivered: {}", summary.delivered);
    println!("  Skipped:   {}", summary.skipped);
    println!("  Failed:    {}", summary.failed);
    for failure in &summary.failures {
        println!("    - {failure}");
    }
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
