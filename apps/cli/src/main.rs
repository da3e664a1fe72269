//! dunning CLI: overdue invoice notices from a receivables workbook.
//!
//! Reads a spreadsheet, groups invoice lines by customer, and delivers one
//! overdue notice per customer by SMTP, HTML file, terminal, spreadsheet
//! export, or `.eml` draft.

mod commands;
mod prompt;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
