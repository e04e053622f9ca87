use std::io::IsTerminal;

use clap::Parser;
use tracing::Level;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    match commands::run_command(cli) {
        Err(err) if commands::report_designed(&err) => Ok(()),
        other => other,
    }
}
