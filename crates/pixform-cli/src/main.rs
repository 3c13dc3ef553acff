//! Pixform command-line front end.
//!
//! Evaluates formulas, prints their trees, and renders them over images.

mod args;
mod commands;
mod error;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command};
use crate::error::CliError;

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    match command {
        Command::Eval {
            expr,
            x,
            y,
            width,
            height,
            no_optimize,
        } => {
            let value = commands::eval(&expr, x, y, width, height, !no_optimize)?;
            writeln!(stdout, "{value}")?;
        }
        Command::Graph {
            expr,
            optimize,
            format,
        } => commands::graph(&expr, optimize, format, &mut stdout)?,
        Command::Render(args) => commands::render(&args)?,
        Command::Preview {
            render,
            width,
            height,
        } => commands::preview(&render, width, height)?,
        Command::Symbols => commands::symbols(&mut stdout)?,
    }
    Ok(())
}
