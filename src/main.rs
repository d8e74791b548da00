mod cli;
mod error;
mod interaction;
mod npm;
mod repository;
mod workflow;

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use log::LevelFilter;
use std::process;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = workflow::execute_update(&cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// `--verbose` switches to debug output; `RUST_LOG` still wins when set.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}
