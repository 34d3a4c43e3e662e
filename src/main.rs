mod cli;
mod client;
mod commands;
mod config;
mod error;
mod logging;
mod normalize;
mod output;
mod pipeline;
mod prompt;
mod sanitize;
mod serve;
mod utils;

use clap::Parser;

use crate::{cli::Cli, error::HuggableError};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    if let Err(e) = commands::run(cli) {
        eprintln!("❌ {:#}", e);
        let code = e.downcast_ref::<HuggableError>().map(HuggableError::exit_code).unwrap_or(1);
        std::process::exit(code);
    }
}
