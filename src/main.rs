use clap::Parser;
use colored::*;
use modguard::cli::Cli;
use modguard::commands::{self, EXIT_FAILURE};
use modguard::observability::init_logging;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.command.verbosity());

    let code = match commands::dispatch(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
