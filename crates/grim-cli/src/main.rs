use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    batch::{self, BatchArgs},
    check::{self, CheckArgs},
};

mod commands;
mod input;
mod logging;

#[derive(Parser, Debug)]
#[command(
    name = "grim-audit",
    about = "GRIM/GRIMMER consistency audits of reported means and standard deviations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Audit a single reported statistic given on the command line.
    Check(CheckArgs),
    /// Audit every row of a CSV or JSON file.
    Batch(BatchArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Check(args) => check::run(&args),
        Command::Batch(args) => batch::run(&args),
    }
}
