//! `nab`: follow an episode feed, queue new releases, replace superseded ones.

mod cli;
mod commands;
mod logging;

use crate::cli::Cli;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.level());
    commands::execute(cli).await
}
