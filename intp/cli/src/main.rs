use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

mod cli;

const ENV_INTP_LOGLEVEL: &str = "INTP_LOGLEVEL";

#[tokio::main]
pub async fn main() -> Result<ExitCode> {
    env_logger::init_from_env(Env::new().filter(ENV_INTP_LOGLEVEL));
    cli::Cli::parse().run().await
}
