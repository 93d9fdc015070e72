use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use intp_python::{config::ENV_INTP_INIT, HandlerConfig, RunOutput};

pub mod commands;
pub mod execute;
pub mod repl;

use commands::Commands;

/// intp - run python code in a persistent session and capture its output
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// session initializer as `module:function`, or `none` to skip it
    #[arg(long, env = ENV_INTP_INIT, global = true)]
    init: Option<String>,

    /// start the session without any initializer, overriding --init
    #[arg(long, global = true)]
    no_init: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    pub async fn run(&self) -> Result<ExitCode> {
        let config = self.handler_config()?;
        log::debug!("session bootstrap: {:?}", config.bootstrap);
        match &self.command {
            Some(Commands::Execute { code_or_path, json }) => {
                execute::run_execute(config, code_or_path.clone(), *json).await
            }
            Some(Commands::Repl) | None => repl::run_repl(config).await,
        }
    }

    fn handler_config(&self) -> Result<HandlerConfig> {
        if self.no_init {
            return Ok(HandlerConfig::without_bootstrap());
        }
        Ok(HandlerConfig::from_init_value(self.init.as_deref())?)
    }
}

pub(crate) fn print_output(output: &RunOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(output)?);
    } else {
        print!("{}", output.stdout);
        eprint!("{}", output.stderr);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use intp_python::Bootstrap;

    use super::{Cli, Commands};

    #[test]
    fn test_parse_execute() {
        let cli = Cli::try_parse_from(["intp", "--no-init", "exec", "print(1)", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Execute { ref code_or_path, json: true }) if code_or_path == "print(1)"
        ));
        assert_eq!(cli.handler_config().unwrap().bootstrap, None);
    }

    #[test]
    fn test_init_flag() {
        let cli = Cli::try_parse_from(["intp", "--init", "boot:go", "repl"]).unwrap();
        assert_eq!(
            cli.handler_config().unwrap().bootstrap,
            Some(Bootstrap {
                module: "boot".to_string(),
                function: "go".to_string(),
            })
        );

        let cli = Cli::try_parse_from(["intp", "--init", "none"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.handler_config().unwrap().bootstrap, None);

        let cli = Cli::try_parse_from(["intp", "--init", "bad value", "repl"]).unwrap();
        assert!(cli.handler_config().is_err());
    }

    #[test]
    fn test_no_init_wins() {
        let cli = Cli::try_parse_from(["intp", "--init", "a:b", "--no-init", "repl"]).unwrap();
        assert_eq!(cli.handler_config().unwrap().bootstrap, None);
    }
}
