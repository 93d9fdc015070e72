use std::io::{IsTerminal, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use intp_python::{HandlerConfig, InterpreterHandler, PythonRepl, Repl};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::print_output;

fn show_prompt(prompt: &str) {
    print!("{prompt}");
    let _ = std::io::stdout().flush();
}

pub async fn run_repl(config: HandlerConfig) -> Result<ExitCode> {
    let handler = tokio::task::spawn_blocking(move || InterpreterHandler::with_config(&config))
        .await?
        .context("failed to start python session")?;
    let mut repl = PythonRepl::new(handler);
    let interactive = std::io::stdin().is_terminal();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while repl.is_alive() {
        if interactive {
            show_prompt(repl.prompt());
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let (ret, back) = tokio::task::spawn_blocking(move || {
            let ret = repl.feed(format!("{line}\n"));
            (ret, repl)
        })
        .await?;
        repl = back;
        if let Some(output) = ret? {
            print_output(&output, false)?;
        }
    }
    log::debug!("repl finished");
    Ok(ExitCode::SUCCESS)
}
