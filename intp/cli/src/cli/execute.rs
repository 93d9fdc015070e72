use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use intp_python::{HandlerConfig, InterpreterHandler, RunOutput};

use super::print_output;

/// Reads `code_or_path` as a script when it names a file, otherwise treats
/// it as inline code.
pub(crate) fn load_code(code_or_path: &str) -> Result<String> {
    let path = Path::new(code_or_path);
    if path.is_file() {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))
    } else {
        Ok(code_or_path.to_string())
    }
}

fn execute(config: &HandlerConfig, code: &str) -> Result<RunOutput> {
    let mut handler =
        InterpreterHandler::with_config(config).context("failed to start python session")?;
    Ok(handler.run(code)?)
}

pub async fn run_execute(config: HandlerConfig, code_or_path: String, json: bool) -> Result<ExitCode> {
    let code = load_code(&code_or_path)?;
    let output = tokio::task::spawn_blocking(move || execute(&config, &code)).await??;
    print_output(&output, json)?;
    Ok(if output.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
