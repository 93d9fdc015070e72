//! A persistent interactive Python session whose `stdout`/`stderr` output is
//! captured per call.
//!
//! ```no_run
//! use intp_python::{HandlerConfig, InterpreterHandler};
//!
//! # fn main() -> intp_python::Result<()> {
//! let mut handler = InterpreterHandler::with_config(&HandlerConfig::without_bootstrap())?;
//! handler.run("x = 40 + 2")?;
//! let output = handler.run("print(x)")?;
//! assert_eq!(output.stdout, "42\n");
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod handler;
pub mod repl;

mod pycode;

pub use crate::capture::{OutputCapture, RunOutput};
pub use crate::config::{Bootstrap, HandlerConfig};
pub use crate::error::{IntpError, Result};
pub use crate::handler::InterpreterHandler;
pub use crate::pycode::ENV_INTP_CODE_ROOT;
pub use crate::repl::{PythonRepl, Repl};
