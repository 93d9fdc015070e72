mod python_repl;

pub use crate::repl::python_repl::{PythonRepl, Repl};
