use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntpError {
    #[error("Bootstrap `{module}:{function}` failed: {message}")]
    Bootstrap {
        module: String,
        function: String,
        message: String,
    },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Output capture error: {0}")]
    Capture(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Python error: {0}")]
    Python(#[from] PyErr),
}

pub type Result<T> = std::result::Result<T, IntpError>;
