//! Python bindings: `from intp import IntpHandler`.

use intp_python::{HandlerConfig, InterpreterHandler, IntpError};
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

fn to_pyerr(err: IntpError) -> PyErr {
    match err {
        IntpError::Python(err) => err,
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// A persistent interactive session. `run` returns `(stdout, stderr)`.
#[pyclass(name = "IntpHandler", module = "intp")]
pub struct PyIntpHandler {
    inner: InterpreterHandler,
}

#[pymethods]
impl PyIntpHandler {
    /// `init` takes `module:function` or `"none"`; without it `$INTP_INIT` is
    /// consulted.
    #[new]
    #[pyo3(signature = (init = None))]
    fn new(py: Python<'_>, init: Option<&str>) -> PyResult<Self> {
        let config = match init {
            Some(value) => HandlerConfig::from_init_value(Some(value)),
            None => HandlerConfig::from_env(),
        }
        .map_err(to_pyerr)?;
        // the capture lock is taken before the GIL, so the GIL must be free
        let inner = py
            .allow_threads(|| InterpreterHandler::with_config(&config))
            .map_err(to_pyerr)?;
        Ok(Self { inner })
    }

    fn run(&mut self, py: Python<'_>, code: &str) -> PyResult<(String, String)> {
        let inner = &mut self.inner;
        let output = py.allow_threads(|| inner.run(code)).map_err(to_pyerr)?;
        Ok(output.into())
    }

    fn names(&self) -> PyResult<Vec<String>> {
        self.inner.names().map_err(to_pyerr)
    }
}

#[pymodule]
fn intp(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyIntpHandler>()?;
    Ok(())
}
