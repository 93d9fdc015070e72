use std::ffi::CString;

use pyo3::{
    sync::GILOnceCell,
    types::{PyAnyMethods, PyDict, PyDictMethods, PyListMethods, PyModule},
    Bound, Py, PyAny, PyErr, Python,
};

use crate::capture::{capture_lock, OutputCapture, RunOutput};
use crate::config::{Bootstrap, HandlerConfig};
use crate::error::{IntpError, Result};
use crate::pycode;

static SESSION_CLASS: GILOnceCell<Py<PyAny>> = GILOnceCell::new();

fn session_error<E: ToString>(err: E) -> IntpError {
    IntpError::Session(err.to_string())
}

fn session_class(py: Python<'_>) -> Result<&Bound<'_, PyAny>> {
    SESSION_CLASS
        .get_or_try_init(py, || {
            let code = pycode::get_code(pycode::SESSION_FILE).ok_or_else(|| {
                session_error(format!("missing embedded {}", pycode::SESSION_FILE))
            })?;
            let code = CString::new(code).map_err(session_error)?;
            let file = CString::new(pycode::SESSION_FILE).map_err(session_error)?;
            let name = CString::new(pycode::SESSION_MODULE).map_err(session_error)?;
            let module = PyModule::from_code(py, &code, &file, &name).map_err(session_error)?;
            let class = module.getattr("CapturedSession").map_err(session_error)?;
            Ok::<_, IntpError>(class.unbind())
        })
        .map(|class| class.bind(py))
}

impl Bootstrap {
    fn failure(&self, err: PyErr) -> IntpError {
        log::error!("bootstrap {} failed: {}", self, err);
        IntpError::Bootstrap {
            module: self.module.clone(),
            function: self.function.clone(),
            message: err.to_string(),
        }
    }

    /// `from <module> import <function>; <function>()` against `namespace`.
    fn run(&self, py: Python<'_>, namespace: &Bound<'_, PyDict>) -> Result<()> {
        log::debug!("bootstrapping session with {}", self);
        let init = py
            .import(self.module.as_str())
            .and_then(|module| module.getattr(self.function.as_str()))
            .map_err(|err| self.failure(err))?;
        namespace.set_item(self.function.as_str(), &init)?;
        init.call0().map_err(|err| self.failure(err))?;
        Ok(())
    }
}

/// One interactive Python session.
///
/// Names bound by one [`run`](Self::run) stay visible to later calls on the
/// same handler. A handler only exists once its bootstrap has succeeded.
///
/// Runs are serialized process wide because the redirected streams are
/// global. Calling `run` from code that is itself executing inside `run`
/// deadlocks; so does calling it while already holding the GIL on a thread
/// that competes with another `run`.
pub struct InterpreterHandler {
    session: Py<PyAny>,
    namespace: Py<PyDict>,
}

impl InterpreterHandler {
    pub fn new() -> Result<Self> {
        Self::with_config(&HandlerConfig::default())
    }

    /// Like [`run`](Self::run), this takes the capture lock before the GIL so
    /// that bootstrap output cannot land in another handler's sinks.
    pub fn with_config(config: &HandlerConfig) -> Result<Self> {
        let _lock = capture_lock();
        Python::with_gil(|py| {
            let namespace = PyDict::new(py);
            namespace.set_item("__name__", "__console__")?;
            namespace.set_item("__doc__", py.None())?;

            let session = session_class(py)?
                .call1((&namespace, config.filename.as_str()))
                .map_err(session_error)?;
            log::debug!("created interactive session ({})", config.filename);

            if let Some(bootstrap) = &config.bootstrap {
                bootstrap.run(py, &namespace)?;
            }

            Ok(Self {
                session: session.unbind(),
                namespace: namespace.unbind(),
            })
        })
    }

    /// Executes `code` as one block with `sys.stdout`/`sys.stderr` captured.
    ///
    /// Syntax errors and exceptions raised by `code` end up as text in
    /// [`RunOutput::stderr`]; `Err` is reserved for failures of the capture
    /// machinery itself.
    pub fn run(&mut self, code: &str) -> Result<RunOutput> {
        let _lock = capture_lock();
        Python::with_gil(|py| {
            let capture = OutputCapture::begin(py)?;
            let succeeded: bool = self
                .session
                .call_method1(py, "runblock", (code, capture.stderr_sink()))?
                .extract(py)?;
            let output = capture.finish()?;
            log::debug!(
                "ran {} bytes of code (ok={}, stdout={}, stderr={})",
                code.len(),
                succeeded,
                output.stdout.len(),
                output.stderr.len()
            );
            Ok(output)
        })
    }

    /// Whether `source` is a finished statement, following the rules of the
    /// standard interactive console. Source that cannot compile is complete.
    pub fn is_complete(&self, source: &str) -> Result<bool> {
        Python::with_gil(|py| {
            let complete = self
                .session
                .call_method1(py, "is_complete", (source,))?
                .extract(py)?;
            Ok(complete)
        })
    }

    /// `repr()` of the value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        Python::with_gil(|py| {
            let value = self.namespace.bind(py).get_item(name)?;
            let repr = value
                .map(|v| v.repr().and_then(|r| r.extract::<String>()))
                .transpose()?;
            Ok(repr)
        })
    }

    /// Names bound in the session, sorted, without dunder entries.
    pub fn names(&self) -> Result<Vec<String>> {
        Python::with_gil(|py| {
            let mut names: Vec<String> = self
                .namespace
                .bind(py)
                .keys()
                .iter()
                .filter_map(|key| key.extract::<String>().ok())
                .filter(|name| !(name.starts_with("__") && name.ends_with("__")))
                .collect();
            names.sort();
            Ok(names)
        })
    }
}

#[cfg(test)]
mod test {
    use pyo3::{types::PyAnyMethods, Python};

    use super::InterpreterHandler;
    use crate::capture::capture_lock;
    use crate::config::HandlerConfig;

    fn stream_ids() -> (usize, usize) {
        let _lock = capture_lock();
        Python::with_gil(|py| {
            let sys = py.import("sys").unwrap();
            (
                sys.getattr("stdout").unwrap().as_ptr() as usize,
                sys.getattr("stderr").unwrap().as_ptr() as usize,
            )
        })
    }

    #[test]
    fn test_streams_restored_after_run() {
        let mut handler = InterpreterHandler::with_config(&HandlerConfig::without_bootstrap())
            .unwrap();
        let before = stream_ids();
        handler.run("print('x')").unwrap();
        handler.run("raise RuntimeError('y')").unwrap();
        handler.run("import sys\nsys.stdout = None").unwrap();
        assert_eq!(stream_ids(), before);
    }

    #[test]
    fn test_names_skip_dunders() {
        let mut handler = InterpreterHandler::with_config(&HandlerConfig::without_bootstrap())
            .unwrap();
        assert!(handler.names().unwrap().is_empty());
        handler.run("b = 2\na = 1\ndef f(): pass").unwrap();
        assert_eq!(handler.names().unwrap(), vec!["a", "b", "f"]);
        assert_eq!(handler.get("b").unwrap(), Some("2".to_string()));
        assert_eq!(handler.get("missing").unwrap(), None);
    }
}
