use std::sync::{Mutex, MutexGuard, PoisonError};

use pyo3::{
    types::{PyAnyMethods, PyModule, PyString, PyStringMethods},
    Bound, PyAny, PyErr, Python,
};
use serde::{Deserialize, Serialize};

use crate::error::{IntpError, Result};

/// `sys.stdout` and `sys.stderr` are process wide, so only one capture may be
/// active at a time no matter how many handlers exist.
static CAPTURE_LOCK: Mutex<()> = Mutex::new(());

/// Must be taken *before* the GIL.
pub(crate) fn capture_lock() -> MutexGuard<'static, ()> {
    CAPTURE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Text written to the redirected streams during one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    /// True when nothing was written to stderr.
    pub fn is_clean(&self) -> bool {
        self.stderr.is_empty()
    }

    pub fn append(&mut self, other: RunOutput) {
        self.stdout.push_str(&other.stdout);
        self.stderr.push_str(&other.stderr);
    }
}

impl From<RunOutput> for (String, String) {
    fn from(output: RunOutput) -> Self {
        (output.stdout, output.stderr)
    }
}

fn capture_error(err: PyErr) -> IntpError {
    IntpError::Capture(err.to_string())
}

/// Redirects `sys.stdout` and `sys.stderr` into two fresh `io.StringIO` sinks.
///
/// Both redirections are installed by [`OutputCapture::begin`] and both are
/// undone together, either by [`OutputCapture::finish`] or when the guard is
/// dropped on an early return.
pub struct OutputCapture<'py> {
    sys: Bound<'py, PyModule>,
    saved: Option<(Bound<'py, PyAny>, Bound<'py, PyAny>)>,
    out: Bound<'py, PyAny>,
    err: Bound<'py, PyAny>,
}

impl<'py> OutputCapture<'py> {
    pub fn begin(py: Python<'py>) -> Result<Self> {
        let sys = py.import("sys").map_err(capture_error)?;
        let string_io = py
            .import("io")
            .and_then(|io| io.getattr("StringIO"))
            .map_err(capture_error)?;
        let out = string_io.call0().map_err(capture_error)?;
        let err = string_io.call0().map_err(capture_error)?;

        let old_out = sys.getattr("stdout").map_err(capture_error)?;
        let old_err = sys.getattr("stderr").map_err(capture_error)?;

        sys.setattr("stdout", &out).map_err(capture_error)?;
        if let Err(e) = sys.setattr("stderr", &err) {
            if let Err(rollback) = sys.setattr("stdout", &old_out) {
                log::error!("failed to restore sys.stdout: {}", rollback);
            }
            return Err(capture_error(e));
        }

        Ok(Self {
            sys,
            saved: Some((old_out, old_err)),
            out,
            err,
        })
    }

    /// Reads both sinks and restores the original streams.
    pub fn finish(mut self) -> Result<RunOutput> {
        let stdout = self.read(&self.out)?;
        let stderr = self.read(&self.err)?;
        self.restore()?;
        Ok(RunOutput { stdout, stderr })
    }

    /// The sink behind `sys.stderr`.
    pub fn stderr_sink(&self) -> &Bound<'py, PyAny> {
        &self.err
    }

    /// Lone surrogates cannot be represented in a `String`; they are
    /// replaced rather than failing the whole read.
    fn read(&self, sink: &Bound<'py, PyAny>) -> Result<String> {
        let value = sink.call_method0("getvalue").map_err(capture_error)?;
        let text = value
            .downcast::<PyString>()
            .map_err(|err| capture_error(err.into()))?;
        Ok(text.to_string_lossy().into_owned())
    }

    fn restore(&mut self) -> Result<()> {
        let Some((out, err)) = self.saved.take() else {
            return Ok(());
        };
        let restored_out = self.sys.setattr("stdout", out);
        let restored_err = self.sys.setattr("stderr", err);
        restored_out.and(restored_err).map_err(capture_error)
    }
}

impl Drop for OutputCapture<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            log::error!("failed to restore standard streams: {}", err);
        }
    }
}

#[cfg(test)]
mod test {
    use pyo3::{ffi::c_str, types::PyAnyMethods, Python};

    use super::{capture_lock, OutputCapture};

    #[test]
    fn test_finish_collects_both_streams() {
        let _lock = capture_lock();
        let output = Python::with_gil(|py| {
            let capture = OutputCapture::begin(py).unwrap();
            py.run(
                c_str!("import sys\nprint('to out')\nprint('to err', file=sys.stderr)"),
                None,
                None,
            )
            .unwrap();
            capture.finish().unwrap()
        });
        assert_eq!(output.stdout, "to out\n");
        assert_eq!(output.stderr, "to err\n");
        assert!(!output.is_clean());
    }

    #[test]
    fn test_drop_restores_streams() {
        let _lock = capture_lock();
        Python::with_gil(|py| {
            let sys = py.import("sys").unwrap();
            let streams = || {
                (
                    sys.getattr("stdout").unwrap().as_ptr(),
                    sys.getattr("stderr").unwrap().as_ptr(),
                )
            };
            let before = streams();
            {
                let _capture = OutputCapture::begin(py).unwrap();
                let during = streams();
                assert_ne!(during.0, before.0);
                assert_ne!(during.1, before.1);
            }
            assert_eq!(streams(), before);
        });
    }

    #[test]
    fn test_surrogates_are_replaced() {
        let _lock = capture_lock();
        let output = Python::with_gil(|py| {
            let capture = OutputCapture::begin(py).unwrap();
            py.run(c_str!("print('before')\nprint('\\ud800')"), None, None)
                .unwrap();
            capture.finish().unwrap()
        });
        assert!(output.stdout.starts_with("before\n"), "{}", output.stdout);
        assert!(output.stdout.contains('\u{FFFD}'), "{}", output.stdout);
    }

    #[test]
    fn test_append_concatenates() {
        let mut first = super::RunOutput {
            stdout: "a\n".to_string(),
            stderr: String::new(),
        };
        first.append(super::RunOutput {
            stdout: "b\n".to_string(),
            stderr: "oops\n".to_string(),
        });
        assert_eq!(first.stdout, "a\nb\n");
        assert_eq!(first.stderr, "oops\n");
    }
}
