use std::fmt;
use std::str::FromStr;

use crate::error::{IntpError, Result};

/// Selects the session bootstrap: `module:function`, or `none` to skip it.
pub const ENV_INTP_INIT: &str = "INTP_INIT";

pub const DEFAULT_INIT_MODULE: &str = "intp_init";
pub const DEFAULT_INIT_FUNCTION: &str = "intp_init";
pub const DEFAULT_FILENAME: &str = "<input>";

/// A zero-argument initializer that every new session imports and calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub module: String,
    pub function: String,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            module: DEFAULT_INIT_MODULE.to_string(),
            function: DEFAULT_INIT_FUNCTION.to_string(),
        }
    }
}

impl fmt::Display for Bootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.function)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

impl FromStr for Bootstrap {
    type Err = IntpError;

    /// Accepts `pkg.module:function`, or a bare `pkg.module` whose initializer
    /// shares the name of its last segment.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (module, function) = match s.split_once(':') {
            Some((module, function)) => (module.trim(), function.trim()),
            None => (s, s.rsplit('.').next().unwrap_or(s)),
        };

        if module.is_empty() || !module.split('.').all(is_identifier) {
            return Err(IntpError::Config(format!(
                "invalid bootstrap module `{module}` in `{s}`"
            )));
        }
        if !is_identifier(function) {
            return Err(IntpError::Config(format!(
                "invalid bootstrap function `{function}` in `{s}`"
            )));
        }

        Ok(Self {
            module: module.to_string(),
            function: function.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// `None` starts the session without any initializer.
    pub bootstrap: Option<Bootstrap>,
    /// File name reported in tracebacks of submitted code.
    pub filename: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            bootstrap: Some(Bootstrap::default()),
            filename: DEFAULT_FILENAME.to_string(),
        }
    }
}

impl HandlerConfig {
    pub fn without_bootstrap() -> Self {
        Self {
            bootstrap: None,
            ..Default::default()
        }
    }

    pub fn with_bootstrap(mut self, bootstrap: Option<Bootstrap>) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_filename<T: Into<String>>(mut self, filename: T) -> Self {
        self.filename = filename.into();
        self
    }

    /// Builds a config from `$INTP_INIT`.
    pub fn from_env() -> Result<Self> {
        Self::from_init_value(std::env::var(ENV_INTP_INIT).ok().as_deref())
    }

    /// Interprets an `INTP_INIT`-style value: unset keeps the default
    /// bootstrap, empty or `none` disables it.
    pub fn from_init_value(value: Option<&str>) -> Result<Self> {
        match value.map(str::trim) {
            None => Ok(Self::default()),
            Some("") => Ok(Self::without_bootstrap()),
            Some(v) if v.eq_ignore_ascii_case("none") => Ok(Self::without_bootstrap()),
            Some(v) => Ok(Self::default().with_bootstrap(Some(v.parse()?))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_module_and_function() {
        let bootstrap: Bootstrap = "spark.setup:init_context".parse().unwrap();
        assert_eq!(bootstrap.module, "spark.setup");
        assert_eq!(bootstrap.function, "init_context");
        assert_eq!(bootstrap.to_string(), "spark.setup:init_context");
    }

    #[test]
    fn test_parse_bare_module() {
        let bootstrap: Bootstrap = "intp_init".parse().unwrap();
        assert_eq!(bootstrap, Bootstrap::default());

        let bootstrap: Bootstrap = "pkg.setup".parse().unwrap();
        assert_eq!(bootstrap.module, "pkg.setup");
        assert_eq!(bootstrap.function, "setup");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in [":f", "mod:", "a..b:f", "1mod:f", "mod:f()", "mod:f; import os"] {
            assert!(
                matches!(bad.parse::<Bootstrap>(), Err(IntpError::Config(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_init_value() {
        assert_eq!(
            HandlerConfig::from_init_value(None).unwrap(),
            HandlerConfig::default()
        );
        assert_eq!(
            HandlerConfig::from_init_value(Some("")).unwrap().bootstrap,
            None
        );
        assert_eq!(
            HandlerConfig::from_init_value(Some(" None ")).unwrap().bootstrap,
            None
        );
        let config = HandlerConfig::from_init_value(Some("boot:go")).unwrap();
        assert_eq!(
            config.bootstrap,
            Some(Bootstrap {
                module: "boot".to_string(),
                function: "go".to_string(),
            })
        );
        assert_eq!(config.filename, DEFAULT_FILENAME);
        assert!(HandlerConfig::from_init_value(Some("not valid")).is_err());
    }
}
