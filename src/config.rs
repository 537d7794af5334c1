//! Composer configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! routes_root = "app/routes"
//! middlewares_root = "app/middlewares"
//! ignore_pattern = '\.(test|spec)\.[^.]+$'
//! auto_name_anonymous_middleware = true
//! methods = ["get", "post"]
//! log_routes = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filename::IgnorePattern;
use crate::method::Method;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ComposerOptions {
    /// Root of the route tree, used by [`Composer::build`](crate::Composer::build).
    pub routes_root: Option<PathBuf>,

    /// Root of the named-middleware tree. Optional; without it the tree is empty.
    pub middlewares_root: Option<PathBuf>,

    /// Regex for files under the middlewares root that are not middleware.
    /// Defaults to [`DEFAULT_IGNORE_PATTERN`](crate::filename::DEFAULT_IGNORE_PATTERN).
    pub ignore_pattern: Option<String>,

    /// Give unnamed named-middleware their tree key as a diagnostic name.
    pub auto_name_anonymous_middleware: bool,

    /// Verbs ever registered. `None` allows every verb; `all` is always allowed.
    pub methods: Option<Vec<Method>>,

    /// Emit an info event per registration and per loaded middleware.
    pub log_routes: bool,
}

impl Default for ComposerOptions {
    fn default() -> Self {
        Self {
            routes_root: None,
            middlewares_root: None,
            ignore_pattern: None,
            auto_name_anonymous_middleware: false,
            methods: None,
            log_routes: true,
        }
    }
}

impl ComposerOptions {
    /// Parses and validates options from a TOML document.
    ///
    /// # Errors
    /// [`Error::ConfigParse`] on malformed TOML, [`Error::InvalidIgnorePattern`]
    /// when `ignore_pattern` does not compile.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let options: Self = toml::from_str(content)?;
        options.ignore()?;
        Ok(options)
    }

    /// Loads options from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    /// The compiled ignore pattern.
    pub fn ignore(&self) -> Result<IgnorePattern> {
        match &self.ignore_pattern {
            Some(pattern) => IgnorePattern::new(pattern),
            None => Ok(IgnorePattern::default()),
        }
    }

    pub fn with_routes_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.routes_root = Some(path.into());
        self
    }

    pub fn with_middlewares_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.middlewares_root = Some(path.into());
        self
    }

    pub fn with_ignore_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.ignore_pattern = Some(pattern.into());
        self
    }

    pub fn with_auto_name_anonymous_middleware(mut self, enabled: bool) -> Self {
        self.auto_name_anonymous_middleware = enabled;
        self
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    pub fn with_log_routes(mut self, enabled: bool) -> Self {
        self.log_routes = enabled;
        self
    }
}
