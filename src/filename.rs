//! Filename conventions.
//!
//! A routable file is named
//!
//! ```text
//! ^?  (<digits>.)?  <verb | all>  (.star)?  .<ext>
//! │   │             │             │
//! │   │             │             └ wildcard: matches the scope path and everything below
//! │   │             └ lowercase method token
//! │   └ explicit ordering prefix
//! └ default middleware for this path, registers no route
//! ```
//!
//! Anything else is not a route and is skipped without complaint, so
//! fixtures and notes can live next to handlers. Middleware library files
//! are addressed by a [normalized key](normalize_key) instead.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::method::{Method, Verb};

static ROUTE_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\^)?(?:(\d+)\.)?([a-z]+)(\.star)?\.[^.]+$").expect("route filename grammar")
});

/// Default for [`IgnorePattern`]: `*.test.<ext>` and `*.spec.<ext>`.
pub const DEFAULT_IGNORE_PATTERN: &str = r"\.(test|spec)\.[^.]+$";

/// Directory prefix for a middleware scope. The directory adds no URL segment.
pub const MIDDLEWARE_MARKER: char = '^';

/// Directory prefix for a path parameter: `$id` becomes `:id`.
pub const PARAMETER_MARKER: char = '$';

/// A route filename, decoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteDescriptor {
    pub file_name: String,
    pub absolute_path: PathBuf,
    pub verb: Verb,
    pub order: Option<u64>,
    pub middleware_prefix: bool,
    pub star: bool,
}

impl RouteDescriptor {
    pub fn has_numeric_prefix(&self) -> bool {
        self.order.is_some()
    }

    /// Rejects marker combinations the grammar accepts but the composer can't honour.
    ///
    /// # Errors
    /// [`Error::Grammar`] for a wildcard default-middleware file (`^get.star.rs`).
    pub fn validate(&self) -> Result<()> {
        if self.middleware_prefix && self.star {
            return Err(Error::Grammar {
                path: self.absolute_path.clone(),
                reason: "a default middleware file cannot also be a wildcard".into(),
            });
        }
        Ok(())
    }
}

/// Decodes `file_name` found in `directory`.
///
/// Returns `None` for anything outside the grammar, including verbs the
/// closed [`Method`] set doesn't know.
pub fn decode(directory: &Path, file_name: &str) -> Option<RouteDescriptor> {
    let caps = ROUTE_FILE.captures(file_name)?;
    let verb = Verb::from_token(&caps[3])?;
    // A prefix too long for u64 is not a number we can order by.
    let order = match caps.get(2) {
        Some(digits) => Some(digits.as_str().parse().ok()?),
        None => None,
    };

    Some(RouteDescriptor {
        file_name: file_name.to_owned(),
        absolute_path: directory.join(file_name),
        verb,
        order,
        middleware_prefix: caps.get(1).is_some(),
        star: caps.get(4).is_some(),
    })
}

/// Like [`decode`], but also treats verbs outside `allowed` as non-matching.
/// `all` always passes.
pub fn decode_allowed(
    directory: &Path,
    file_name: &str,
    allowed: Option<&[Method]>,
) -> Option<RouteDescriptor> {
    let descriptor = decode(directory, file_name)?;
    match (descriptor.verb, allowed) {
        (Verb::Only(method), Some(list)) if !list.contains(&method) => None,
        _ => Some(descriptor),
    }
}

/// Normalizes a middleware file or directory name into its tree key.
///
/// The extension is stripped from files, the rest is split into words at
/// `-`, `_`, `.`, whitespace and lower-to-upper case changes, and the words
/// are camel-cased with a lowercase first letter: `rate-limit.rs` → `rateLimit`,
/// `JWT` → `jwt`, `checkAdmin` → `checkAdmin`.
pub fn normalize_key(name: &str, is_file: bool) -> String {
    let stem = match (is_file, name.rfind('.')) {
        (true, Some(dot)) if dot > 0 => &name[..dot],
        _ => name,
    };

    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in stem.chars() {
        if c == '-' || c == '_' || c == '.' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut key = String::with_capacity(stem.len());
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            key.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            key.extend(first.to_uppercase());
            key.push_str(chars.as_str());
        }
    }
    key
}

/// Filter for files under the middlewares root that are not middleware.
#[derive(Clone, Debug)]
pub struct IgnorePattern(Regex);

impl IgnorePattern {
    /// # Errors
    /// [`Error::InvalidIgnorePattern`] if `pattern` is not a valid regex.
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|source| Error::InvalidIgnorePattern { pattern: pattern.to_owned(), source })
    }

    pub fn is_ignored(&self, file_name: &str) -> bool {
        self.0.is_match(file_name)
    }
}

impl Default for IgnorePattern {
    fn default() -> Self {
        static DEFAULT: Lazy<Regex> =
            Lazy::new(|| Regex::new(DEFAULT_IGNORE_PATTERN).expect("default ignore pattern"));
        Self(DEFAULT.clone())
    }
}
