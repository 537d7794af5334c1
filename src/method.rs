//! HTTP method as a typed enum.
//!
//! Covers RFC 9110 standard methods, WebDAV extensions (RFC 4918 / 4791 / 3253 / 5323),
//! and `PURGE` used by nginx and Varnish for cache invalidation.
//!
//! Route files spell the method in lowercase (`get.rs`, `propfind.rs`). The
//! extra token `all` becomes [`Verb::All`]: a registration that answers every
//! method.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    // RFC 9110 ─────────────────────────────────────────────────────────────────
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
    // WebDAV RFC 4918 ──────────────────────────────────────────────────────────
    Copy,
    Lock,
    Mkcol,
    Move,
    Propfind,
    Proppatch,
    Unlock,
    // WebDAV extensions ────────────────────────────────────────────────────────
    Mkcalendar, // RFC 4791 — CalDAV
    Report,     // RFC 3253
    Search,     // RFC 5323
    // Cache invalidation ───────────────────────────────────────────────────────
    Purge, // nginx / Varnish
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect    => "CONNECT",
            Self::Copy       => "COPY",
            Self::Delete     => "DELETE",
            Self::Get        => "GET",
            Self::Head       => "HEAD",
            Self::Lock       => "LOCK",
            Self::Mkcalendar => "MKCALENDAR",
            Self::Mkcol      => "MKCOL",
            Self::Move       => "MOVE",
            Self::Options    => "OPTIONS",
            Self::Patch      => "PATCH",
            Self::Post       => "POST",
            Self::Propfind   => "PROPFIND",
            Self::Proppatch  => "PROPPATCH",
            Self::Purge      => "PURGE",
            Self::Put        => "PUT",
            Self::Report     => "REPORT",
            Self::Search     => "SEARCH",
            Self::Trace      => "TRACE",
            Self::Unlock     => "UNLOCK",
        }
    }

    /// Parses the lowercase filename token (e.g. `"get"`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "connect"    => Some(Self::Connect),
            "copy"       => Some(Self::Copy),
            "delete"     => Some(Self::Delete),
            "get"        => Some(Self::Get),
            "head"       => Some(Self::Head),
            "lock"       => Some(Self::Lock),
            "mkcalendar" => Some(Self::Mkcalendar),
            "mkcol"      => Some(Self::Mkcol),
            "move"       => Some(Self::Move),
            "options"    => Some(Self::Options),
            "patch"      => Some(Self::Patch),
            "post"       => Some(Self::Post),
            "propfind"   => Some(Self::Propfind),
            "proppatch"  => Some(Self::Proppatch),
            "purge"      => Some(Self::Purge),
            "put"        => Some(Self::Put),
            "report"     => Some(Self::Report),
            "search"     => Some(Self::Search),
            "trace"      => Some(Self::Trace),
            "unlock"     => Some(Self::Unlock),
            _            => None,
        }
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.bytes().any(|b| b.is_ascii_lowercase()) {
            return Err(());
        }
        Self::from_token(&s.to_ascii_lowercase()).ok_or(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The method half of a route filename: one verb, or `all` of them.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Verb {
    All,
    Only(Method),
}

impl Verb {
    /// Parses a filename token: a lowercase method or the literal `all`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "all" => Some(Self::All),
            other => Method::from_token(other).map(Self::Only),
        }
    }

    /// Whether a request with `method` is answered by this verb.
    pub fn accepts(self, method: Method) -> bool {
        match self {
            Self::All => true,
            Self::Only(m) => m == method,
        }
    }
}

impl From<Method> for Verb {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only(m) => m.fmt(f),
        }
    }
}
