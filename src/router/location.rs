//! Navigation targets.
//!
//! # Design Decisions
//! - Targets are parsed with `url`, relative ones against a fixed origin
//! - Paths are percent-decoded before matching and are case-sensitive
//! - Duplicate slashes collapse and trailing slashes are dropped, except
//!   for the root `/`
//! - Query pairs are form-decoded, and re-encoded when displayed

use percent_encoding::percent_decode_str;
use std::fmt;
use url::{Position, Url};

/// Origin relative targets are resolved against. Never shown to callers.
const LOCAL_ORIGIN: &str = "http://localhost/";

/// A parsed navigation target: decoded path, query and hash.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub hash: Option<String>,
}

impl Location {
    /// Parse a navigation target such as `/users?id=3#top`.
    ///
    /// Absolute URLs (`https://host/path`) lose their scheme and authority.
    /// A relative path is treated as rooted.
    pub fn parse(target: &str) -> Self {
        match to_url(target) {
            Ok(url) => Self::from_url(&url),
            Err(e) => {
                tracing::warn!(raw = target, error = %e, "unparseable navigation target, using it as a raw path");
                Self {
                    path: normalize_path(target),
                    ..Self::default()
                }
            }
        }
    }

    fn from_url(url: &Url) -> Self {
        Self {
            path: normalize_path(&decode(url.path())),
            query: url.query_pairs().into_owned().collect(),
            hash: url.fragment().map(decode),
        }
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path, query and hash joined back into one encoded string.
    pub fn full_path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(mut url) = Url::parse(LOCAL_ORIGIN) else {
            return f.write_str(&self.path);
        };
        url.set_path(&self.path);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url.set_fragment(self.hash.as_deref());
        f.write_str(&url[Position::BeforePath..])
    }
}

impl From<&str> for Location {
    fn from(target: &str) -> Self {
        Self::parse(target)
    }
}

impl From<String> for Location {
    fn from(target: String) -> Self {
        Self::parse(&target)
    }
}

/// Absolute URLs with a host are taken as-is. Anything else is rooted and
/// joined onto [`LOCAL_ORIGIN`]; leading slashes are collapsed first so
/// `//a` is a path, not a host.
fn to_url(target: &str) -> Result<Url, url::ParseError> {
    if let Ok(url) = Url::parse(target) {
        if url.has_host() {
            return Ok(url);
        }
    }
    let rooted = format!("/{}", target.trim_start_matches('/'));
    Url::parse(LOCAL_ORIGIN)?.join(&rooted)
}

fn decode(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

/// Normalize a path: rooted, no empty segments, no trailing slash.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Remove `base` from the front of `path`.
///
/// Paths outside the base are returned unchanged.
pub fn strip_base(base: &str, path: &str) -> String {
    if base == "/" {
        return normalize_path(path);
    }
    let path = normalize_path(path);
    if path == base {
        "/".to_string()
    } else if path
        .strip_prefix(base)
        .is_some_and(|rest| rest.starts_with('/'))
    {
        path[base.len()..].to_string()
    } else {
        path
    }
}

/// Prefix `path` with `base`.
pub fn join_base(base: &str, path: &str) -> String {
    if base == "/" {
        path.to_string()
    } else if path == "/" {
        base.to_string()
    } else {
        format!("{base}{path}")
    }
}
