//! Route entries and the route table.
//!
//! # Design Decisions
//! - Exact path matching after normalization
//! - Paths and names are unique; duplicates are rejected at insertion
//! - Explicit no-match (`None`) rather than a silent catch-all

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::RouterError;
use crate::router::location::normalize_path;

/// Opaque reference to the view the rendering layer mounts for a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewRef(String);

impl ViewRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Guard metadata attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    /// `Some(false)` exempts the route from the auth guard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// A path → view mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub component: ViewRef,
    #[serde(default)]
    pub meta: RouteMeta,
}

impl RouteEntry {
    pub fn new(path: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            component: ViewRef::new(component),
            meta: RouteMeta::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn requires_auth(mut self, required: bool) -> Self {
        self.meta.requires_auth = Some(required);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.extra.insert(key.into(), value.into());
        self
    }
}

/// Route table keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    by_path: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl RouteTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from entries, stopping at the first invalid one.
    pub fn from_entries<I>(entries: I) -> Result<Self, RouterError>
    where
        I: IntoIterator<Item = RouteEntry>,
    {
        let mut table = Self::new();
        for entry in entries {
            table.add(entry)?;
        }
        Ok(table)
    }

    /// Insert an entry. Its path is normalized first.
    pub fn add(&mut self, mut entry: RouteEntry) -> Result<(), RouterError> {
        validate_route_path(&entry.path)?;
        entry.path = normalize_path(&entry.path);

        if self.by_path.contains_key(&entry.path) {
            return Err(RouterError::DuplicatePath(entry.path));
        }
        if let Some(name) = &entry.name {
            if self.by_name.contains_key(name) {
                return Err(RouterError::DuplicateName(name.clone()));
            }
        }

        let idx = self.entries.len();
        self.by_path.insert(entry.path.clone(), idx);
        if let Some(name) = &entry.name {
            self.by_name.insert(name.clone(), idx);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove the entry with the given name.
    pub fn remove_by_name(&mut self, name: &str) -> Option<RouteEntry> {
        let idx = *self.by_name.get(name)?;
        let removed = self.entries.remove(idx);
        self.reindex();
        Some(removed)
    }

    fn reindex(&mut self) {
        self.by_path.clear();
        self.by_name.clear();
        for (idx, entry) in self.entries.iter().enumerate() {
            self.by_path.insert(entry.path.clone(), idx);
            if let Some(name) = &entry.name {
                self.by_name.insert(name.clone(), idx);
            }
        }
    }

    /// Find the entry for `path`, if any.
    pub fn resolve(&self, path: &str) -> Option<&RouteEntry> {
        self.by_path
            .get(&normalize_path(path))
            .map(|&idx| &self.entries[idx])
    }

    pub fn by_name(&self, name: &str) -> Option<&RouteEntry> {
        self.by_name.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }
}

fn validate_route_path(path: &str) -> Result<(), RouterError> {
    let reason = if !path.starts_with('/') {
        "must start with '/'"
    } else if path.contains(['?', '#']) {
        "must not contain a query or hash"
    } else {
        return Ok(());
    };
    Err(RouterError::InvalidPath {
        path: path.to_string(),
        reason,
    })
}
