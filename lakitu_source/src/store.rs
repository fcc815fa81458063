use core::fmt;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::SourceError;

/// The kind of source a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Scene-graph layouts (`GeoLayout` arrays).
    Geo,
    /// Display lists (`Gfx` arrays).
    Gfx,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Geo => write!(f, "geo"),
            Namespace::Gfx => write!(f, "gfx"),
        }
    }
}

/// What to do when a referenced layout, display list, or table entry is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReferencePolicy {
    /// Log a warning and continue without the reference.
    Skip,
    /// Abort with an error.
    Fail,
}

impl Default for MissingReferencePolicy {
    fn default() -> Self {
        MissingReferencePolicy::Skip
    }
}

/// Name-keyed access to layout and display list sources.
///
/// Each entry is an ordered sequence of lines, one macro call per line.
pub trait SourceStore {
    /// Look up the lines for `name` in the given namespace.
    fn lookup(&self, namespace: Namespace, name: &str) -> Result<&[String], SourceError>;

    /// Returns true if `name` is defined in the given namespace.
    fn contains(&self, namespace: Namespace, name: &str) -> bool {
        self.lookup(namespace, name).is_ok()
    }
}

/// An in-memory [SourceStore].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMap {
    /// Layouts by name.
    pub geo: HashMap<String, Vec<String>>,
    /// Display lists by name.
    pub gfx: HashMap<String, Vec<String>>,
}

impl SourceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name` as the given lines, replacing any previous definition.
    pub fn insert<I, S>(&mut self, namespace: Namespace, name: impl Into<String>, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines.into_iter().map(Into::into).collect();
        self.table_mut(namespace).insert(name.into(), lines);
    }

    /// Define `name` from a block of text, split into lines.
    ///
    /// Blank lines are dropped.
    pub fn insert_text(&mut self, namespace: Namespace, name: impl Into<String>, text: &str) {
        self.insert(
            namespace,
            name,
            text.lines().map(str::trim).filter(|line| !line.is_empty()),
        );
    }

    /// The names defined in a namespace, in no particular order.
    pub fn names(&self, namespace: Namespace) -> impl Iterator<Item = &str> {
        self.table(namespace).keys().map(String::as_str)
    }

    /// The number of entries across both namespaces.
    pub fn len(&self) -> usize {
        self.geo.len() + self.gfx.len()
    }

    /// Returns true if no sources are defined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self, namespace: Namespace) -> &HashMap<String, Vec<String>> {
        match namespace {
            Namespace::Geo => &self.geo,
            Namespace::Gfx => &self.gfx,
        }
    }

    fn table_mut(&mut self, namespace: Namespace) -> &mut HashMap<String, Vec<String>> {
        match namespace {
            Namespace::Geo => &mut self.geo,
            Namespace::Gfx => &mut self.gfx,
        }
    }
}

impl SourceStore for SourceMap {
    fn lookup(&self, namespace: Namespace, name: &str) -> Result<&[String], SourceError> {
        self.table(namespace)
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SourceError::NotFound {
                namespace,
                name: name.to_owned(),
            })
    }
}
