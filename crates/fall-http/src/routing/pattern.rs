//! Route pattern parsing and matching
//!
//! Patterns are `/`-separated segments. A segment is either literal text,
//! a named wildcard `{id}` matching exactly one segment, or a trailing
//! catch-all `{path...}` matching the remainder of the path.

use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur while parsing a route pattern
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutePatternError {
    #[error("Invalid pattern syntax: {0}")]
    InvalidSyntax(String),
    #[error("Catch-all must be the last segment")]
    CatchAllNotLast,
    #[error("Duplicate parameter name: {0}")]
    DuplicateParameter(String),
}

/// A single path segment in a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Static(String),
    Parameter { name: String },
    CatchAll { name: String },
}

impl PathSegment {
    /// Precedence rank at a position; lower wins
    fn rank(&self) -> u8 {
        match self {
            PathSegment::Static(_) => 0,
            PathSegment::Parameter { .. } => 1,
            PathSegment::CatchAll { .. } => 2,
        }
    }
}

/// Parsed route pattern
#[derive(Debug, Clone)]
pub struct RoutePattern {
    original_path: String,
    segments: Vec<PathSegment>,
}

impl RoutePattern {
    /// Parse a route pattern from a normalized path string
    pub fn parse(path: &str) -> Result<Self, RoutePatternError> {
        let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut seen = HashSet::new();

        for (index, segment) in raw.iter().enumerate() {
            if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                let (name, catch_all) = match inner.strip_suffix("...") {
                    Some(name) => (name.trim(), true),
                    None => (inner.trim(), false),
                };

                if name.is_empty() || name.contains(['{', '}', '/']) {
                    return Err(RoutePatternError::InvalidSyntax(format!(
                        "invalid parameter segment '{}'",
                        segment
                    )));
                }
                if !seen.insert(name.to_string()) {
                    return Err(RoutePatternError::DuplicateParameter(name.to_string()));
                }

                if catch_all {
                    if index != raw.len() - 1 {
                        return Err(RoutePatternError::CatchAllNotLast);
                    }
                    segments.push(PathSegment::CatchAll { name: name.to_string() });
                } else {
                    segments.push(PathSegment::Parameter { name: name.to_string() });
                }
            } else if segment.contains(['{', '}']) {
                return Err(RoutePatternError::InvalidSyntax(format!(
                    "braces must enclose a whole segment in '{}'",
                    segment
                )));
            } else {
                segments.push(PathSegment::Static(segment.to_string()));
            }
        }

        Ok(RoutePattern {
            original_path: path.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.original_path
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Names of the wildcard segments, in order
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                PathSegment::Parameter { name } | PathSegment::CatchAll { name } => {
                    Some(name.as_str())
                }
                PathSegment::Static(_) => None,
            })
            .collect()
    }

    /// Check if this pattern matches a given path
    pub fn matches(&self, path: &str) -> bool {
        self.match_path(path).is_some()
    }

    /// Match `path` and extract wildcard values in one pass
    ///
    /// `path` is the raw request path. It is split on `/` first and each
    /// segment is then percent-decoded, so `%2F` stays inside its segment.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<Cow<'_, str>> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy())
            .collect();
        let mut params = HashMap::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::CatchAll { name } => {
                    let rest = parts.get(index..).unwrap_or_default();
                    params.insert(name.clone(), rest.join("/"));
                    return Some(params);
                }
                PathSegment::Static(expected) => {
                    if parts.get(index).map(|part| part.as_ref()) != Some(expected.as_str()) {
                        return None;
                    }
                }
                PathSegment::Parameter { name } => {
                    let value = parts.get(index)?;
                    params.insert(name.clone(), value.to_string());
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }

    /// Compare precedence against another pattern matching the same path
    ///
    /// Segments are compared left to right: literal beats `{name}` beats
    /// catch-all. `Ordering::Less` means `self` is more specific.
    pub fn specificity_cmp(&self, other: &Self) -> Ordering {
        let left = self.segments.iter().map(PathSegment::rank);
        let right = other.segments.iter().map(PathSegment::rank);
        left.cmp(right)
    }

    /// Whether both patterns match exactly the same set of paths
    pub fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (PathSegment::Static(x), PathSegment::Static(y)) => x == y,
                    (PathSegment::Parameter { .. }, PathSegment::Parameter { .. }) => true,
                    (PathSegment::CatchAll { .. }, PathSegment::CatchAll { .. }) => true,
                    _ => false,
                })
    }
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.original_path)
    }
}
