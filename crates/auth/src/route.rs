//! Route tree data model and path matching.
//!
//! A [`RouteNode`] is plain data: the navigation tree is declared once (in
//! code or loaded from JSON) and never mutated afterwards. Rendering concerns
//! live elsewhere; this module only knows paths, labels and role sets.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::RoleCode;

/// A navigable route, optionally restricted to a set of roles.
///
/// `allowed_roles` is authoritative for this node only. A child does not
/// inherit its parent's restriction and a parent does not widen its child's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteNode {
    /// Path relative to the parent (or absolute when it starts with `/`).
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Declared label, used for the window title and the menu entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Absolute path a navigation to this node is forwarded to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Hidden routes are navigable but never listed in the menu.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, rename = "roles", skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<BTreeSet<RoleCode>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            title: None,
            icon: None,
            redirect: None,
            hidden: false,
            allowed_roles: None,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect = Some(path.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Restrict the node to the given roles.
    pub fn allow<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleCode>,
    {
        self.allowed_roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    pub fn child(mut self, node: RouteNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = RouteNode>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn is_restricted(&self) -> bool {
        self.allowed_roles.is_some()
    }
}

/// Join a child path onto its parent's absolute path.
pub fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize(child);
    }
    if child.is_empty() {
        return normalize(parent);
    }
    normalize(&format!("{}/{}", parent.trim_end_matches('/'), child))
}

fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Strip the query string and fragment from a location.
pub fn path_of(location: &str) -> &str {
    let end = location
        .find(|c| c == '?' || c == '#')
        .unwrap_or(location.len());
    &location[..end]
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, optional: bool },
    CatchAll { name: String },
}

/// An absolute route pattern such as `/report/template/design/:id?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

/// Captured path parameters, keyed by parameter name.
pub type RouteParams = BTreeMap<String, String>;

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        let source = normalize(pattern);
        let segments = source
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|raw| match raw.strip_prefix(':') {
                Some(param) if param.contains("(.*)") => Segment::CatchAll {
                    name: param.split('(').next().unwrap_or_default().to_string(),
                },
                Some(param) => match param.strip_suffix('?') {
                    Some(name) => Segment::Param {
                        name: name.to_string(),
                        optional: true,
                    },
                    None => Segment::Param {
                        name: param.to_string(),
                        optional: false,
                    },
                },
                None => Segment::Literal(raw.to_string()),
            })
            .collect();

        Self { source, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_catch_all(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::CatchAll { .. }))
    }

    /// Match a concrete path (query string ignored), capturing parameters.
    pub fn matches(&self, location: &str) -> Option<RouteParams> {
        let parts: Vec<&str> = path_of(location)
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let mut params = RouteParams::new();
        let mut idx = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => {
                    if parts.get(idx) != Some(&lit.as_str()) {
                        return None;
                    }
                    idx += 1;
                }
                Segment::Param { name, optional } => match parts.get(idx) {
                    Some(value) => {
                        params.insert(name.clone(), (*value).to_string());
                        idx += 1;
                    }
                    None if *optional => {}
                    None => return None,
                },
                Segment::CatchAll { name } => {
                    params.insert(name.clone(), parts[idx.min(parts.len())..].join("/"));
                    return Some(params);
                }
            }
        }

        (idx == parts.len()).then_some(params)
    }
}
