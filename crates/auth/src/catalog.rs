//! The application's route table and location resolution.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::{self, PolicyError};
use crate::route::{RouteParams, RoutePattern, join_paths, path_of};
use crate::{RoleCode, RouteNode};

/// Redirect chains longer than this are treated as a configuration loop.
const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse route catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Role groups the default reporting catalog is built from.
///
/// These are deployment configuration, not fixed policy: servers have shipped
/// coarse business names, `ROLE_`-prefixed names and unrestricted setups, so
/// callers override the groups to match whatever codes their server issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleGroups {
    /// May generate reports, browse records and manage schedules.
    pub business_users: Vec<RoleCode>,
    /// May manage templates, categories and datasources.
    pub designers: Vec<RoleCode>,
    /// May manage users and roles.
    pub administrators: Vec<RoleCode>,
}

impl Default for RoleGroups {
    fn default() -> Self {
        let codes = |names: &[&'static str]| -> Vec<RoleCode> {
            names.iter().map(|n| RoleCode::new(*n)).collect()
        };
        Self {
            business_users: codes(&[
                "ADMIN",
                "REPORT_MANAGER",
                "REPORT_USER",
                "dept_manager",
                "finance_manager",
                "hr_manager",
                "sales_manager",
                "warehouse_manager",
                "data_analyst",
                "report_viewer",
            ]),
            designers: codes(&["ADMIN", "REPORT_MANAGER"]),
            administrators: codes(&["ADMIN"]),
        }
    }
}

/// A route matched against a concrete location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The concrete path that matched (after following redirects).
    pub path: String,
    /// The absolute pattern of the matched node.
    pub pattern: String,
    /// The matched node (children omitted).
    pub node: RouteNode,
    pub params: RouteParams,
}

impl RouteMatch {
    pub fn title(&self) -> Option<&str> {
        self.node.title.as_deref()
    }
}

#[derive(Debug, Clone)]
struct IndexedRoute {
    pattern: RoutePattern,
    node: RouteNode,
}

/// Immutable route tree plus a flattened index for matching.
#[derive(Debug, Clone)]
pub struct RouteCatalog {
    routes: Vec<RouteNode>,
    index: Vec<IndexedRoute>,
}

impl RouteCatalog {
    /// Build a catalog. Misconfigured role restrictions are logged; those
    /// routes stay in the table but are unreachable.
    pub fn new(routes: Vec<RouteNode>) -> Self {
        let mut index = Vec::new();
        flatten("/", &routes, &mut index);

        let catalog = Self { routes, index };
        for problem in catalog.validate() {
            tracing::warn!(error = %problem, "route policy misconfiguration; route fails closed");
        }
        catalog
    }

    /// Load a catalog from a JSON array of route nodes.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let routes: Vec<RouteNode> = serde_json::from_str(json)?;
        Ok(Self::new(routes))
    }

    /// The reporting application's route table, gated by `groups`.
    pub fn reporting(groups: &RoleGroups) -> Self {
        let business = groups.business_users.clone();
        let designers = groups.designers.clone();
        let admins = groups.administrators.clone();

        Self::new(vec![
            RouteNode::new("/login").named("Login").titled("Login").hidden(),
            RouteNode::new("/").redirect_to("/dashboard").child(
                RouteNode::new("dashboard")
                    .named("Dashboard")
                    .titled("Home")
                    .icon("HomeFilled"),
            ),
            RouteNode::new("/report")
                .redirect_to("/report/generate")
                .titled("Reports")
                .icon("Document")
                .allow(business.clone())
                .children([
                    RouteNode::new("template")
                        .named("ReportTemplate")
                        .titled("Templates")
                        .icon("Files")
                        .allow(designers.clone()),
                    RouteNode::new("template/design/:id?")
                        .named("ReportTemplateDesign")
                        .titled("Template Designer")
                        .hidden()
                        .allow(designers.clone()),
                    RouteNode::new("generate")
                        .named("ReportGenerate")
                        .titled("Generate Report")
                        .icon("Printer")
                        .allow(business.clone()),
                    RouteNode::new("records")
                        .named("ReportRecords")
                        .titled("Report Records")
                        .icon("List")
                        .allow(business.clone()),
                    RouteNode::new("category")
                        .named("ReportCategory")
                        .titled("Categories")
                        .icon("Folder")
                        .allow(designers.clone()),
                ]),
            RouteNode::new("/datasource")
                .redirect_to("/datasource/list")
                .titled("Datasources")
                .icon("Connection")
                .allow(designers.clone())
                .child(
                    RouteNode::new("list")
                        .named("DatasourceList")
                        .titled("Datasource Management")
                        .icon("Coin")
                        .allow(designers),
                ),
            RouteNode::new("/schedule")
                .redirect_to("/schedule/list")
                .titled("Schedules")
                .icon("Timer")
                .allow(business.clone())
                .child(
                    RouteNode::new("list")
                        .named("ScheduleList")
                        .titled("Task Management")
                        .icon("Clock")
                        .allow(business),
                ),
            RouteNode::new("/system")
                .redirect_to("/system/user")
                .titled("System")
                .icon("Setting")
                .allow(admins.clone())
                .children([
                    RouteNode::new("user")
                        .named("SystemUser")
                        .titled("Users")
                        .icon("User")
                        .allow(admins.clone()),
                    RouteNode::new("role")
                        .named("SystemRole")
                        .titled("Roles")
                        .icon("UserFilled")
                        .allow(admins),
                ]),
            RouteNode::new("/:pathMatch(.*)*")
                .named("NotFound")
                .titled("404")
                .hidden(),
        ])
    }

    pub fn routes(&self) -> &[RouteNode] {
        &self.routes
    }

    /// Every misconfigured role restriction in the tree, keyed by full path.
    pub fn validate(&self) -> Vec<PolicyError> {
        self.index
            .iter()
            .filter_map(|entry| policy::check_node(&entry.node, entry.pattern.as_str()).err())
            .collect()
    }

    /// Match a location, following route redirects.
    ///
    /// Literal and parameter routes take precedence over catch-all routes.
    /// Returns `None` when nothing matches.
    pub fn resolve(&self, location: &str) -> Option<RouteMatch> {
        let mut current = path_of(location).to_string();
        let mut matched = self.match_path(&current)?;

        for _ in 0..MAX_REDIRECTS {
            match matched.node.redirect.clone() {
                Some(target) if target != current => {
                    let Some(next) = self.match_path(&target) else {
                        break;
                    };
                    current = target;
                    matched = next;
                }
                _ => return Some(matched),
            }
        }

        tracing::warn!(location, "route redirect chain did not settle");
        Some(matched)
    }

    fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let specific = self
            .index
            .iter()
            .filter(|entry| !entry.pattern.is_catch_all());
        let fallback = self
            .index
            .iter()
            .filter(|entry| entry.pattern.is_catch_all());

        specific.chain(fallback).find_map(|entry| {
            entry.pattern.matches(path).map(|params| RouteMatch {
                path: path.to_string(),
                pattern: entry.pattern.as_str().to_string(),
                node: entry.node.clone(),
                params,
            })
        })
    }

    /// [`policy::filter_tree`] over this catalog.
    pub fn filter(&self, roles: &BTreeSet<RoleCode>) -> Vec<RouteNode> {
        policy::filter_tree(&self.routes, roles)
    }

    /// [`policy::visible_menu`] over this catalog.
    pub fn visible_menu(&self, roles: &BTreeSet<RoleCode>) -> Vec<RouteNode> {
        policy::visible_menu(&self.routes, roles)
    }
}

fn flatten(parent: &str, nodes: &[RouteNode], out: &mut Vec<IndexedRoute>) {
    for node in nodes {
        let full = join_paths(parent, &node.path);
        out.push(IndexedRoute {
            pattern: RoutePattern::parse(&full),
            node: RouteNode {
                children: Vec::new(),
                ..node.clone()
            },
        });
        flatten(&full, &node.children, out);
    }
}
