//! `reportdesk-auth`: pure route authorization boundary for the reporting client.
//!
//! This crate is intentionally decoupled from HTTP, storage and rendering:
//! it models identities, role codes and the route tree, and decides which
//! routes a role set may reach.

pub mod catalog;
pub mod identity;
pub mod permissions;
pub mod policy;
pub mod roles;
pub mod route;

pub use catalog::{CatalogError, RoleGroups, RouteCatalog, RouteMatch};
pub use identity::Identity;
pub use permissions::PermissionCode;
pub use policy::{PolicyError, Reachability, explain_reachability, filter_tree, is_reachable, visible_menu};
pub use roles::RoleCode;
pub use route::{RouteNode, RouteParams, RoutePattern};
