//! Route reachability policy.
//!
//! - No IO
//! - No panics
//! - Role restrictions are evaluated per node, never inherited

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::{RoleCode, RouteNode};

/// A route whose role restriction can never be satisfied as written.
///
/// Misconfigured routes fail closed: they are unreachable for everyone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("route '{path}' declares an empty allowed-role set")]
    EmptyAllowedRoles { path: String },

    #[error("route '{path}' lists a blank role code")]
    BlankRoleCode { path: String },
}

/// Why a node is or is not reachable for a role set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reachability {
    /// The node declares no role restriction.
    Unrestricted,
    /// At least one held role is allowed; `via` lists the overlap.
    Granted { via: Vec<String> },
    /// None of the held roles is allowed.
    Denied { allowed: Vec<String> },
    /// The restriction is empty or invalid.
    Misconfigured,
}

impl Reachability {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Unrestricted | Self::Granted { .. })
    }
}

/// Check a node's own restriction for misconfiguration.
pub fn check_node(node: &RouteNode, path: &str) -> Result<(), PolicyError> {
    let Some(allowed) = &node.allowed_roles else {
        return Ok(());
    };
    if allowed.is_empty() {
        return Err(PolicyError::EmptyAllowedRoles {
            path: path.to_string(),
        });
    }
    if allowed.iter().any(RoleCode::is_blank) {
        return Err(PolicyError::BlankRoleCode {
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Explain the reachability decision for `node` given `roles`.
pub fn explain_reachability(roles: &BTreeSet<RoleCode>, node: &RouteNode) -> Reachability {
    let Some(allowed) = &node.allowed_roles else {
        return Reachability::Unrestricted;
    };
    if check_node(node, &node.path).is_err() {
        return Reachability::Misconfigured;
    }

    let via: Vec<String> = allowed
        .intersection(roles)
        .map(|r| r.as_str().to_string())
        .collect();

    if via.is_empty() {
        Reachability::Denied {
            allowed: allowed.iter().map(|r| r.as_str().to_string()).collect(),
        }
    } else {
        Reachability::Granted { via }
    }
}

/// `true` when `node` has no restriction, or `roles` overlaps it.
pub fn is_reachable(roles: &BTreeSet<RoleCode>, node: &RouteNode) -> bool {
    explain_reachability(roles, node).is_reachable()
}

/// Depth-first filter of a route tree, preserving sibling order.
///
/// An unreachable node is dropped with its whole subtree; the children of a
/// reachable node are each judged on their own restriction.
pub fn filter_tree(tree: &[RouteNode], roles: &BTreeSet<RoleCode>) -> Vec<RouteNode> {
    tree.iter()
        .filter(|node| is_reachable(roles, node))
        .map(|node| RouteNode {
            children: filter_tree(&node.children, roles),
            ..node.clone()
        })
        .collect()
}

/// The menu a user actually sees: [`filter_tree`] minus hidden entries.
pub fn visible_menu(tree: &[RouteNode], roles: &BTreeSet<RoleCode>) -> Vec<RouteNode> {
    fn strip_hidden(nodes: Vec<RouteNode>) -> Vec<RouteNode> {
        nodes
            .into_iter()
            .filter(|node| !node.hidden)
            .map(|mut node| {
                node.children = strip_hidden(std::mem::take(&mut node.children));
                node
            })
            .collect()
    }

    strip_hidden(filter_tree(tree, roles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roles(codes: &[&'static str]) -> BTreeSet<RoleCode> {
        codes.iter().map(|c| RoleCode::new(*c)).collect()
    }

    fn restricted(path: &str, allowed: &[&'static str]) -> RouteNode {
        RouteNode::new(path).allow(allowed.iter().copied())
    }

    #[test]
    fn unrestricted_node_is_reachable_with_no_roles() {
        let node = RouteNode::new("/dashboard");
        assert!(is_reachable(&roles(&[]), &node));
        assert_eq!(explain_reachability(&roles(&[]), &node), Reachability::Unrestricted);
    }

    #[test]
    fn restricted_node_requires_overlap() {
        let node = restricted("/report", &["A", "B"]);

        assert!(is_reachable(&roles(&["A"]), &node));
        assert!(is_reachable(&roles(&["B", "C"]), &node));
        assert!(!is_reachable(&roles(&["C"]), &node));
        assert!(!is_reachable(&roles(&[]), &node));
    }

    #[test]
    fn explanation_lists_granting_roles() {
        let node = restricted("/report", &["A", "B"]);
        let explanation = explain_reachability(&roles(&["B", "C"]), &node);
        assert_eq!(
            explanation,
            Reachability::Granted {
                via: vec!["B".to_string()]
            }
        );
    }

    #[test]
    fn empty_allowed_set_fails_closed() {
        let node = RouteNode {
            allowed_roles: Some(BTreeSet::new()),
            ..RouteNode::new("/broken")
        };

        assert_eq!(explain_reachability(&roles(&["ADMIN"]), &node), Reachability::Misconfigured);
        assert!(matches!(
            check_node(&node, "/broken"),
            Err(PolicyError::EmptyAllowedRoles { .. })
        ));
    }

    #[test]
    fn blank_role_code_fails_closed_even_when_other_codes_match() {
        let node = restricted("/broken", &["ADMIN", " "]);
        assert!(!is_reachable(&roles(&["ADMIN"]), &node));
        assert!(matches!(
            check_node(&node, "/broken"),
            Err(PolicyError::BlankRoleCode { .. })
        ));
    }

    #[test]
    fn filter_drops_excluded_subtrees_and_judges_children_independently() {
        let tree = vec![
            RouteNode::new("/").child(RouteNode::new("dashboard")),
            restricted("/report", &["USER", "DESIGNER"]).children([
                restricted("template", &["DESIGNER"]),
                restricted("generate", &["USER", "DESIGNER"]),
                RouteNode::new("help"),
            ]),
            restricted("/system", &["ADMIN"]).child(RouteNode::new("user")),
        ];

        let filtered = filter_tree(&tree, &roles(&["USER"]));
        let paths: Vec<&str> = filtered.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/report"]);

        let report_children: Vec<&str> =
            filtered[1].children.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(report_children, vec!["generate", "help"]);
    }

    #[test]
    fn child_restriction_does_not_widen_an_excluded_parent() {
        let tree = vec![restricted("/system", &["ADMIN"]).child(restricted("user", &["USER"]))];
        assert!(filter_tree(&tree, &roles(&["USER"])).is_empty());
    }

    #[test]
    fn visible_menu_omits_hidden_routes() {
        let tree = vec![
            RouteNode::new("/login").hidden(),
            restricted("/report", &["DESIGNER"]).children([
                restricted("template", &["DESIGNER"]),
                restricted("template/design/:id?", &["DESIGNER"]).hidden(),
            ]),
        ];

        let menu = visible_menu(&tree, &roles(&["DESIGNER"]));
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].children.len(), 1);
        assert_eq!(menu[0].children[0].path, "template");
    }

    fn role_code() -> impl Strategy<Value = RoleCode> {
        prop::sample::select(vec!["A", "B", "C", "D", "E"]).prop_map(RoleCode::new)
    }

    fn role_set() -> impl Strategy<Value = BTreeSet<RoleCode>> {
        prop::collection::btree_set(role_code(), 0..5)
    }

    fn route_tree() -> impl Strategy<Value = RouteNode> {
        let leaf = (prop::option::of(role_set()), any::<bool>()).prop_map(|(allowed, hidden)| {
            RouteNode {
                allowed_roles: allowed,
                hidden,
                ..RouteNode::new("leaf")
            }
        });
        leaf.prop_recursive(3, 24, 4, |inner| {
            (prop::option::of(role_set()), prop::collection::vec(inner, 0..4)).prop_map(
                |(allowed, children)| RouteNode {
                    allowed_roles: allowed,
                    children,
                    ..RouteNode::new("group")
                },
            )
        })
    }

    fn all_reachable(nodes: &[RouteNode], held: &BTreeSet<RoleCode>) -> bool {
        nodes
            .iter()
            .all(|n| is_reachable(held, n) && all_reachable(&n.children, held))
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: nodes without a restriction are reachable for any role set.
        #[test]
        fn unrestricted_is_always_reachable(held in role_set()) {
            prop_assert!(is_reachable(&held, &RouteNode::new("/any")));
        }

        /// Property: every node that survives filtering, at any depth, is itself
        /// reachable, which means no survivor hangs under an excluded parent.
        #[test]
        fn filtered_tree_contains_only_reachable_nodes(
            tree in prop::collection::vec(route_tree(), 0..5),
            held in role_set(),
        ) {
            let filtered = filter_tree(&tree, &held);
            prop_assert!(all_reachable(&filtered, &held));
        }

        /// Property: filtering keeps the relative order of surviving siblings.
        #[test]
        fn filtering_preserves_sibling_order(
            tree in prop::collection::vec(route_tree(), 0..6),
            held in role_set(),
        ) {
            let tree: Vec<RouteNode> = tree
                .into_iter()
                .enumerate()
                .map(|(i, n)| n.named(i.to_string()))
                .collect();

            let expected: Vec<Option<String>> = tree
                .iter()
                .filter(|n| is_reachable(&held, n))
                .map(|n| n.name.clone())
                .collect();
            let got: Vec<Option<String>> = filter_tree(&tree, &held)
                .into_iter()
                .map(|n| n.name)
                .collect();

            prop_assert_eq!(got, expected);
        }
    }
}
