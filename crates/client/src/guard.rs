//! The navigation guard.
//!
//! Evaluated before every route transition. Suspends while a missing identity
//! is fetched, then decides once: allow, or redirect.

use std::sync::Arc;

use serde::Serialize;

use reportdesk_auth::{RouteCatalog, explain_reachability, route::path_of};

use crate::config::ClientConfig;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// No credential, and the target is not public.
    Unauthenticated,
    /// Already holding a credential while heading for the login page.
    AlreadyAuthenticated,
    /// The identity could not be fetched; the session was reset.
    IdentityUnavailable,
    /// The current roles do not reach the target.
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub path: String,
    /// Where to continue after logging in.
    pub return_to: Option<String>,
    pub reason: RedirectReason,
}

impl Redirect {
    /// The redirect as a location, e.g. `/login?redirect=/dashboard`.
    pub fn location(&self) -> String {
        match &self.return_to {
            Some(target) => format!("{}?redirect={}", self.path, encode_return_target(target)),
            None => self.path.clone(),
        }
    }
}

/// Slashes stay readable; everything else reserved is escaped.
fn encode_return_target(target: &str) -> String {
    urlencoding::encode(target).replace("%2F", "/")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow {
        /// The path actually entered (after route redirects).
        path: String,
        /// Window title for the destination.
        title: String,
    },
    Redirect(Redirect),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardSettings {
    pub login_path: String,
    pub home_path: String,
    /// Reachable without a credential. The login path always is.
    pub whitelist: Vec<String>,
    pub app_title: String,
}

impl GuardSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            login_path: config.login_path.clone(),
            home_path: config.home_path.clone(),
            whitelist: config.whitelist.clone(),
            app_title: config.app_title.clone(),
        }
    }

    fn is_public(&self, path: &str) -> bool {
        path == self.login_path || self.whitelist.iter().any(|p| p == path)
    }

    fn title_for(&self, label: Option<&str>) -> String {
        match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => format!("{label} - {}", self.app_title),
            None => self.app_title.clone(),
        }
    }
}

#[derive(Clone)]
pub struct NavigationGuard {
    session: Session,
    catalog: Arc<RouteCatalog>,
    settings: GuardSettings,
}

impl NavigationGuard {
    pub fn new(session: Session, catalog: Arc<RouteCatalog>, settings: GuardSettings) -> Self {
        Self {
            session,
            catalog,
            settings,
        }
    }

    pub fn catalog(&self) -> &RouteCatalog {
        &self.catalog
    }

    /// Decide a navigation from `from` to `to`.
    pub async fn evaluate(&self, to: &str, from: Option<&str>) -> GuardDecision {
        let decision = self.decide(to).await;
        match &decision {
            GuardDecision::Allow { path, .. } => {
                tracing::debug!(to, from = from.unwrap_or("-"), %path, "navigation allowed");
            }
            GuardDecision::Redirect(redirect) => {
                tracing::debug!(to, from = from.unwrap_or("-"), location = %redirect.location(), reason = ?redirect.reason, "navigation redirected");
            }
        }
        decision
    }

    async fn decide(&self, to: &str) -> GuardDecision {
        // Route redirects apply before any check, as they would in the router.
        let resolved = self.catalog.resolve(to).map(|m| m.path);
        let requested = resolved.as_deref().unwrap_or_else(|| path_of(to));
        let state = self.session.state();

        if !state.is_authenticated() {
            if self.settings.is_public(requested) {
                return self.allow(to);
            }
            return self.to_login(requested, RedirectReason::Unauthenticated);
        }

        if requested == self.settings.login_path {
            return GuardDecision::Redirect(Redirect {
                path: self.settings.home_path.clone(),
                return_to: None,
                reason: RedirectReason::AlreadyAuthenticated,
            });
        }

        if !state.has_identity() && self.session.fetch_identity().await.is_err() {
            return self.to_login(requested, RedirectReason::IdentityUnavailable);
        }

        // A reset may have landed while the identity was in flight.
        if !state.is_authenticated() {
            return self.to_login(requested, RedirectReason::Unauthenticated);
        }

        let roles = state.current_roles();
        let Some(matched) = self.catalog.resolve(to) else {
            return self.allow(to);
        };
        let reachability = explain_reachability(&roles, &matched.node);
        if reachability.is_reachable() {
            GuardDecision::Allow {
                title: self.settings.title_for(matched.title()),
                path: matched.path,
            }
        } else {
            tracing::info!(path = %matched.path, ?reachability, "navigation forbidden for current roles");
            GuardDecision::Redirect(Redirect {
                path: self.settings.home_path.clone(),
                return_to: None,
                reason: RedirectReason::Forbidden,
            })
        }
    }

    fn allow(&self, to: &str) -> GuardDecision {
        match self.catalog.resolve(to) {
            Some(matched) => GuardDecision::Allow {
                title: self.settings.title_for(matched.title()),
                path: matched.path,
            },
            None => GuardDecision::Allow {
                path: path_of(to).to_string(),
                title: self.settings.title_for(None),
            },
        }
    }

    fn to_login(&self, requested: &str, reason: RedirectReason) -> GuardDecision {
        GuardDecision::Redirect(Redirect {
            path: self.settings.login_path.clone(),
            return_to: Some(requested.to_string()),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use reportdesk_auth::{RoleGroups, RouteNode};

    use super::*;
    use crate::credential::{Credential, CredentialStore, MemoryCredentialStore};
    use crate::error::ClientError;
    use crate::session::SessionState;
    use crate::test_support::{FakeAuthApi, identity};

    fn guard_with(token: Option<&str>, api: FakeAuthApi) -> (NavigationGuard, SessionState, Arc<MemoryCredentialStore>) {
        let store = Arc::new(match token {
            Some(t) => MemoryCredentialStore::with_credential(&Credential::new(t), Duration::days(7)),
            None => MemoryCredentialStore::new(),
        });
        let state = SessionState::new(store.clone(), Duration::days(7));
        let session = Session::new(state.clone(), Arc::new(api));
        let config = ClientConfig::default();
        let guard = NavigationGuard::new(
            session,
            Arc::new(RouteCatalog::reporting(&RoleGroups::default())),
            GuardSettings::from_config(&config),
        );
        (guard, state, store)
    }

    fn redirect_location(decision: &GuardDecision) -> String {
        match decision {
            GuardDecision::Redirect(r) => r.location(),
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn anonymous_may_open_login() {
        let (guard, _, _) = guard_with(None, FakeAuthApi::default());
        let decision = guard.evaluate("/login", None).await;
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn anonymous_is_sent_to_login_with_return_target() {
        let (guard, _, _) = guard_with(None, FakeAuthApi::default());
        let decision = guard.evaluate("/dashboard", None).await;
        assert_eq!(redirect_location(&decision), "/login?redirect=/dashboard");
    }

    #[tokio::test]
    async fn authenticated_user_skips_login() {
        let api = FakeAuthApi::default().with_whoami(Ok(identity("alice", &["REPORT_USER"])));
        let (guard, _, _) = guard_with(Some("tok"), api);

        let decision = guard.evaluate("/login", Some("/report/generate")).await;
        assert_eq!(redirect_location(&decision), "/dashboard");
    }

    #[tokio::test]
    async fn failed_identity_fetch_redirects_and_clears() {
        let api = FakeAuthApi::default().with_whoami(Err(ClientError::decode("garbled")));
        let (guard, state, store) = guard_with(Some("tok"), api);

        let decision = guard.evaluate("/report/generate", None).await;

        assert_eq!(redirect_location(&decision), "/login?redirect=/report/generate");
        assert!(!state.is_authenticated());
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn identity_is_fetched_once_then_reused() {
        let api = Arc::new(FakeAuthApi::default().with_whoami(Ok(identity("alice", &["REPORT_USER"]))));
        let store = Arc::new(MemoryCredentialStore::with_credential(&Credential::new("tok"), Duration::days(7)));
        let state = SessionState::new(store, Duration::days(7));
        let guard = NavigationGuard::new(
            Session::new(state, api.clone()),
            Arc::new(RouteCatalog::reporting(&RoleGroups::default())),
            GuardSettings::from_config(&ClientConfig::default()),
        );

        assert!(guard.evaluate("/dashboard", None).await.is_allowed());
        assert!(guard.evaluate("/report/generate", None).await.is_allowed());
        assert_eq!(api.whoami_calls(), 1);
    }

    #[tokio::test]
    async fn unreachable_route_redirects_home() {
        let api = FakeAuthApi::default().with_whoami(Ok(identity("alice", &["REPORT_USER"])));
        let (guard, state, _) = guard_with(Some("tok"), api);

        let decision = guard.evaluate("/system/user", None).await;

        match decision {
            GuardDecision::Redirect(r) => {
                assert_eq!(r.path, "/dashboard");
                assert_eq!(r.reason, RedirectReason::Forbidden);
            }
            other => panic!("expected redirect, got {other:?}"),
        }
        assert!(state.is_authenticated());
    }

    #[tokio::test]
    async fn allowed_route_gets_a_titled_destination() {
        let api = FakeAuthApi::default().with_whoami(Ok(identity("root", &["ADMIN"])));
        let (guard, _, _) = guard_with(Some("tok"), api);

        match guard.evaluate("/system/user?page=2", None).await {
            GuardDecision::Allow { path, title } => {
                assert_eq!(path, "/system/user");
                assert!(title.ends_with(" - Enterprise Reports"));
            }
            other => panic!("expected allow, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn grouping_routes_follow_their_redirect() {
        let api = FakeAuthApi::default().with_whoami(Ok(identity("alice", &[])));
        let (guard, _, _) = guard_with(Some("tok"), api);

        match guard.evaluate("/", None).await {
            GuardDecision::Allow { path, .. } => assert_eq!(path, "/dashboard"),
            other => panic!("expected allow, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_paths_are_unrestricted() {
        let api = FakeAuthApi::default().with_whoami(Ok(identity("alice", &[])));
        let (guard, _, _) = guard_with(Some("tok"), api);

        let decision = guard.evaluate("/no/such/screen", None).await;
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn unlabelled_destinations_use_the_application_title() {
        let api = FakeAuthApi::default().with_whoami(Ok(identity("alice", &[])));
        let store = Arc::new(MemoryCredentialStore::with_credential(&Credential::new("tok"), Duration::days(7)));
        let state = SessionState::new(store, Duration::days(7));
        let config = ClientConfig::default();
        let catalog = RouteCatalog::new(vec![
            RouteNode::new("/plain"),
            RouteNode::new("/blank").titled("   "),
        ]);
        let guard = NavigationGuard::new(
            Session::new(state, Arc::new(api)),
            Arc::new(catalog),
            GuardSettings::from_config(&config),
        );

        for target in ["/plain", "/blank", "/not/in/catalog"] {
            match guard.evaluate(target, None).await {
                GuardDecision::Allow { path, title } => {
                    assert_eq!(path, target);
                    assert_eq!(title, config.app_title);
                }
                other => panic!("expected allow for {target}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn anonymous_return_target_follows_route_redirects() {
        let (guard, _, _) = guard_with(None, FakeAuthApi::default());

        let decision = guard.evaluate("/", None).await;
        assert_eq!(redirect_location(&decision), "/login?redirect=/dashboard");

        let decision = guard.evaluate("/report?tab=1", None).await;
        assert_eq!(redirect_location(&decision), "/login?redirect=/report/generate");
    }

    #[test]
    fn return_targets_are_escaped() {
        let redirect = Redirect {
            path: "/login".into(),
            return_to: Some("/report/records name".into()),
            reason: RedirectReason::Unauthenticated,
        };
        assert_eq!(redirect.location(), "/login?redirect=/report/records%20name");
    }
}
