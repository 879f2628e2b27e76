//! Wire records exchanged with the reporting server.
//!
//! Every JSON response is wrapped in a [`ResponseEnvelope`]; binary downloads
//! are not.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use reportdesk_auth::{Identity, PermissionCode, RoleCode};

/// Envelope code that marks success.
pub const CODE_OK: i64 = 200;
/// Envelope code that marks an expired or invalid session.
pub const CODE_SESSION_EXPIRED: i64 = 401;

/// `{ code, message, data }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub code: i64,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ResponseEnvelope {
    pub fn ok(data: Value) -> Self {
        Self {
            code: CODE_OK,
            message: Some("success".to_string()),
            data,
        }
    }

    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: Value::Null,
        }
    }

    /// The server message, when it carries any text.
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `data` of a successful `POST /auth/login`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub token: String,
    #[serde(default)]
    pub user_info: UserRecord,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl core::fmt::Debug for LoginData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginData")
            .field("token", &"<redacted>")
            .field("user_info", &self.user_info)
            .field("roles", &self.roles)
            .finish()
    }
}

impl LoginData {
    /// The identity described by this login response.
    ///
    /// Role codes come from the top-level `roles` list; the nested user record
    /// is only consulted when that list is absent.
    pub fn identity(&self) -> Identity {
        let roles: Vec<RoleCode> = if self.roles.is_empty() {
            self.user_info.role_codes().collect()
        } else {
            self.roles.iter().cloned().map(RoleCode::from).collect()
        };
        let permissions = self
            .permissions
            .iter()
            .chain(self.user_info.permissions.iter())
            .cloned()
            .map(PermissionCode::from);

        Identity::new(
            self.user_info.username.clone(),
            self.user_info.nickname.clone(),
            roles,
            permissions,
        )
    }
}

/// User view returned by `GET /auth/info`, and nested in the login response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Option<i64>,
    pub username: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<RoleRecord>,
    pub permissions: Vec<String>,
}

impl UserRecord {
    pub fn role_codes(&self) -> impl Iterator<Item = RoleCode> + '_ {
        self.roles
            .iter()
            .map(|r| RoleCode::from(r.role_code.clone()))
    }

    pub fn identity(&self) -> Identity {
        Identity::new(
            self.username.clone(),
            self.nickname.clone(),
            self.role_codes(),
            self.permissions.iter().cloned().map(PermissionCode::from),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoleRecord {
    pub id: Option<i64>,
    pub role_code: String,
    pub role_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_tolerates_missing_message_and_data() {
        let env: ResponseEnvelope = serde_json::from_value(json!({ "code": 500 })).unwrap();
        assert_eq!(env.code, 500);
        assert!(env.message_text().is_none());
        assert_eq!(env.data, Value::Null);
    }

    #[test]
    fn login_data_prefers_top_level_roles() {
        let data: LoginData = serde_json::from_value(json!({
            "token": "t-1",
            "userInfo": {
                "username": "alice",
                "nickname": "Alice",
                "roles": [{ "roleCode": "REPORT_USER" }]
            },
            "roles": ["ADMIN"],
            "permissions": ["report:export"]
        }))
        .unwrap();

        let identity = data.identity();
        assert_eq!(identity.username(), "alice");
        assert_eq!(identity.display_name(), "Alice");
        assert!(identity.has_role(&RoleCode::new("ADMIN")));
        assert!(!identity.has_role(&RoleCode::new("REPORT_USER")));
        assert!(identity.has_permission(&PermissionCode::new("report:export")));
    }

    #[test]
    fn login_data_falls_back_to_nested_roles() {
        let data: LoginData = serde_json::from_value(json!({
            "token": "t-1",
            "userInfo": { "username": "bob", "roles": [{ "roleCode": "REPORT_USER", "roleName": "User" }] }
        }))
        .unwrap();

        assert!(data.identity().has_role(&RoleCode::new("REPORT_USER")));
    }

    #[test]
    fn user_record_ignores_unknown_fields() {
        let user: UserRecord = serde_json::from_value(json!({
            "username": "carol",
            "status": 1,
            "createTime": "2024-01-01 00:00:00",
            "roles": []
        }))
        .unwrap();

        let identity = user.identity();
        assert_eq!(identity.display_name(), "carol");
        assert!(identity.roles().is_empty());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", LoginRequest::new("alice", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
