//! URL contracts of the reporting server.
//!
//! Each constructor returns an [`Endpoint`]; payloads are opaque JSON and are
//! passed to [`crate::Pipeline::send`] alongside it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported method '{other}'")),
        }
    }
}

/// How a response must be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// `{ code, message, data }`.
    #[default]
    Envelope,
    /// Raw bytes (file preview / download); never inspected.
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub method: Method,
    /// Path relative to the API base, with a leading `/`.
    pub path: String,
    pub kind: ResponseKind,
}

impl Endpoint {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            method,
            path,
            kind: ResponseKind::Envelope,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn binary(mut self) -> Self {
        self.kind = ResponseKind::Binary;
        self
    }
}

impl core::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

pub mod auth {
    use super::Endpoint;

    pub fn login() -> Endpoint {
        Endpoint::post("/auth/login")
    }

    pub fn logout() -> Endpoint {
        Endpoint::post("/auth/logout")
    }

    pub fn whoami() -> Endpoint {
        Endpoint::get("/auth/info")
    }
}

pub mod dashboard {
    use super::Endpoint;

    pub fn stats() -> Endpoint {
        Endpoint::get("/dashboard/stats")
    }

    /// Query: `limit`.
    pub fn recent_reports() -> Endpoint {
        Endpoint::get("/dashboard/recent-reports")
    }

    /// Query: `limit`.
    pub fn popular_templates() -> Endpoint {
        Endpoint::get("/dashboard/popular-templates")
    }

    /// Query: `period` (`week`, `month`, ...).
    pub fn trend() -> Endpoint {
        Endpoint::get("/dashboard/trend")
    }
}

pub mod reports {
    use super::Endpoint;

    pub fn generate() -> Endpoint {
        Endpoint::post("/report/generate")
    }

    pub fn preview(record_id: i64) -> Endpoint {
        Endpoint::get(format!("/report/generate/{record_id}/preview")).binary()
    }

    pub fn download(record_id: i64) -> Endpoint {
        Endpoint::get(format!("/report/generate/{record_id}/download")).binary()
    }

    pub fn records() -> Endpoint {
        Endpoint::get("/report/generate/records")
    }

    pub fn record(id: i64) -> Endpoint {
        Endpoint::get(format!("/report/generate/records/{id}"))
    }

    pub fn delete_record(id: i64) -> Endpoint {
        Endpoint::delete(format!("/report/generate/records/{id}"))
    }

    pub fn regenerate(record_id: i64) -> Endpoint {
        Endpoint::post(format!("/report/generate/records/{record_id}/regenerate"))
    }
}

pub mod templates {
    use super::Endpoint;

    pub fn page() -> Endpoint {
        Endpoint::get("/report/template/page")
    }

    pub fn detail(id: i64) -> Endpoint {
        Endpoint::get(format!("/report/template/{id}"))
    }

    pub fn create() -> Endpoint {
        Endpoint::post("/report/template")
    }

    pub fn update(id: i64) -> Endpoint {
        Endpoint::put(format!("/report/template/{id}"))
    }

    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(format!("/report/template/{id}"))
    }

    pub fn publish(id: i64) -> Endpoint {
        Endpoint::put(format!("/report/template/{id}/publish"))
    }

    pub fn take_offline(id: i64) -> Endpoint {
        Endpoint::put(format!("/report/template/{id}/offline"))
    }

    /// Query: `newName`.
    pub fn copy(id: i64) -> Endpoint {
        Endpoint::post(format!("/report/template/{id}/copy"))
    }

    pub fn save_design(id: i64) -> Endpoint {
        Endpoint::put(format!("/report/template/{id}/design"))
    }

    /// Templates the current user may generate from.
    pub fn for_user() -> Endpoint {
        Endpoint::get("/report/template/user")
    }

    pub fn by_category(category_id: i64) -> Endpoint {
        Endpoint::get(format!("/report/template/category/{category_id}"))
    }
}

pub mod categories {
    use super::Endpoint;

    pub fn tree() -> Endpoint {
        Endpoint::get("/report/category/tree")
    }

    pub fn list() -> Endpoint {
        Endpoint::get("/report/category/list")
    }

    pub fn detail(id: i64) -> Endpoint {
        Endpoint::get(format!("/report/category/{id}"))
    }

    pub fn create() -> Endpoint {
        Endpoint::post("/report/category")
    }

    pub fn update(id: i64) -> Endpoint {
        Endpoint::put(format!("/report/category/{id}"))
    }

    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(format!("/report/category/{id}"))
    }

    /// Query: `targetParentId`, `sort`.
    pub fn move_to(id: i64) -> Endpoint {
        Endpoint::put(format!("/report/category/{id}/move"))
    }
}

pub mod datasources {
    use super::Endpoint;

    pub fn list() -> Endpoint {
        Endpoint::get("/report/datasource/list")
    }

    pub fn detail(id: i64) -> Endpoint {
        Endpoint::get(format!("/report/datasource/{id}"))
    }

    pub fn create() -> Endpoint {
        Endpoint::post("/report/datasource")
    }

    pub fn update(id: i64) -> Endpoint {
        Endpoint::put(format!("/report/datasource/{id}"))
    }

    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(format!("/report/datasource/{id}"))
    }

    pub fn test_connection(id: i64) -> Endpoint {
        Endpoint::post(format!("/report/datasource/{id}/test"))
    }

    pub fn tables(id: i64) -> Endpoint {
        Endpoint::get(format!("/report/datasource/{id}/tables"))
    }

    pub fn columns(id: i64, table: &str) -> Endpoint {
        Endpoint::get(format!("/report/datasource/{id}/tables/{table}/columns"))
    }

    pub fn query(id: i64) -> Endpoint {
        Endpoint::post(format!("/report/datasource/{id}/query"))
    }
}

pub mod schedules {
    use super::Endpoint;

    pub fn page() -> Endpoint {
        Endpoint::get("/report/schedule/page")
    }

    pub fn detail(id: i64) -> Endpoint {
        Endpoint::get(format!("/report/schedule/{id}"))
    }

    pub fn create() -> Endpoint {
        Endpoint::post("/report/schedule")
    }

    pub fn update(id: i64) -> Endpoint {
        Endpoint::put(format!("/report/schedule/{id}"))
    }

    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(format!("/report/schedule/{id}"))
    }

    /// Query: `status`.
    pub fn set_status(id: i64) -> Endpoint {
        Endpoint::put(format!("/report/schedule/{id}/status"))
    }

    pub fn execute(id: i64) -> Endpoint {
        Endpoint::post(format!("/report/schedule/{id}/execute"))
    }

    pub fn logs(id: i64) -> Endpoint {
        Endpoint::get(format!("/report/schedule/{id}/logs"))
    }
}

pub mod users {
    use super::Endpoint;

    pub fn page() -> Endpoint {
        Endpoint::get("/user/page")
    }

    pub fn create() -> Endpoint {
        Endpoint::post("/user")
    }

    pub fn update(id: i64) -> Endpoint {
        Endpoint::put(format!("/user/{id}"))
    }

    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(format!("/user/{id}"))
    }

    pub fn change_password() -> Endpoint {
        Endpoint::put("/user/password")
    }

    pub fn reset_password(user_id: i64) -> Endpoint {
        Endpoint::put(format!("/user/password/reset/{user_id}"))
    }

    /// Query: `status`.
    pub fn set_status(id: i64) -> Endpoint {
        Endpoint::put(format!("/user/{id}/status"))
    }
}

pub mod roles {
    use super::Endpoint;

    pub fn list() -> Endpoint {
        Endpoint::get("/role/list")
    }

    pub fn page() -> Endpoint {
        Endpoint::get("/role/page")
    }

    pub fn detail(id: i64) -> Endpoint {
        Endpoint::get(format!("/role/{id}"))
    }

    pub fn create() -> Endpoint {
        Endpoint::post("/role")
    }

    pub fn update(id: i64) -> Endpoint {
        Endpoint::put(format!("/role/{id}"))
    }

    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(format!("/role/{id}"))
    }

    /// Query: `status`.
    pub fn set_status(id: i64) -> Endpoint {
        Endpoint::put(format!("/role/{id}/status"))
    }

    pub fn permissions(role_id: i64) -> Endpoint {
        Endpoint::get(format!("/role/{role_id}/permissions"))
    }

    pub fn save_permissions(role_id: i64) -> Endpoint {
        Endpoint::put(format!("/role/{role_id}/permissions"))
    }

    pub fn permission_tree() -> Endpoint {
        Endpoint::get("/permission/tree")
    }

    pub fn members(role_id: i64) -> Endpoint {
        Endpoint::get(format!("/role/{role_id}/users"))
    }
}

pub mod notifications {
    use super::Endpoint;

    /// Query: `page`, `size`.
    pub fn list() -> Endpoint {
        Endpoint::get("/notification/list")
    }

    pub fn unread_count() -> Endpoint {
        Endpoint::get("/notification/unread-count")
    }

    /// Query: `limit`.
    pub fn recent() -> Endpoint {
        Endpoint::get("/notification/recent")
    }

    pub fn mark_read(id: i64) -> Endpoint {
        Endpoint::put(format!("/notification/read/{id}"))
    }

    pub fn mark_all_read() -> Endpoint {
        Endpoint::put("/notification/read-all")
    }

    pub fn delete(id: i64) -> Endpoint {
        Endpoint::delete(format!("/notification/{id}"))
    }

    pub fn clear_read() -> Endpoint {
        Endpoint::delete("/notification/clear-read")
    }
}
