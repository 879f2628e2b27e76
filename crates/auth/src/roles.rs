use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role code as issued by the reporting server (e.g. `"REPORT_MANAGER"`).
///
/// Codes are opaque at this layer. Which codes exist, and which screens they
/// open, is configuration supplied by the deployment (see [`crate::RoleGroups`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleCode(Cow<'static, str>);

impl RoleCode {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank code can never be granted by the server; a route listing one
    /// is misconfigured.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl core::fmt::Display for RoleCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for RoleCode {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RoleCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
