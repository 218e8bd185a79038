use serde::{Deserialize, Serialize};

use crate::types::Principal;

/// Per-request context identifying which grid is being served and for whom.
/// Threaded through the grid pipeline to key persisted configuration and session state.
#[derive(Debug, Clone)]
pub struct GridContext {
    /// Grid reference derived from the request path (no leading or trailing slash).
    pub table_ref: String,
    /// Authenticated principal, if the request is authenticated.
    pub principal: Option<Principal>,
}

impl GridContext {
    /// Builds a context from a request path such as `/admin/users`.
    #[must_use]
    pub fn from_path(path: &str, principal: Option<Principal>) -> Self {
        Self {
            table_ref: path.trim_matches('/').to_string(),
            principal,
        }
    }

    /// Key under which this grid's configuration and session state are stored.
    #[must_use]
    pub fn config_key(&self) -> ConfigKey {
        ConfigKey {
            table_ref: self.table_ref.clone(),
            identity: self.principal.as_ref().map(|p| p.id.clone()),
        }
    }
}

/// Storage key for persisted grid configuration: grid reference scoped per identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigKey {
    /// Grid reference (see [`GridContext::table_ref`]).
    pub table_ref: String,
    /// Authenticated user id. `None` for anonymous access.
    pub identity: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_strips_slashes() {
        let ctx = GridContext::from_path("/admin/users/", None);
        assert_eq!(ctx.table_ref, "admin/users");
    }

    #[test]
    fn config_key_carries_identity() {
        let ctx = GridContext::from_path(
            "users",
            Some(Principal {
                id: "42".to_string(),
                roles: vec![],
            }),
        );
        let key = ctx.config_key();
        assert_eq!(key.table_ref, "users");
        assert_eq!(key.identity.as_deref(), Some("42"));
    }
}
