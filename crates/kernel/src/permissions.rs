//! Current-user context used for access checks.

use serde::{Deserialize, Serialize};

/// Permission that bypasses every access check.
pub const ADMINISTER_SITE: &str = "administer site";

/// Role every anonymous visitor has.
pub const ANONYMOUS_ROLE: &str = "anonymous user";

/// Role every logged-in user has.
pub const AUTHENTICATED_ROLE: &str = "authenticated user";

/// User context for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// Account name ("anonymous" for visitors).
    pub name: String,
    /// Whether the user is authenticated.
    pub authenticated: bool,
    /// Roles held by the user, including the implicit ones.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Permissions granted through the user's roles.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserContext {
    /// Create context for anonymous user.
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".to_string(),
            authenticated: false,
            roles: vec![ANONYMOUS_ROLE.to_string()],
            permissions: Vec::new(),
        }
    }

    /// Create context for authenticated user.
    pub fn authenticated(
        name: impl Into<String>,
        roles: Vec<String>,
        permissions: Vec<String>,
    ) -> Self {
        let mut roles = roles;
        if !roles.iter().any(|r| r == AUTHENTICATED_ROLE) {
            roles.insert(0, AUTHENTICATED_ROLE.to_string());
        }
        Self {
            name: name.into(),
            authenticated: true,
            roles,
            permissions,
        }
    }

    /// Check if user has a specific permission.
    ///
    /// Admins pass every check.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == permission)
    }

    /// Check if user is admin.
    pub fn is_admin(&self) -> bool {
        self.permissions.iter().any(|p| p == ADMINISTER_SITE)
    }

    /// Stable identifier of the permission set, used to vary caches.
    pub fn permissions_hash(&self) -> String {
        let mut perms: Vec<&str> = self.permissions.iter().map(String::as_str).collect();
        perms.sort_unstable();
        perms.dedup();
        perms.join(",")
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
