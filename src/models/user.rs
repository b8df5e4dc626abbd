//! User model.
//!
//! Users come from the configured directory. Authentication itself belongs to
//! an external identity provider; this crate only consumes the resolved
//! identity together with its role and permission names.

use serde::{Deserialize, Serialize};

/// A member of staff known to the office system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email address.
    pub email: String,
    /// Role names held by the user (e.g. "HR Manager", "Admin").
    #[serde(default)]
    pub roles: Vec<String>,
    /// Fine-grained permission names held by the user.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    /// Returns "first last".
    ///
    /// # Examples
    ///
    /// ```
    /// use office_workflow::models::User;
    ///
    /// let user = User {
    ///     id: "u-001".to_string(),
    ///     first_name: "Ama".to_string(),
    ///     last_name: "Owusu".to_string(),
    ///     email: "ama@ghf.org".to_string(),
    ///     roles: vec!["HR Manager".to_string()],
    ///     permissions: vec![],
    /// };
    /// assert_eq!(user.full_name(), "Ama Owusu");
    /// assert!(user.has_role("HR Manager"));
    /// ```
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Returns true if the user holds the named role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns true if the user holds the named permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
