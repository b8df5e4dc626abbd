//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the office
//! system's workflow, directory, menu and route configuration from YAML
//! files.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::access::{MenuTree, RouteGuard, RouteRule};
use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{Menu, User};
use crate::workflow::{LeaveWorkflow, RequisitionWorkflow};

use super::types::{MenusConfig, RoutesConfig, UsersConfig, WorkflowSettings};

/// Loads and provides access to the office configuration.
///
/// # Directory Structure
///
/// ```text
/// config/ghf-office/
/// ├── workflow.yaml  # Approval chains, finance role, redirect targets
/// ├── users.yaml     # User directory with roles and permissions
/// ├── menus.yaml     # Navigation menu entries
/// └── routes.yaml    # Route guard rules
/// ```
///
/// # Example
///
/// ```no_run
/// use office_workflow::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/ghf-office").unwrap();
/// let user = loader.get_user("u-hr").unwrap();
/// println!("{} holds {:?}", user.full_name(), user.roles);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: WorkflowSettings,
    users: HashMap<String, User>,
    menus: MenuTree,
    routes: RouteGuard,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - The contents are inconsistent (broken approval chain, duplicate
    ///   user ids, dangling menu parents, bad route patterns)
    pub fn load<P: AsRef<Path>>(path: P) -> WorkflowResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<WorkflowSettings>(&path.join("workflow.yaml"))?;
        let users = Self::load_yaml::<UsersConfig>(&path.join("users.yaml"))?;
        let menus = Self::load_yaml::<MenusConfig>(&path.join("menus.yaml"))?;
        let routes = Self::load_yaml::<RoutesConfig>(&path.join("routes.yaml"))?;

        Self::from_parts(settings, users.users, menus.menus, routes.routes)
    }

    /// Builds a loader from in-memory parts, applying the same validation as
    /// [`ConfigLoader::load`].
    pub fn from_parts(
        settings: WorkflowSettings,
        users: Vec<User>,
        menus: Vec<Menu>,
        routes: Vec<RouteRule>,
    ) -> WorkflowResult<Self> {
        settings.validate()?;
        let users = Self::index_users(users)?;
        let menus = MenuTree::build(menus)?;
        let routes = RouteGuard::new(
            routes,
            settings.login_path.clone(),
            settings.unauthorized_path.clone(),
        )?;

        Ok(Self {
            settings,
            users,
            menus,
            routes,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> WorkflowResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| WorkflowError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| WorkflowError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn index_users(users: Vec<User>) -> WorkflowResult<HashMap<String, User>> {
        let mut emails = HashSet::new();
        let mut index = HashMap::with_capacity(users.len());

        for user in users {
            if user.id.trim().is_empty() {
                return Err(WorkflowError::InvalidConfig {
                    message: "user id must not be empty".to_string(),
                });
            }
            if !is_plausible_email(&user.email) {
                return Err(WorkflowError::InvalidConfig {
                    message: format!("user '{}' has invalid email '{}'", user.id, user.email),
                });
            }
            if !emails.insert(user.email.to_lowercase()) {
                return Err(WorkflowError::InvalidConfig {
                    message: format!("email '{}' is used by more than one user", user.email),
                });
            }
            if index.contains_key(&user.id) {
                return Err(WorkflowError::InvalidConfig {
                    message: format!("duplicate user id '{}'", user.id),
                });
            }
            index.insert(user.id.clone(), user);
        }

        Ok(index)
    }

    /// Returns the workflow settings.
    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Gets a user by id.
    pub fn get_user(&self, user_id: &str) -> WorkflowResult<&User> {
        self.users
            .get(user_id)
            .ok_or_else(|| WorkflowError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }

    /// Number of users in the directory.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Returns the validated menu hierarchy.
    pub fn menus(&self) -> &MenuTree {
        &self.menus
    }

    /// Returns the route guard.
    pub fn route_guard(&self) -> &RouteGuard {
        &self.routes
    }

    /// Returns the leave workflow for the configured chain.
    pub fn leave_workflow(&self) -> LeaveWorkflow<'_> {
        LeaveWorkflow::new(&self.settings.leave_stages)
    }

    /// Returns the requisition workflow for the configured stages.
    pub fn requisition_workflow(&self) -> RequisitionWorkflow<'_> {
        RequisitionWorkflow::new(
            &self.settings.requisition_stages,
            &self.settings.finance_role,
        )
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessDecision;
    use crate::models::LeaveStatus;

    fn config_path() -> &'static str {
        "./config/ghf-office"
    }

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            first_name: id.to_string(),
            last_name: String::new(),
            email: email.to_string(),
            roles: vec![],
            permissions: vec![],
        }
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert!(loader.user_count() >= 5);
        assert!(!loader.menus().is_empty());
        assert_eq!(loader.settings().leave_stages[0].status, LeaveStatus::Pending);
    }

    #[test]
    fn test_get_user_from_directory() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let hr = loader.get_user("u-hr").unwrap();
        assert!(hr.has_role("HR Manager"));
    }

    #[test]
    fn test_get_unknown_user_returns_error() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        match loader.get_user("nobody") {
            Err(WorkflowError::UserNotFound { user_id }) => assert_eq!(user_id, "nobody"),
            other => panic!("Expected UserNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_loaded_routes_guard_admin_area() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let staff = loader.get_user("u-staff").unwrap();
        let decision = loader.route_guard().evaluate("/admin/menus", Some(staff));
        assert!(matches!(decision, AccessDecision::RedirectToUnauthorized { .. }));
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        match ConfigLoader::load("/nonexistent/path") {
            Err(WorkflowError::ConfigNotFound { path }) => {
                assert!(path.contains("workflow.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_duplicate_user_id_rejected() {
        let result = ConfigLoader::from_parts(
            WorkflowSettings::default(),
            vec![user("a", "a@ghf.org"), user("a", "b@ghf.org")],
            vec![],
            vec![],
        );
        assert!(matches!(result, Err(WorkflowError::InvalidConfig { .. })));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let result = ConfigLoader::from_parts(
            WorkflowSettings::default(),
            vec![user("a", "a@ghf.org"), user("b", "A@ghf.org")],
            vec![],
            vec![],
        );
        assert!(result.unwrap_err().to_string().contains("more than one user"));
    }

    #[test]
    fn test_invalid_email_rejected() {
        for email in ["", "nobody", "@ghf.org", "a@", "a b@ghf.org", "a@b@c"] {
            let result = ConfigLoader::from_parts(
                WorkflowSettings::default(),
                vec![user("a", email)],
                vec![],
                vec![],
            );
            assert!(result.is_err(), "accepted email {:?}", email);
        }
    }

    #[test]
    fn test_from_parts_validates_settings() {
        let mut settings = WorkflowSettings::default();
        settings.requisition_stages.clear();
        let result = ConfigLoader::from_parts(settings, vec![], vec![], vec![]);
        assert!(matches!(result, Err(WorkflowError::InvalidConfig { .. })));
    }
}
