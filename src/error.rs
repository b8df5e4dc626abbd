//! Error types for the office workflow engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the guard, the approval workflows and the configuration
//! loader can report.

use thiserror::Error;

/// The main error type for the office workflow engine.
///
/// # Example
///
/// ```
/// use office_workflow::error::WorkflowError;
///
/// let error = WorkflowError::ConfigNotFound {
///     path: "/missing/users.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/users.yaml");
/// ```
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but is semantically inconsistent.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// A description of the inconsistency.
        message: String,
    },

    /// No user with the given id exists in the directory.
    #[error("User not found: {user_id}")]
    UserNotFound {
        /// The id that was looked up.
        user_id: String,
    },

    /// A leave application, requisition or menu was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity ("leave application", "requisition", ...).
        entity: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// Input data failed validation.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The entity's current status does not allow the requested action.
    #[error("Cannot {action} when status is '{status}'")]
    InvalidTransition {
        /// The requested action.
        action: String,
        /// The status the entity is in.
        status: String,
    },

    /// The actor lacks the role or ownership required for the action.
    #[error("User '{actor}' is not permitted to {action}: {reason}")]
    NotPermitted {
        /// The acting user's id.
        actor: String,
        /// The requested action.
        action: String,
        /// Why the action was refused.
        reason: String,
    },
}

impl WorkflowError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return WorkflowError.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = WorkflowError::ConfigNotFound {
            path: "/missing/users.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/users.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = WorkflowError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_not_found_displays_entity_and_id() {
        let error = WorkflowError::NotFound {
            entity: "requisition",
            id: "42".to_string(),
        };
        assert_eq!(error.to_string(), "requisition not found: 42");
    }

    #[test]
    fn test_invalid_transition_displays_action_and_status() {
        let error = WorkflowError::InvalidTransition {
            action: "approve".to_string(),
            status: "approved".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot approve when status is 'approved'"
        );
    }

    #[test]
    fn test_not_permitted_displays_actor_and_reason() {
        let error = WorkflowError::NotPermitted {
            actor: "u-admin".to_string(),
            action: "approve".to_string(),
            reason: "requires role 'HR Manager'".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "User 'u-admin' is not permitted to approve: requires role 'HR Manager'"
        );
    }

    #[test]
    fn test_validation_helper_builds_variant() {
        let error = WorkflowError::validation("end_date", "before start_date");
        assert_eq!(error.to_string(), "Invalid end_date: before start_date");
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<WorkflowError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_user_not_found() -> WorkflowResult<()> {
            Err(WorkflowError::UserNotFound {
                user_id: "ghost".to_string(),
            })
        }

        fn propagates_error() -> WorkflowResult<()> {
            returns_user_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
