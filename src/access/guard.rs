//! Route guard.
//!
//! Decides whether a user may open a client route, mirroring what the office
//! front end does before rendering a protected page: unauthenticated visitors
//! are sent to the login page with the attempted location preserved, and
//! authenticated users failing the role/permission check are sent to the
//! unauthorized page.

use serde::{Deserialize, Serialize};

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::User;

/// Roles and permissions a user must hold.
///
/// With `require_all` unset, holding any listed role (and any listed
/// permission) is enough. An empty list never restricts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequirement {
    /// Required role names.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Required permission names.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Require every listed role and permission instead of any.
    #[serde(default)]
    pub require_all: bool,
}

impl AccessRequirement {
    /// A requirement satisfied by any one of the given roles.
    pub fn any_role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns true if neither roles nor permissions are required.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.permissions.is_empty()
    }

    /// Evaluates the requirement against a user.
    ///
    /// # Examples
    ///
    /// ```
    /// use office_workflow::access::AccessRequirement;
    /// use office_workflow::models::User;
    ///
    /// let user = User {
    ///     id: "u-hr".to_string(),
    ///     first_name: "Ama".to_string(),
    ///     last_name: "Owusu".to_string(),
    ///     email: "ama@ghf.org".to_string(),
    ///     roles: vec!["HR Manager".to_string()],
    ///     permissions: vec![],
    /// };
    ///
    /// assert!(AccessRequirement::any_role(["Admin", "HR Manager"]).is_satisfied_by(&user));
    /// let mut both = AccessRequirement::any_role(["Admin", "HR Manager"]);
    /// both.require_all = true;
    /// assert!(!both.is_satisfied_by(&user));
    /// ```
    pub fn is_satisfied_by(&self, user: &User) -> bool {
        let roles_ok = self.roles.is_empty()
            || if self.require_all {
                self.roles.iter().all(|r| user.has_role(r))
            } else {
                self.roles.iter().any(|r| user.has_role(r))
            };
        let permissions_ok = self.permissions.is_empty()
            || if self.require_all {
                self.permissions.iter().all(|p| user.has_permission(p))
            } else {
                self.permissions.iter().any(|p| user.has_permission(p))
            };
        roles_ok && permissions_ok
    }
}

/// Outcome of evaluating a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Render the route.
    Allow,
    /// Send the visitor to log in, then back to `from`.
    RedirectToLogin {
        /// Login route.
        login_path: String,
        /// The location originally requested.
        from: String,
    },
    /// Send the user to the unauthorized page.
    RedirectToUnauthorized {
        /// Unauthorized route.
        unauthorized_path: String,
    },
}

impl AccessDecision {
    /// Returns true for [`AccessDecision::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// A guard rule for a route pattern, as written in `routes.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteRule {
    /// Pattern such as `/leaves/:id` or `/admin/*`.
    pub pattern: String,
    /// Reachable without logging in.
    #[serde(default)]
    pub public: bool,
    /// What an authenticated user must hold.
    #[serde(flatten)]
    pub requirement: AccessRequirement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    Rest,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    segments: Vec<Segment>,
    rule: RouteRule,
}

impl CompiledRule {
    fn compile(rule: RouteRule) -> WorkflowResult<Self> {
        let pattern = rule.pattern.trim();
        if !pattern.starts_with('/') {
            return Err(WorkflowError::InvalidConfig {
                message: format!("route pattern '{}' must start with '/'", rule.pattern),
            });
        }

        let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            let segment = match *part {
                "*" if index + 1 == parts.len() => Segment::Rest,
                "*" => {
                    return Err(WorkflowError::InvalidConfig {
                        message: format!(
                            "route pattern '{}' may only end with '*'",
                            rule.pattern
                        ),
                    });
                }
                p if p.starts_with(':') => Segment::Param,
                p => Segment::Literal(p.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self { segments, rule })
    }

    /// (literal segments, total segments, not a catch-all); higher wins.
    fn specificity(&self) -> (usize, usize, bool) {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        let rest = self.segments.last() == Some(&Segment::Rest);
        (literals, self.segments.len(), !rest)
    }

    fn matches(&self, path: &[&str]) -> bool {
        let mut index = 0;
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Param => {
                    if index >= path.len() {
                        return false;
                    }
                }
                Segment::Literal(lit) => {
                    if path.get(index) != Some(&lit.as_str()) {
                        return false;
                    }
                }
            }
            index += 1;
        }
        index == path.len()
    }
}

/// Evaluates client routes against their guard rules.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    rules: Vec<CompiledRule>,
    login_path: String,
    unauthorized_path: String,
}

impl RouteGuard {
    /// Compiles the rules; the most specific matching rule wins at evaluation.
    pub fn new(
        rules: Vec<RouteRule>,
        login_path: impl Into<String>,
        unauthorized_path: impl Into<String>,
    ) -> WorkflowResult<Self> {
        let mut compiled = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<WorkflowResult<Vec<_>>>()?;
        compiled.sort_by_key(|rule| std::cmp::Reverse(rule.specificity()));

        Ok(Self {
            rules: compiled,
            login_path: login_path.into(),
            unauthorized_path: unauthorized_path.into(),
        })
    }

    /// Returns the login route.
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Returns the unauthorized route.
    pub fn unauthorized_path(&self) -> &str {
        &self.unauthorized_path
    }

    /// Decides what happens when `user` (or an anonymous visitor) opens `path`.
    ///
    /// `path` may carry a query string or fragment; only the path part is
    /// matched, but the redirect keeps the location verbatim. Paths matching
    /// no rule need a login and nothing else.
    pub fn evaluate(&self, path: &str, user: Option<&User>) -> AccessDecision {
        let route = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();

        if self.is_redirect_target(&segments) {
            return AccessDecision::Allow;
        }

        let rule = self.rules.iter().find(|r| r.matches(&segments));
        if rule.is_some_and(|r| r.rule.public) {
            return AccessDecision::Allow;
        }

        let Some(user) = user else {
            return AccessDecision::RedirectToLogin {
                login_path: self.login_path.clone(),
                from: path.to_string(),
            };
        };

        match rule {
            Some(r) if !r.rule.requirement.is_satisfied_by(user) => {
                AccessDecision::RedirectToUnauthorized {
                    unauthorized_path: self.unauthorized_path.clone(),
                }
            }
            _ => AccessDecision::Allow,
        }
    }

    fn is_redirect_target(&self, segments: &[&str]) -> bool {
        [&self.login_path, &self.unauthorized_path].iter().any(|target| {
            let target: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();
            target == segments
        })
    }
}
