//! Access control for the office system.
//!
//! This module provides the role/permission route guard and the menu
//! visibility filter built on the same requirement check.

mod guard;
mod menu;

pub use guard::{AccessDecision, AccessRequirement, RouteGuard, RouteRule};
pub use menu::{MenuNode, MenuTree};
