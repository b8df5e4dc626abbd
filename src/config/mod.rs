//! Configuration loading and management for the office workflow engine.
//!
//! This module loads the approval chains, the user directory, the navigation
//! menu and the route guard rules from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use office_workflow::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/ghf-office").unwrap();
//! println!("Requisition stages: {:?}", config.requisition_workflow().stage_names());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    LeaveStageConfig, MenusConfig, RequisitionStageConfig, RoutesConfig, UsersConfig,
    WorkflowSettings,
};
