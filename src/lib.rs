//! Access control and approval workflow engine for the GHF Office System.
//!
//! This crate decides which users may open which parts of the office
//! application and drives the approval chains behind leave applications
//! and purchase requisitions. Roles, permissions, menus and approval stages
//! are loaded from YAML configuration; records are held in memory.

#![warn(missing_docs)]

pub mod access;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod workflow;
