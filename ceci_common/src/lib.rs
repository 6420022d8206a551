//! Common utilities and shared types for the CECI workspace.
//!
//! This crate provides configuration handling and the common test cases
//! used across the matcher and the command-line tool.

mod config;
mod test_cases;

pub use crate::config::*;
pub use crate::test_cases::*;
