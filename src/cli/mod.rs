//! CLI command implementations
//!
//! This module contains the implementation of all CLI subcommands.

pub mod grant;
pub mod setup;
pub mod up;
