//! Scenemend - remediation of media files that Bazarr reports as broken
//!
//! This library crate exposes the core functionality for integration testing.

pub mod arr;
pub mod config;
pub mod executor;
pub mod guard;
pub mod logs;
pub mod remediation;
pub mod rules;
pub mod runner;
