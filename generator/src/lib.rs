//! Outpost package metadata generator.
//!
//! This crate feeds the synthesis in [`outpost_metadata`] from real inputs:
//! a KConfig configuration file, a device tree export and a Meson or Cargo
//! build. It is used by the `gen-package-metadata` binary and can be called
//! directly from build scripts.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`dts`] - Device tree export loading
//! - [`error`] - Generator error types
//! - [`exec`] - Command execution for build-system queries
//! - [`introspect`] - Meson and Cargo introspection adapters
//! - [`pipeline`] - Generation pipeline orchestration

pub mod cli;
pub mod dts;
pub mod error;
pub mod exec;
pub mod introspect;
pub mod pipeline;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
