//! Package metadata synthesis for outpost applications.
//!
//! This crate derives the package descriptor that the packaging step links
//! into an application image. It merges three inputs:
//!
//! - build-system introspection (project identity and resolved dependency
//!   versions), through [`package::BuildIntrospection`];
//! - the flattened KConfig configuration, normalised by [`config::Config`];
//! - the hardware description, through [`devicetree::DeviceTreeView`].
//!
//! # Modules
//!
//! - [`config`] - Configuration normalisation
//! - [`devicetree`] - Device tree view and ownership resolution
//! - [`emit`] - Command-line argument rendering and output
//! - [`error`] - Error taxonomy
//! - [`package`] - Package descriptor assembly
//! - [`task`] - Task descriptor synthesis

pub mod config;
pub mod devicetree;
pub mod emit;
pub mod error;
pub mod package;
pub mod task;

pub use config::{Config, ConfigValue};
pub use devicetree::{DeviceId, DeviceTreeView, NoDevices};
pub use error::{MetadataError, Result};
pub use package::{BuildIntrospection, Dependency, PackageMetadata, ProjectInfo, assemble};
pub use task::{TaskDescriptor, TaskLabel, build_task};
