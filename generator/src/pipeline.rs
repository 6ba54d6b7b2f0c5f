//! Generation pipeline orchestration.
//!
//! Reads the task configuration and the device tree export, queries the
//! build system, assembles the descriptor and writes the
//! `--package-metadata` argument file.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use outpost_metadata::emit::write_package_metadata;
use outpost_metadata::{Config, NoDevices, PackageMetadata, assemble};

use crate::dts::DeviceTree;
use crate::error::{GeneratorError, Result};
use crate::exec::CommandExecutor;
use crate::introspect::IntrospectionSource;

/// Encoding of the task configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// A KConfig `.config` file of `KEY=value` lines.
    Dotconfig,
    /// A JSON object as exported by the KConfig JSON backend.
    Json,
}

/// Inputs of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// File receiving the `--package-metadata` argument.
    pub output: Utf8PathBuf,
    /// Task configuration.
    pub config: Utf8PathBuf,
    /// Encoding of [`Self::config`].
    pub config_format: ConfigFormat,
    /// Device tree export; the task owns no devices when `None`.
    pub dts: Option<Utf8PathBuf>,
    /// Build system queried for identity and dependency versions.
    pub introspection: IntrospectionSource,
}

/// Runs the generation and returns the descriptor that was written.
///
/// Nothing is written to [`PipelineConfig::output`] unless every step
/// succeeds.
///
/// # Errors
///
/// Returns [`GeneratorError::ConfigRead`] or [`GeneratorError::DeviceTree`]
/// if an input cannot be read, and [`GeneratorError::Metadata`] for any
/// synthesis or write failure.
pub fn run_pipeline(
    config: &PipelineConfig,
    executor: &dyn CommandExecutor,
) -> Result<PackageMetadata> {
    let task_config = load_config(&config.config, config.config_format)?;
    debug!("{}: {} configuration entries", config.config, task_config.len());

    let introspection = config.introspection.adapter(executor);
    let metadata = match &config.dts {
        Some(path) => {
            let tree = DeviceTree::load(path)?;
            assemble(introspection.as_ref(), &task_config, &tree)?
        }
        None => {
            debug!("no device tree export given, task owns no devices");
            assemble(introspection.as_ref(), &task_config, &NoDevices)?
        }
    };

    write_package_metadata(&metadata, &config.output)?;
    info!(
        "package metadata for {} {} written to {}",
        metadata.name(),
        metadata.version(),
        config.output
    );
    Ok(metadata)
}

/// Reads and parses the task configuration.
///
/// # Errors
///
/// Returns [`GeneratorError::ConfigRead`] if the file cannot be read, or
/// [`GeneratorError::Metadata`] if it does not parse.
pub fn load_config(path: &Utf8Path, format: ConfigFormat) -> Result<Config> {
    let source = std::fs::read_to_string(path).map_err(|source| GeneratorError::ConfigRead {
        path: path.to_owned(),
        source,
    })?;

    let config = match format {
        ConfigFormat::Dotconfig => Config::parse(&source)?,
        ConfigFormat::Json => Config::from_json_str(&source)?,
    };
    Ok(config)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
