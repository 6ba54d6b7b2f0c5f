//! CLI argument definitions for the package metadata generator.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use log::LevelFilter;

use crate::error::{GeneratorError, Result};
use crate::introspect::IntrospectionSource;
use crate::introspect::cargo::CARGO_PROGRAM;
use crate::introspect::meson::MESON_PROGRAM;
use crate::pipeline::{ConfigFormat, PipelineConfig};

/// Generate the package metadata of an outpost application.
#[derive(Parser, Debug, Clone)]
#[command(name = "gen-package-metadata")]
#[command(version, about)]
#[command(long_about = concat!(
    "Generate the package metadata of an outpost application.\n\n",
    "The descriptor merges the project identity and shield runtime version ",
    "reported by the build system, the task fields and capabilities selected ",
    "in the KConfig configuration, and the devices the task owns in the ",
    "device tree. It is written as a single `--package-metadata='<json>'` ",
    "linker argument.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Meson project:\n",
    "    $ gen-package-metadata build/package-metadata.json \\\n",
    "        --build-root build --config build/.config --dts build/board.json\n\n",
    "  Cargo crate, from a build script:\n",
    "    $ gen-package-metadata \"$OUT_DIR/package_metadata.json\" --build-system cargo \\\n",
    "        --package my-task --config .config --link-arg --linker arm-none-eabi-gcc",
))]
pub struct Cli {
    /// File receiving the `--package-metadata` argument.
    #[arg(value_name = "OUTPUT")]
    pub output: Utf8PathBuf,

    /// KConfig configuration of the task.
    #[arg(long, value_name = "FILE", default_value = ".config")]
    pub config: Utf8PathBuf,

    /// Format of the configuration file.
    #[arg(long, value_enum, default_value_t = ConfigFormatArg::Auto)]
    pub config_format: ConfigFormatArg,

    /// JSON export of the device tree; without it the task owns no devices.
    #[arg(long, value_name = "FILE")]
    pub dts: Option<Utf8PathBuf>,

    /// Build system to introspect.
    #[arg(long, value_enum, default_value_t = BuildSystem::Meson)]
    pub build_system: BuildSystem,

    /// Meson build directory.
    #[arg(long, value_name = "DIR")]
    pub build_root: Option<Utf8PathBuf>,

    /// Meson program.
    #[arg(long, value_name = "PROGRAM", default_value = MESON_PROGRAM)]
    pub meson: String,

    /// Cargo program.
    #[arg(long, value_name = "PROGRAM", default_value = CARGO_PROGRAM)]
    pub cargo: String,

    /// Cargo manifest of the workspace [default: current directory].
    #[arg(long, value_name = "FILE")]
    pub manifest_path: Option<Utf8PathBuf>,

    /// Cargo package being packaged [default: root package].
    #[arg(long, value_name = "NAME")]
    pub package: Option<String>,

    /// Print the `cargo::rustc-link-arg-bins` directive loading OUTPUT.
    #[arg(long)]
    pub link_arg: bool,

    /// Linker used for the binary; GCC drivers get a `-Wl,` prefix.
    #[arg(long, value_name = "LINKER", requires = "link_arg")]
    pub linker: Option<String>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Supported build systems.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSystem {
    /// `meson introspect` on a build directory.
    Meson,
    /// `cargo metadata` on a workspace.
    Cargo,
}

impl BuildSystem {
    /// Name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Meson => "meson",
            Self::Cargo => "cargo",
        }
    }
}

/// Configuration file formats accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormatArg {
    /// JSON for a `.json` extension, dotconfig otherwise.
    Auto,
    /// `KEY=value` lines.
    Dotconfig,
    /// A JSON object.
    Json,
}

impl ConfigFormatArg {
    /// Resolves the format of `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use outpost_metadata_gen::cli::ConfigFormatArg;
    /// use outpost_metadata_gen::pipeline::ConfigFormat;
    ///
    /// let auto = ConfigFormatArg::Auto;
    /// assert_eq!(auto.resolve(Utf8Path::new("build/config.json")), ConfigFormat::Json);
    /// assert_eq!(auto.resolve(Utf8Path::new("build/.config")), ConfigFormat::Dotconfig);
    /// ```
    #[must_use]
    pub fn resolve(self, path: &Utf8Path) -> ConfigFormat {
        match self {
            Self::Dotconfig => ConfigFormat::Dotconfig,
            Self::Json => ConfigFormat::Json,
            Self::Auto if path.extension() == Some("json") => ConfigFormat::Json,
            Self::Auto => ConfigFormat::Dotconfig,
        }
    }
}

impl Cli {
    /// Log level selected by `-v`/`-q`.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Converts the arguments into an explicit pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::MissingOption`] when Meson is selected
    /// without `--build-root`.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let introspection = match self.build_system {
            BuildSystem::Meson => IntrospectionSource::Meson {
                program: self.meson.clone(),
                build_root: self.build_root.clone().ok_or(GeneratorError::MissingOption {
                    option: "--build-root",
                    build_system: BuildSystem::Meson.name(),
                })?,
            },
            BuildSystem::Cargo => IntrospectionSource::Cargo {
                program: self.cargo.clone(),
                manifest_path: self.manifest_path.clone(),
                package: self.package.clone(),
            },
        };

        Ok(PipelineConfig {
            output: self.output.clone(),
            config: self.config.clone(),
            config_format: self.config_format.resolve(&self.config),
            dts: self.dts.clone(),
            introspection,
        })
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
