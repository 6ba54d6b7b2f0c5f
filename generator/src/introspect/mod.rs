//! Build-system introspection adapters.
//!
//! - [`meson`] queries a configured Meson build directory.
//! - [`cargo`] reads the Cargo package graph.

pub mod cargo;
pub mod meson;

use camino::Utf8PathBuf;
use outpost_metadata::BuildIntrospection;

use crate::exec::CommandExecutor;

pub use self::cargo::CargoIntrospection;
pub use self::meson::MesonIntrospection;

/// Where project identity and dependency versions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntrospectionSource {
    /// A configured Meson build directory.
    Meson {
        /// Meson program to run.
        program: String,
        /// The build directory.
        build_root: Utf8PathBuf,
    },
    /// A Cargo workspace.
    Cargo {
        /// Cargo program to run.
        program: String,
        /// Manifest of the workspace; the current directory when `None`.
        manifest_path: Option<Utf8PathBuf>,
        /// Packaged crate; the root package when `None`.
        package: Option<String>,
    },
}

impl IntrospectionSource {
    /// Creates the adapter for this source.
    #[must_use]
    pub fn adapter<'a>(
        &'a self,
        executor: &'a dyn CommandExecutor,
    ) -> Box<dyn BuildIntrospection + 'a> {
        match self {
            Self::Meson {
                program,
                build_root,
            } => Box::new(MesonIntrospection::new(executor, program, build_root)),
            Self::Cargo {
                program,
                manifest_path,
                package,
            } => Box::new(CargoIntrospection::new(
                executor,
                program,
                manifest_path.as_deref(),
                package.as_deref(),
            )),
        }
    }
}
