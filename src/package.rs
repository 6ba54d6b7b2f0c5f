//! Package metadata assembly.
//!
//! The package descriptor combines build-system introspection (project name,
//! version and the resolved version of the shield runtime) with the task
//! descriptor. A package without a resolvable shield dependency is not a
//! valid artefact, so assembly fails rather than emitting it.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::devicetree::DeviceTreeView;
use crate::error::{MetadataError, Result};
use crate::task::{TaskDescriptor, build_task};

/// Package type tag of every descriptor.
pub const PACKAGE_TYPE: &str = "outpost application";

/// Operating system tag of every descriptor.
pub const PACKAGE_OS: &str = "outpost";

/// Lookup names for a runtime dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyLookup {
    /// Name searched among resolved dependencies.
    pub dependency: &'static str,
    /// Name searched among internal subprojects when the first search fails.
    pub subproject: &'static str,
}

/// The shield runtime library; mandatory.
pub const SHIELD: DependencyLookup = DependencyLookup {
    dependency: "shield",
    subproject: "libshield",
};

/// The kernel user API crate; recorded when present.
pub const UAPI: DependencyLookup = DependencyLookup {
    dependency: "uapi",
    subproject: "uapi",
};

/// A named component with its resolved version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dependency {
    /// Component name.
    pub name: String,
    /// Resolved version; may be empty when the build system cannot tell.
    #[serde(default)]
    pub version: String,
}

impl Dependency {
    /// Creates a dependency record.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Identity of the project being packaged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectInfo {
    /// Project name.
    pub name: String,
    /// Project version.
    pub version: String,
    /// Internal subprojects built alongside the project.
    pub subprojects: Vec<Dependency>,
}

/// Build-system introspection, as consumed by the assembler.
pub trait BuildIntrospection {
    /// Returns the project identity and its subprojects.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::CollaboratorFailure`] when the build system
    /// cannot be queried.
    fn project_info(&self) -> Result<ProjectInfo>;

    /// Returns the resolved external dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::CollaboratorFailure`] when the build system
    /// cannot be queried.
    fn dependencies(&self) -> Result<Vec<Dependency>>;
}

/// Resolves the version of a dependency.
///
/// The resolved dependencies are searched first for `lookup.dependency`
/// with a non-empty version; failing that, the subprojects are searched for
/// `lookup.subproject`. The first match of each search wins.
///
/// # Examples
///
/// ```
/// use outpost_metadata::package::{Dependency, SHIELD, resolve_version};
///
/// let deps = [Dependency::new("shield", "")];
/// let subprojects = [Dependency::new("libshield", "0.4.1")];
/// assert_eq!(resolve_version(SHIELD, &deps, &subprojects), Some("0.4.1"));
/// ```
#[must_use]
pub fn resolve_version<'a>(
    lookup: DependencyLookup,
    dependencies: &'a [Dependency],
    subprojects: &'a [Dependency],
) -> Option<&'a str> {
    find_dependency(dependencies, lookup.dependency)
        .or_else(|| find_subproject(subprojects, lookup.subproject))
        .map(|dep| dep.version.as_str())
}

fn find_dependency<'a>(dependencies: &'a [Dependency], name: &str) -> Option<&'a Dependency> {
    dependencies
        .iter()
        .find(|dep| dep.name == name && !dep.version.is_empty())
}

fn find_subproject<'a>(subprojects: &'a [Dependency], name: &str) -> Option<&'a Dependency> {
    subprojects.iter().find(|dep| dep.name == name)
}

/// The package descriptor document.
///
/// Field order is the serialised key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    #[serde(rename = "type")]
    package_type: &'static str,
    os: &'static str,
    name: String,
    version: String,
    libshield_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uapi_version: Option<String>,
    task: TaskDescriptor,
}

impl PackageMetadata {
    /// Project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Resolved shield runtime version.
    #[must_use]
    pub fn libshield_version(&self) -> &str {
        &self.libshield_version
    }

    /// Resolved user API version, if the project depends on it.
    #[must_use]
    pub fn uapi_version(&self) -> Option<&str> {
        self.uapi_version.as_deref()
    }

    /// The task sub-document.
    #[must_use]
    pub fn task(&self) -> &TaskDescriptor {
        &self.task
    }

    /// Serialises the descriptor to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Serialization`] if serialisation fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(MetadataError::Serialization)
    }
}

/// Assembles the package descriptor.
///
/// Introspection and the shield lookup run before the task descriptor is
/// derived.
///
/// # Errors
///
/// Propagates introspection failures unchanged, returns
/// [`MetadataError::MissingMandatoryDependency`] when the shield version
/// cannot be resolved, and any error from [`build_task`].
pub fn assemble<I, V>(introspection: &I, config: &Config, devices: &V) -> Result<PackageMetadata>
where
    I: BuildIntrospection + ?Sized,
    V: DeviceTreeView + ?Sized,
{
    let project = introspection.project_info()?;
    let dependencies = introspection.dependencies()?;
    debug!(
        "project {} {}: {} dependencies, {} subprojects",
        project.name,
        project.version,
        dependencies.len(),
        project.subprojects.len()
    );

    let libshield_version = resolve_version(SHIELD, &dependencies, &project.subprojects)
        .ok_or(MetadataError::MissingMandatoryDependency {
            dependency: SHIELD.subproject,
        })?
        .to_owned();
    info!("shield runtime version {libshield_version}");

    let uapi_version =
        resolve_version(UAPI, &dependencies, &project.subprojects).map(str::to_owned);
    if uapi_version.is_none() {
        warn!("{} dependency not found", UAPI.dependency);
    }

    let task = build_task(config, devices)?;

    Ok(PackageMetadata {
        package_type: PACKAGE_TYPE,
        os: PACKAGE_OS,
        name: project.name,
        version: project.version,
        libshield_version,
        uapi_version,
        task,
    })
}
