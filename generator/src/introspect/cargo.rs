//! Cargo build introspection.
//!
//! Runs `cargo metadata` once and derives the project identity and the
//! resolved package graph from it.

use std::cell::OnceCell;

use camino::{Utf8Path, Utf8PathBuf};
use cargo_metadata::{Metadata, MetadataCommand, Package};
use log::debug;
use outpost_metadata::{BuildIntrospection, Dependency, MetadataError, ProjectInfo};

use crate::exec::{CommandExecutor, query};

/// Default program name for Cargo.
pub const CARGO_PROGRAM: &str = "cargo";

/// Build introspection backed by `cargo metadata`.
pub struct CargoIntrospection<'a> {
    executor: &'a dyn CommandExecutor,
    program: String,
    manifest_path: Option<Utf8PathBuf>,
    package: Option<String>,
    metadata: OnceCell<Metadata>,
}

impl<'a> CargoIntrospection<'a> {
    /// Creates an adapter for the workspace of `manifest_path` (or the
    /// current directory). `package` selects the packaged crate; the root
    /// package is used when it is `None`.
    #[must_use]
    pub fn new(
        executor: &'a dyn CommandExecutor,
        program: &str,
        manifest_path: Option<&Utf8Path>,
        package: Option<&str>,
    ) -> Self {
        Self {
            executor,
            program: program.to_owned(),
            manifest_path: manifest_path.map(Utf8Path::to_owned),
            package: package.map(str::to_owned),
            metadata: OnceCell::new(),
        }
    }

    fn metadata(&self) -> outpost_metadata::Result<&Metadata> {
        if let Some(metadata) = self.metadata.get() {
            return Ok(metadata);
        }

        let mut args = vec!["metadata".to_owned(), "--format-version".to_owned(), "1".to_owned()];
        if let Some(manifest_path) = &self.manifest_path {
            args.push("--manifest-path".to_owned());
            args.push(manifest_path.to_string());
        }

        let stdout = query(self.executor, &self.program, &args)?;
        let metadata = parse_metadata(&stdout)?;
        Ok(self.metadata.get_or_init(|| metadata))
    }
}

impl BuildIntrospection for CargoIntrospection<'_> {
    fn project_info(&self) -> outpost_metadata::Result<ProjectInfo> {
        project_from_metadata(self.metadata()?, self.package.as_deref())
    }

    fn dependencies(&self) -> outpost_metadata::Result<Vec<Dependency>> {
        dependencies_from_metadata(self.metadata()?, self.package.as_deref())
    }
}

/// Parses the JSON printed by `cargo metadata --format-version 1`.
///
/// # Errors
///
/// Returns [`MetadataError::CollaboratorFailure`] if the text is not valid
/// metadata.
pub fn parse_metadata(stdout: &str) -> outpost_metadata::Result<Metadata> {
    MetadataCommand::parse(stdout).map_err(|err| MetadataError::CollaboratorFailure {
        collaborator: "cargo metadata".to_owned(),
        reason: format!("unexpected output: {err}"),
    })
}

/// Selects the packaged crate and reports the other workspace members as
/// subprojects.
///
/// # Errors
///
/// Returns [`MetadataError::CollaboratorFailure`] if the named package is
/// not a workspace member, or if no name is given and the workspace has no
/// root package.
pub fn project_from_metadata(
    metadata: &Metadata,
    package: Option<&str>,
) -> outpost_metadata::Result<ProjectInfo> {
    let project = packaged_crate(metadata, package)?;
    debug!("packaging crate {} {}", project.name, project.version);

    let subprojects = metadata
        .workspace_packages()
        .into_iter()
        .filter(|member| member.id != project.id)
        .map(dependency_of)
        .collect();

    Ok(ProjectInfo {
        name: project.name.to_string(),
        version: project.version.to_string(),
        subprojects,
    })
}

/// Lists every package of the graph except the packaged crate.
///
/// Other workspace members are included, so a runtime crate built in the
/// same workspace resolves like a registry dependency.
///
/// # Errors
///
/// Returns [`MetadataError::CollaboratorFailure`] under the same conditions
/// as [`project_from_metadata`].
pub fn dependencies_from_metadata(
    metadata: &Metadata,
    package: Option<&str>,
) -> outpost_metadata::Result<Vec<Dependency>> {
    let project = packaged_crate(metadata, package)?;

    Ok(metadata
        .packages
        .iter()
        .filter(|candidate| candidate.id != project.id)
        .map(dependency_of)
        .collect())
}

fn packaged_crate<'m>(
    metadata: &'m Metadata,
    package: Option<&str>,
) -> outpost_metadata::Result<&'m Package> {
    match package {
        Some(name) => metadata
            .workspace_packages()
            .into_iter()
            .find(|member| member.name.to_string() == name),
        None => metadata.root_package(),
    }
    .ok_or_else(|| MetadataError::CollaboratorFailure {
        collaborator: "cargo metadata".to_owned(),
        reason: package.map_or_else(
            || "workspace has no root package; select one with --package".to_owned(),
            |name| format!("package {name} is not a workspace member"),
        ),
    })
}

fn dependency_of(package: &Package) -> Dependency {
    Dependency::new(package.name.to_string(), package.version.to_string())
}
