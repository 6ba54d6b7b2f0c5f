//! Meson build introspection.
//!
//! Queries a configured Meson build directory with
//! `meson introspect --projectinfo` and `meson introspect --dependencies`.

use camino::{Utf8Path, Utf8PathBuf};
use outpost_metadata::{BuildIntrospection, Dependency, MetadataError, ProjectInfo};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::exec::{CommandExecutor, query};

/// Default program name for Meson.
pub const MESON_PROGRAM: &str = "meson";

/// The subset of `meson introspect --projectinfo` the descriptor uses.
#[derive(Debug, Deserialize)]
struct MesonProjectInfo {
    descriptive_name: String,
    version: String,
    #[serde(default)]
    subprojects: Vec<Dependency>,
}

/// Build introspection backed by `meson introspect`.
pub struct MesonIntrospection<'a> {
    executor: &'a dyn CommandExecutor,
    program: String,
    build_root: Utf8PathBuf,
}

impl<'a> MesonIntrospection<'a> {
    /// Creates an adapter for the build directory `build_root`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, program: &str, build_root: &Utf8Path) -> Self {
        Self {
            executor,
            program: program.to_owned(),
            build_root: build_root.to_owned(),
        }
    }

    fn introspect<T: DeserializeOwned>(&self, query_flag: &str) -> outpost_metadata::Result<T> {
        let args = vec![
            "introspect".to_owned(),
            query_flag.to_owned(),
            self.build_root.to_string(),
        ];
        let stdout = query(self.executor, &self.program, &args)?;

        serde_json::from_str(stdout.trim()).map_err(|err| MetadataError::CollaboratorFailure {
            collaborator: format!("{} introspect {query_flag}", self.program),
            reason: format!("unexpected output: {err}"),
        })
    }
}

impl BuildIntrospection for MesonIntrospection<'_> {
    fn project_info(&self) -> outpost_metadata::Result<ProjectInfo> {
        let info: MesonProjectInfo = self.introspect("--projectinfo")?;
        Ok(ProjectInfo {
            name: info.descriptive_name,
            version: info.version,
            subprojects: info.subprojects,
        })
    }

    fn dependencies(&self) -> outpost_metadata::Result<Vec<Dependency>> {
        self.introspect("--dependencies")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, stdout_output};
    use rstest::rstest;

    const PROJECT_INFO: &str = r#"{
        "version": "1.0.0",
        "descriptive_name": "demo-app",
        "subproject_dir": "subprojects",
        "subprojects": [
            {"name": "libshield", "version": "0.5.2", "descriptive_name": "libshield"}
        ]
    }"#;

    const DEPENDENCIES: &str = r#"[
        {"name": "shield", "type": "pkgconfig", "version": "2.3", "compile_args": [], "link_args": []},
        {"name": "threads", "type": "system", "compile_args": [], "link_args": []}
    ]"#;

    fn call(flag: &'static str, result: crate::error::Result<std::process::Output>) -> ExpectedCall {
        ExpectedCall {
            cmd: "meson",
            args: vec!["introspect", flag, "/build"],
            result,
        }
    }

    #[rstest]
    fn reads_project_identity_and_subprojects() {
        let executor = StubExecutor::new(vec![call("--projectinfo", Ok(stdout_output(PROJECT_INFO)))]);
        let meson = MesonIntrospection::new(&executor, MESON_PROGRAM, Utf8Path::new("/build"));

        let info = meson.project_info().expect("project info should parse");

        assert_eq!(info.name, "demo-app");
        assert_eq!(info.version, "1.0.0");
        assert_eq!(info.subprojects, [Dependency::new("libshield", "0.5.2")]);
        executor.assert_finished();
    }

    #[rstest]
    fn reads_dependencies_with_missing_versions_as_empty() {
        let executor = StubExecutor::new(vec![call("--dependencies", Ok(stdout_output(DEPENDENCIES)))]);
        let meson = MesonIntrospection::new(&executor, MESON_PROGRAM, Utf8Path::new("/build"));

        let deps = meson.dependencies().expect("dependencies should parse");

        assert_eq!(
            deps,
            [Dependency::new("shield", "2.3"), Dependency::new("threads", "")]
        );
        executor.assert_finished();
    }

    #[rstest]
    fn failing_meson_is_reported() {
        let executor = StubExecutor::new(vec![call(
            "--projectinfo",
            Ok(failure_output("ERROR: Current directory is not a meson build directory.")),
        )]);
        let meson = MesonIntrospection::new(&executor, MESON_PROGRAM, Utf8Path::new("/build"));

        let err = meson.project_info().expect_err("introspection should fail");

        assert!(matches!(err, MetadataError::CollaboratorFailure { .. }));
        assert!(err.to_string().contains("not a meson build directory"));
    }

    #[rstest]
    #[case::not_json("Meson 1.4.0")]
    #[case::wrong_shape(r#"{"version": "1.0.0"}"#)]
    fn unparseable_output_is_reported(#[case] stdout: &str) {
        let executor = StubExecutor::new(vec![call("--projectinfo", Ok(stdout_output(stdout)))]);
        let meson = MesonIntrospection::new(&executor, MESON_PROGRAM, Utf8Path::new("/build"));

        let err = meson.project_info().expect_err("introspection should fail");

        match err {
            MetadataError::CollaboratorFailure {
                collaborator,
                reason,
            } => {
                assert_eq!(collaborator, "meson introspect --projectinfo");
                assert!(reason.starts_with("unexpected output"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
