//! Unit tests for the generation pipeline.
//!
//! Build-system queries are answered by a `StubExecutor`; configuration,
//! device tree exports and outputs live in a temporary directory.

use super::{ConfigFormat, PipelineConfig, load_config, run_pipeline};
use crate::error::GeneratorError;
use crate::introspect::IntrospectionSource;
use crate::test_utils::{ExpectedCall, StubExecutor, stdout_output};
use camino::{Utf8Path, Utf8PathBuf};
use outpost_metadata::{ConfigValue, MetadataError};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const DOTCONFIG: &str = "CONFIG_TASK_LABEL=0x1\nCONFIG_TASK_NAME=demo\nCONFIG_CAP_GPIO=y\n";

const BOARD: &str = r#"[
    {"path": "/soc/usart@40011000", "status": "okay", "outpost,owner": 2},
    {"path": "/soc/gpio@40020000", "status": "okay", "outpost,owner": 1},
    {"path": "/soc/i2c@40005400", "status": "disabled", "outpost,owner": 1},
    {"path": "/soc/timer@40000000"}
]"#;

const PROJECT_INFO: &str = r#"{"descriptive_name": "demo-app", "version": "1.0.0", "subprojects": []}"#;

const WITH_SHIELD: &str = r#"[{"name": "shield", "version": "2.3"}]"#;

const EXPECTED_ARGUMENT: &str = concat!(
    "--package-metadata='",
    r#"{"type":"outpost application","os":"outpost","name":"demo-app","version":"1.0.0","#,
    r#""libshield_version":"2.3","#,
    r#""task":{"label":"0x1","name":"demo","capabilities":["gpio"],"devs":[1]}}"#,
    "'",
);

/// A temporary directory holding the generator inputs.
struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, contents).expect("failed to write input");
        path
    }

    fn pipeline_config(&self, config: Utf8PathBuf, dts: Option<Utf8PathBuf>) -> PipelineConfig {
        PipelineConfig {
            output: self.root.join("package_metadata.json"),
            config,
            config_format: ConfigFormat::Dotconfig,
            dts,
            introspection: IntrospectionSource::Meson {
                program: "meson".to_owned(),
                build_root: Utf8PathBuf::from("/build"),
            },
        }
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("failed to create temp dir");
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("temp dir should be UTF-8");
    Workspace { _dir: dir, root }
}

fn meson_answers(dependencies: &'static str) -> StubExecutor {
    StubExecutor::new(vec![
        ExpectedCall {
            cmd: "meson",
            args: vec!["introspect", "--projectinfo", "/build"],
            result: Ok(stdout_output(PROJECT_INFO)),
        },
        ExpectedCall {
            cmd: "meson",
            args: vec!["introspect", "--dependencies", "/build"],
            result: Ok(stdout_output(dependencies)),
        },
    ])
}

fn read_output(path: &Utf8Path) -> String {
    std::fs::read_to_string(path).expect("output should be written")
}

#[rstest]
fn writes_descriptor_argument(workspace: Workspace) {
    let config = workspace.write(".config", DOTCONFIG);
    let dts = workspace.write("board.json", BOARD);
    let pipeline = workspace.pipeline_config(config, Some(dts));
    let executor = meson_answers(WITH_SHIELD);

    let metadata = run_pipeline(&pipeline, &executor).expect("pipeline should succeed");

    assert_eq!(read_output(&pipeline.output), EXPECTED_ARGUMENT);
    assert_eq!(metadata.libshield_version(), "2.3");
    executor.assert_finished();
}

#[rstest]
fn overwrites_existing_output(workspace: Workspace) {
    let config = workspace.write(".config", DOTCONFIG);
    let dts = workspace.write("board.json", BOARD);
    workspace.write("package_metadata.json", "stale contents that are longer than nothing");
    let pipeline = workspace.pipeline_config(config, Some(dts));

    run_pipeline(&pipeline, &meson_answers(WITH_SHIELD)).expect("pipeline should succeed");

    assert_eq!(read_output(&pipeline.output), EXPECTED_ARGUMENT);
}

#[rstest]
fn without_device_tree_the_task_owns_nothing(workspace: Workspace) {
    let config = workspace.write(".config", DOTCONFIG);
    let pipeline = workspace.pipeline_config(config, None);

    let metadata =
        run_pipeline(&pipeline, &meson_answers(WITH_SHIELD)).expect("pipeline should succeed");

    assert!(metadata.task().devs().is_empty());
    assert!(read_output(&pipeline.output).contains(r#""devs":[]"#));
}

#[rstest]
fn missing_shield_writes_nothing(workspace: Workspace) {
    let config = workspace.write(".config", DOTCONFIG);
    let pipeline = workspace.pipeline_config(config, None);
    let executor = meson_answers(r#"[{"name": "threads"}]"#);

    let err = run_pipeline(&pipeline, &executor).expect_err("pipeline should fail");

    assert!(matches!(
        err,
        GeneratorError::Metadata(MetadataError::MissingMandatoryDependency { .. })
    ));
    assert!(!pipeline.output.exists());
    executor.assert_finished();
}

#[rstest]
fn missing_config_is_reported_before_introspection(workspace: Workspace) {
    let pipeline = workspace.pipeline_config(workspace.root.join(".config"), None);
    let executor = StubExecutor::new(Vec::new());

    let err = run_pipeline(&pipeline, &executor).expect_err("pipeline should fail");

    assert!(matches!(err, GeneratorError::ConfigRead { .. }));
    assert!(!pipeline.output.exists());
}

#[rstest]
fn invalid_device_tree_writes_nothing(workspace: Workspace) {
    let config = workspace.write(".config", DOTCONFIG);
    let dts = workspace.write("board.json", "{}");
    let pipeline = workspace.pipeline_config(config, Some(dts));

    let err = run_pipeline(&pipeline, &StubExecutor::new(Vec::new()))
        .expect_err("pipeline should fail");

    assert!(matches!(err, GeneratorError::DeviceTree { .. }));
    assert!(!pipeline.output.exists());
}

#[rstest]
fn loads_json_configuration(workspace: Workspace) {
    let path = workspace.write(
        "config.json",
        r#"{"CONFIG_TASK_LABEL": "0x1", "CONFIG_CAP_GPIO": true, "CONFIG_TASK_PRIORITY": 3}"#,
    );

    let config = load_config(&path, ConfigFormat::Json).expect("configuration should load");

    assert_eq!(config.get("CONFIG_CAP_GPIO"), Some(&ConfigValue::Bool(true)));
    assert_eq!(
        config.get("CONFIG_TASK_PRIORITY"),
        Some(&ConfigValue::String("3".to_owned()))
    );
}

#[rstest]
#[case::dotconfig(ConfigFormat::Dotconfig, "CONFIG_TASK_LABEL\n")]
#[case::json(ConfigFormat::Json, "[1, 2]")]
fn malformed_configuration_is_a_metadata_error(
    workspace: Workspace,
    #[case] format: ConfigFormat,
    #[case] contents: &str,
) {
    let path = workspace.write("config", contents);

    let err = load_config(&path, format).expect_err("configuration should not load");

    assert!(matches!(err, GeneratorError::Metadata(_)));
}
