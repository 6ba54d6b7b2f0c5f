//! Output emission.
//!
//! The descriptor is handed to the linker as a response-file argument:
//! `--package-metadata='<json>'`. The JSON is rendered in full before the
//! destination is opened, so every earlier failure leaves the destination
//! untouched.

use camino::Utf8Path;
use log::debug;

use crate::error::{MetadataError, Result};
use crate::package::PackageMetadata;

/// Option name the packaging step expects.
pub const ARGUMENT_PREFIX: &str = "--package-metadata='";

/// Closing quote of the argument.
pub const ARGUMENT_SUFFIX: &str = "'";

/// Wraps a JSON payload in the command-line argument template.
///
/// Single quotes can only occur inside JSON strings; they are replaced by
/// the equivalent `\u0027` escape so the payload cannot end the quoted
/// argument early.
///
/// # Examples
///
/// ```
/// use outpost_metadata::emit::render_argument;
///
/// assert_eq!(render_argument(r#"{"a":1}"#), r#"--package-metadata='{"a":1}'"#);
/// assert_eq!(
///     render_argument(r#"{"name":"it's"}"#),
///     r#"--package-metadata='{"name":"it\u0027s"}'"#
/// );
/// ```
#[must_use]
pub fn render_argument(json: &str) -> String {
    let escaped = json.replace('\'', "\\u0027");
    format!("{ARGUMENT_PREFIX}{escaped}{ARGUMENT_SUFFIX}")
}

/// Renders the complete argument for a descriptor.
///
/// # Errors
///
/// Returns [`MetadataError::Serialization`] if the descriptor cannot be
/// rendered.
pub fn render_package_metadata(metadata: &PackageMetadata) -> Result<String> {
    metadata.to_json().map(|json| render_argument(&json))
}

/// Writes the descriptor argument to `output`, replacing existing content.
///
/// An interruption while writing may leave a truncated file; the packaging
/// step verifies its input.
///
/// # Errors
///
/// Returns [`MetadataError::Serialization`] before touching `output` if
/// rendering fails, or [`MetadataError::WriteFailed`] if the write fails.
pub fn write_package_metadata(metadata: &PackageMetadata, output: &Utf8Path) -> Result<()> {
    let argument = render_package_metadata(metadata)?;
    std::fs::write(output, argument.as_bytes()).map_err(|source| MetadataError::WriteFailed {
        path: output.to_owned(),
        source,
    })?;
    debug!("wrote {} bytes of package metadata to {output}", argument.len());
    Ok(())
}

/// Returns the linker argument that loads the descriptor file.
///
/// GCC drivers forward linker options through `-Wl,`; other linkers take the
/// response file directly.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use outpost_metadata::emit::link_arg;
///
/// let file = Utf8Path::new("/out/package_metadata.json");
/// assert_eq!(link_arg(file, Some("arm-none-eabi-gcc")), "-Wl,@/out/package_metadata.json");
/// assert_eq!(link_arg(file, Some("rust-lld")), "@/out/package_metadata.json");
/// assert_eq!(link_arg(file, None), "@/out/package_metadata.json");
/// ```
#[must_use]
pub fn link_arg(metadata_file: &Utf8Path, linker: Option<&str>) -> String {
    match linker {
        Some(linker) if linker.ends_with("gcc") => format!("-Wl,@{metadata_file}"),
        _ => format!("@{metadata_file}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::devicetree::NoDevices;
    use crate::package::{BuildIntrospection, Dependency, ProjectInfo, assemble};
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Introspection {
        name: &'static str,
    }

    impl BuildIntrospection for Introspection {
        fn project_info(&self) -> Result<ProjectInfo> {
            Ok(ProjectInfo {
                name: self.name.to_owned(),
                version: "0.1.0".to_owned(),
                subprojects: vec![Dependency::new("libshield", "1.2.0")],
            })
        }

        fn dependencies(&self) -> Result<Vec<Dependency>> {
            Ok(Vec::new())
        }
    }

    fn metadata(name: &'static str) -> PackageMetadata {
        let config = Config::parse("CONFIG_TASK_LABEL=0x2\n").expect("configuration should parse");
        assemble(&Introspection { name }, &config, &NoDevices).expect("assembly should succeed")
    }

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("failed to create temp dir")
    }

    fn utf8_path(dir: &TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().join(name)).expect("temp dir should be UTF-8")
    }

    #[rstest]
    fn rendered_argument_is_framed_by_single_quotes() {
        let rendered = render_package_metadata(&metadata("demo")).expect("render should succeed");

        assert!(rendered.starts_with("--package-metadata='{\"type\":\"outpost application\""));
        assert!(rendered.ends_with("}'"));
        assert_eq!(rendered.matches('\'').count(), 2);
    }

    #[rstest]
    fn quotes_in_values_stay_inside_the_argument() {
        let rendered = render_package_metadata(&metadata("bob's-app")).expect("render should succeed");

        assert_eq!(rendered.matches('\'').count(), 2);
        let json = rendered
            .strip_prefix(ARGUMENT_PREFIX)
            .and_then(|rest| rest.strip_suffix(ARGUMENT_SUFFIX))
            .expect("argument framing should be intact");
        let value: serde_json::Value = serde_json::from_str(json).expect("payload should be JSON");
        assert_eq!(value["name"], "bob's-app");
    }

    #[rstest]
    fn writes_and_overwrites_the_output(temp_dir: TempDir) {
        let output = utf8_path(&temp_dir, "package_metadata.json");
        std::fs::write(&output, "stale content that is longer than nothing")
            .expect("seed file should be written");

        write_package_metadata(&metadata("demo"), &output).expect("write should succeed");

        let written = std::fs::read_to_string(&output).expect("output should be readable");
        assert_eq!(
            written,
            render_package_metadata(&metadata("demo")).expect("render should succeed")
        );
        assert!(!written.ends_with('\n'));
    }

    #[rstest]
    fn reports_unwritable_destinations(temp_dir: TempDir) {
        let output = utf8_path(&temp_dir, "missing/dir/package_metadata.json");

        let outcome = write_package_metadata(&metadata("demo"), &output);

        assert!(matches!(outcome, Err(MetadataError::WriteFailed { .. })));
    }

    #[rstest]
    #[case::gcc(Some("gcc"), "-Wl,@meta")]
    #[case::cross_gcc(Some("/usr/bin/arm-none-eabi-gcc"), "-Wl,@meta")]
    #[case::clang(Some("clang"), "@meta")]
    #[case::default(None, "@meta")]
    fn link_arg_matches_linker_flavour(#[case] linker: Option<&str>, #[case] expected: &str) {
        assert_eq!(link_arg(Utf8Path::new("meta"), linker), expected);
    }
}
