//! External command execution.
//!
//! Build introspection shells out to the build system. The
//! [`CommandExecutor`] seam lets tests substitute canned outputs for real
//! processes.

use std::process::{Command, Output};

use log::{debug, trace};
use outpost_metadata::MetadataError;

use crate::error::{GeneratorError, Result};

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs `program` with `args` and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning or running the
    /// command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use outpost_metadata_gen::exec::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("meson", &["--version".to_owned()])?;
    /// assert!(output.status.success());
    /// # Ok::<(), outpost_metadata_gen::error::GeneratorError>(())
    /// ```
    fn run(&self, program: &str, args: &[String]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &str, args: &[String]) -> Result<Output> {
        Command::new(program)
            .args(args)
            .output()
            .map_err(GeneratorError::from)
    }
}

/// Runs a build-system query and returns its standard output.
///
/// The call blocks until the command exits; there is no timeout.
///
/// # Errors
///
/// Returns [`MetadataError::CollaboratorFailure`] when the command cannot be
/// started, exits unsuccessfully, or prints non-UTF-8 output.
pub fn query(
    executor: &dyn CommandExecutor,
    program: &str,
    args: &[String],
) -> outpost_metadata::Result<String> {
    let collaborator = describe(program, args);
    debug!("running {collaborator}");

    let output = executor
        .run(program, args)
        .map_err(|err| MetadataError::CollaboratorFailure {
            collaborator: collaborator.clone(),
            reason: err.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MetadataError::CollaboratorFailure {
            collaborator,
            reason: format!("{}: {}", output.status, stderr.trim()),
        });
    }

    let stdout =
        String::from_utf8(output.stdout).map_err(|err| MetadataError::CollaboratorFailure {
            collaborator: collaborator.clone(),
            reason: format!("output is not UTF-8: {err}"),
        })?;
    trace!("{collaborator} printed {} bytes", stdout.len());
    Ok(stdout)
}

/// Renders a command line for messages, e.g. `meson introspect --projectinfo`.
fn describe(program: &str, args: &[String]) -> String {
    let subcommand = args
        .iter()
        .take_while(|arg| !arg.contains(std::path::MAIN_SEPARATOR))
        .take(2)
        .map(String::as_str);
    std::iter::once(program)
        .chain(subcommand)
        .collect::<Vec<_>>()
        .join(" ")
}
