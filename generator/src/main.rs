//! Package metadata generator CLI entrypoint.
//!
//! This binary writes the `--package-metadata` argument of an outpost
//! application. With `--link-arg` it also prints the Cargo directive that
//! passes the argument file to the linker.

use clap::Parser;
use outpost_metadata::emit::link_arg;
use outpost_metadata_gen::cli::Cli;
use outpost_metadata_gen::error::{GeneratorError, Result};
use outpost_metadata_gen::exec::SystemCommandExecutor;
use outpost_metadata_gen::pipeline::run_pipeline;
use std::io::Write;

/// Cargo build-script directive adding a linker argument to binaries.
const LINK_ARG_DIRECTIVE: &str = "cargo::rustc-link-arg-bins";

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write) -> Result<()> {
    let config = cli.pipeline_config()?;
    run_pipeline(&config, &SystemCommandExecutor)?;

    if cli.link_arg {
        let argument = link_arg(&config.output, cli.linker.as_deref());
        writeln!(stdout, "{LINK_ARG_DIRECTIVE}={argument}")
            .map_err(|source| GeneratorError::WriteFailed { source })?;
    }

    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {}", error_report(&err)));
            1
        }
    }
}

/// Renders an error followed by each of its causes.
fn error_report(err: &dyn std::error::Error) -> String {
    std::iter::successors(err.source(), |cause| cause.source()).fold(
        err.to_string(),
        |mut report, cause| {
            report.push_str(": ");
            report.push_str(&cause.to_string());
            report
        },
    )
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}
