//! Running backup tools (`pg_dump`, `mysqldump`, `tar`, ...) from a plugin.
//!
//! The command line is split with [shellwords](super::shellwords) and executed
//! directly, never through `sh`. Streams default to the plugin's own
//! stdin/stdout/stderr so that payload data flows straight through.

use std::process::{Command, ExitStatus, Stdio};

use super::context::Context;
use super::error::PluginError;
use super::shellwords;

/// One subprocess invocation.
#[derive(Debug)]
pub struct ExecOptions {
    pub cmd: String,
    /// Inherited from the plugin when `None`.
    pub stdin: Option<Stdio>,
    /// Inherited from the plugin when `None`.
    pub stdout: Option<Stdio>,
    /// Inherited from the plugin when `None`.
    pub stderr: Option<Stdio>,
    /// Exit codes counted as success.
    pub expect_rc: Vec<i32>,
}

impl ExecOptions {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            stdin: None,
            stdout: None,
            stderr: None,
            expect_rc: vec![0],
        }
    }

    pub fn stdin(mut self, stdin: impl Into<Stdio>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn stdout(mut self, stdout: impl Into<Stdio>) -> Self {
        self.stdout = Some(stdout.into());
        self
    }

    pub fn stderr(mut self, stderr: impl Into<Stdio>) -> Self {
        self.stderr = Some(stderr.into());
        self
    }

    pub fn expect_rc(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.expect_rc = codes.into_iter().collect();
        self
    }
}

/// Runs `cmd` with inherited streams; only exit code 0 is a success.
pub fn exec(ctx: &Context, cmd: &str) -> Result<(), PluginError> {
    exec_with_options(ctx, ExecOptions::new(cmd))
}

/// Runs a command to completion and classifies its exit status.
///
/// Blocks until the child has exited. A command line that can't be split
/// fails before anything is spawned.
pub fn exec_with_options(ctx: &Context, opts: ExecOptions) -> Result<(), PluginError> {
    let ExecOptions {
        cmd,
        stdin,
        stdout,
        stderr,
        expect_rc,
    } = opts;

    let argv = shellwords::split(&cmd).map_err(|e| {
        PluginError::Exec(format!("Could not parse '{cmd}' into exec-able command: {e}"))
    })?;
    let Some((program, args)) = argv.split_first() else {
        return Err(PluginError::Exec(format!(
            "Could not parse '{cmd}' into exec-able command: no program given"
        )));
    };
    ctx.debug("plugin::exec", format_args!("Executing {}", describe(program, args)));

    let mut command = Command::new(program);
    command.args(args);
    if let Some(stdin) = stdin {
        command.stdin(stdin);
    }
    if let Some(stdout) = stdout {
        command.stdout(stdout);
    }
    if let Some(stderr) = stderr {
        command.stderr(stderr);
    }

    let status = command
        .status()
        .map_err(|e| PluginError::Exec(format!("Unable to exec '{program}': {e}")))?;
    ctx.debug("plugin::exec", format_args!("'{program}' finished: {status}"));

    classify(program, status, &expect_rc)
}

/// Argument values may carry credentials, so only their number is shown.
fn describe(program: &str, args: &[String]) -> String {
    match args.len() {
        1 => format!("'{program}' with 1 argument"),
        n => format!("'{program}' with {n} arguments"),
    }
}

fn classify(program: &str, status: ExitStatus, expect_rc: &[i32]) -> Result<(), PluginError> {
    match status.code() {
        Some(rc) if expect_rc.contains(&rc) => Ok(()),
        Some(rc) => Err(PluginError::Exec(format!(
            "{program} exited with unexpected exit code {rc}"
        ))),
        None => Err(PluginError::Exec(abnormal_exit(program, status))),
    }
}

#[cfg(unix)]
fn abnormal_exit(program: &str, status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(signal) => format!("{program} was terminated by signal {signal}"),
        None => format!("{program} exited abnormally: {status}"),
    }
}

#[cfg(not(unix))]
fn abnormal_exit(program: &str, status: ExitStatus) -> String {
    format!("{program} exited without an exit code: {status}")
}
