use crate::domain::{CommandResult, ShellCommand};
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Exit code reported when the program could not be spawned at all,
/// matching what a shell reports for a missing command.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Runs external commands to completion and captures their output.
///
/// Never fails: a non-zero exit, a signal or a spawn error all come back as a
/// [`CommandResult`]. Every run is logged at debug level.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, command: &ShellCommand) -> CommandResult {
        let result = match command {
            ShellCommand::Shell(line) => spawn(Command::new("sh").arg("-c").arg(line)),
            ShellCommand::Args(args) => match args.split_first() {
                Some((program, rest)) => spawn(Command::new(program).args(rest)),
                None => CommandResult {
                    exit_code: SPAWN_FAILURE_EXIT_CODE,
                    stdout: String::new(),
                    stderr: "comando vazio".into(),
                },
            },
        };

        debug!(
            command = %command,
            exit_code = result.exit_code,
            stdout = %result.stdout.trim_end(),
            stderr = %result.stderr.trim_end(),
            "comando executado"
        );

        result
    }
}

fn spawn(cmd: &mut Command) -> CommandResult {
    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    match output {
        Ok(output) => from_output(output),
        Err(e) => CommandResult {
            exit_code: SPAWN_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: e.to_string(),
        },
    }
}

fn from_output(output: Output) -> CommandResult {
    CommandResult {
        exit_code: exit_code(&output.status),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

#[cfg(unix)]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
