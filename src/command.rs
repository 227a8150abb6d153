//! Abstraction over external command execution.
//!
//! [`CommandRunner`] allows swapping the real system command execution
//! ([`SystemCommandRunner`]) with a mock in tests, so that adapter listing and
//! state changes can be exercised without `netsh` or administrator rights.

use crate::decode::Decoder;
use crate::error::NicError;
use std::io;
use std::process::Command;
use tracing::debug;

/// Trait for running external commands and capturing their stdout.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Run `cmd` with the given `args`.
    ///
    /// Return the trimmed stdout when the exit code is zero, an error otherwise.
    fn run(&self, cmd: &str, args: Vec<String>) -> Result<String, NicError>;
}

/// Default implementation that delegates to [`std::process::Command`].
///
/// Console windows are suppressed on Windows, and both streams go through the
/// [`Decoder`] fallback chain.
#[derive(Debug, Default)]
pub struct SystemCommandRunner {
    decoder: Decoder,
}

impl SystemCommandRunner {
    /// Create a runner decoding output with `decoder`.
    pub fn new(decoder: Decoder) -> Self {
        Self { decoder }
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, cmd: &str, args: Vec<String>) -> Result<String, NicError> {
        let command_line = command_line(cmd, &args);
        debug!("Running {}", command_line);
        let mut command = Command::new(cmd);
        command.args(&args);
        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            command.creation_flags(CREATE_NO_WINDOW);
        }
        let output = command.output().map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => NicError::ExecutableNotFound {
                program: cmd.to_owned(),
            },
            _ => NicError::Spawn {
                command: command_line.clone(),
                source: err,
            },
        })?;

        let stdout = self.decoder.decode("stdout", &output.stdout).text;
        let stderr = self.decoder.decode("stderr", &output.stderr).text;
        classify(&command_line, output.status.code(), &stdout, &stderr)
    }
}

/// Space-joined command line, for diagnostics only.
pub fn command_line(cmd: &str, args: &[String]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn decoded process output into the runner result.
///
/// Exit code zero yields the trimmed stdout. Otherwise the message is the
/// trimmed stderr, else the trimmed stdout, else a synthesized exit code
/// message. `code` is `None` when the process was killed by a signal.
pub fn classify(
    command_line: &str,
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<String, NicError> {
    if code == Some(0) {
        return Ok(stdout.trim().to_owned());
    }
    let message = [stderr.trim(), stdout.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| match code {
            Some(code) => format!("Command failed with exit code {code}"),
            None => "Command terminated without an exit code".to_owned(),
        });
    debug!("`{}` failed: {}", command_line, message);
    Err(NicError::ProcessFailure {
        message,
        command: command_line.to_owned(),
    })
}
