//! Command runner for external process execution

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{LetMeHearError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Command output
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// Runs external commands with a per-invocation timeout.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Render a command the way it would be typed in a shell, for logs and errors.
    pub fn describe(cmd: &Command) -> String {
        let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
        for arg in cmd.get_args() {
            let arg = arg.to_string_lossy();
            if arg.contains(' ') {
                parts.push(format!("\"{}\"", arg));
            } else {
                parts.push(arg.into_owned());
            }
        }
        parts.join(" ")
    }

    /// Run a command to completion and return its output, successful or not.
    ///
    /// The child is killed once the timeout expires.
    pub fn run(&self, cmd: &mut Command) -> Result<CommandOutput> {
        let command = Self::describe(cmd);
        debug!("Executing shell command: {}", command);

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LetMeHearError::CommandFailed {
                command: command.clone(),
                exit_code: -1,
                stderr: format!("failed to start: {}", e),
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_with_deadline(&mut child, Instant::now() + self.timeout) {
            Ok(Some(status)) => status,
            Err(e) => {
                abandon(&mut child);
                return Err(e);
            }
            Ok(None) => {
                abandon(&mut child);
                return Err(LetMeHearError::CommandTimedOut {
                    command,
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout.join().unwrap_or_default()).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.join().unwrap_or_default()).into_owned(),
            exit_code: status.code().unwrap_or(-1),
            success: status.success(),
        })
    }

    /// Like [`run`](Self::run), but a non-zero exit becomes [`LetMeHearError::CommandFailed`].
    pub fn run_checked(&self, cmd: &mut Command) -> Result<CommandOutput> {
        let output = self.run(cmd)?;
        if !output.success {
            return Err(LetMeHearError::CommandFailed {
                command: Self::describe(cmd),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}

/// Kill the child and reap it.
fn abandon(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Poll the child until it exits or the deadline passes (`Ok(None)`).
fn wait_with_deadline(
    child: &mut Child,
    deadline: Instant,
) -> Result<Option<std::process::ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
