//! External command invocation with deadline enforcement.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(20);
const STDERR_TAIL_BYTES: usize = 2048;

/// Command invocation errors.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}: {stderr}")]
    Status {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("{program} killed by signal")]
    Signalled { program: String },

    #[error("{program} timed out after {timeout:?} and was killed")]
    Timeout { program: String, timeout: Duration },

    #[error("IO error running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// What to run: program, arguments and execution context.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Captured output of a completed command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Capability to run an external command and collect its output.
///
/// A non-zero exit is an error; callers that need to tolerate failure
/// match on [`ShellError::Status`].
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> crate::Result<CommandOutput>;
}

/// Production runner backed by `std::process`.
///
/// Stdout and stderr are drained on reader threads while the parent
/// polls for exit. When the deadline passes the child is killed and the
/// call fails with [`ShellError::Timeout`]; the kill is the cancellation
/// propagation the pipeline relies on.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> crate::Result<CommandOutput> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &spec.env {
            command.env(key, value);
        }
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        debug!(program = %spec.program, args = ?spec.args, "running command");

        let mut child = command.spawn().map_err(|source| ShellError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        let stdout_rx = spawn_reader(child.stdout.take());
        let stderr_rx = spawn_reader(child.stderr.take());

        let deadline = spec.timeout.map(|t| Instant::now() + t);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if let Some(deadline) = deadline {
                        if Instant::now() >= deadline {
                            warn!(program = %spec.program, "deadline passed, killing child");
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(ShellError::Timeout {
                                program: spec.program.clone(),
                                timeout: spec.timeout.unwrap_or_default(),
                            });
                        }
                    }
                    thread::sleep(WAIT_POLL_INTERVAL);
                }
                Err(source) => {
                    return Err(ShellError::Io {
                        program: spec.program.clone(),
                        source,
                    })
                }
            }
        };

        let stdout = collect(stdout_rx);
        let stderr = collect(stderr_rx);
        if status.success() {
            return Ok(CommandOutput { stdout, stderr });
        }
        match status.code() {
            Some(code) => Err(ShellError::Status {
                program: spec.program.clone(),
                code,
                stderr: tail(&stderr, STDERR_TAIL_BYTES),
            }),
            None => Err(ShellError::Signalled {
                program: spec.program.clone(),
            }),
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut source) = source {
        thread::spawn(move || {
            let mut buf = String::new();
            if source.read_to_string(&mut buf).is_ok() {
                let _ = tx.send(buf);
            }
        });
    }
    rx
}

fn collect(rx: mpsc::Receiver<String>) -> String {
    rx.recv().unwrap_or_default()
}

fn tail(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let start = text.len() - max_bytes;
    // Snap to a char boundary.
    let start = (start..text.len())
        .find(|i| text.is_char_boundary(*i))
        .unwrap_or(start);
    text[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_of_successful_command() {
        let runner = SystemRunner::new();
        let output = runner
            .run(&CommandSpec::new("echo").arg("hello"))
            .unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn nonzero_exit_is_status_error() {
        let runner = SystemRunner::new();
        let err = runner
            .run(&CommandSpec::new("sh").args(["-c", "echo oops >&2; exit 3"]))
            .unwrap_err();
        match err {
            ShellError::Status { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert!(stderr.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let runner = SystemRunner::new();
        let err = runner
            .run(&CommandSpec::new("floret-no-such-program"))
            .unwrap_err();
        assert!(matches!(err, ShellError::Spawn { .. }));
    }

    #[test]
    fn deadline_kills_the_child() {
        let runner = SystemRunner::new();
        let started = Instant::now();
        let err = runner
            .run(
                &CommandSpec::new("sleep")
                    .arg("30")
                    .timeout(Duration::from_millis(200)),
            )
            .unwrap_err();
        assert!(matches!(err, ShellError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn env_and_cwd_are_applied() {
        let runner = SystemRunner::new();
        let dir = tempfile::tempdir().unwrap();
        let output = runner
            .run(
                &CommandSpec::new("sh")
                    .args(["-c", "echo $FLORET_TEST_VAR; pwd"])
                    .env("FLORET_TEST_VAR", "42")
                    .cwd(dir.path()),
            )
            .unwrap();
        let mut lines = output.stdout.lines();
        assert_eq!(lines.next(), Some("42"));
        assert!(lines.next().unwrap().contains(
            dir.path()
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
        ));
    }
}
