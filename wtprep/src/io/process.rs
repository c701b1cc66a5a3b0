//! Shell command runner: synchronous child processes with captured output.
//!
//! [`Executor`] is the seam between the workflow and the operating system.
//! [`run`] layers the failure policy on top: every failed command gets a
//! diagnostic on stderr, and [`FailMode`] decides whether the failure is
//! returned to the caller or turned into an error.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::core::types::{CommandOutcome, FailMode, ShellCommand};
use crate::io::config::PrepConfig;

/// Executes one command to completion in a working directory.
///
/// Implementations return `Err` only when the command could not be run at
/// all (e.g. the program is missing); a non-zero exit is a normal outcome.
pub trait Executor {
    fn execute(&self, command: &ShellCommand, workdir: &Path) -> Result<CommandOutcome>;
}

/// Executor backed by `std::process::Command`.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    timeout: Option<Duration>,
    output_limit_bytes: usize,
}

impl SystemExecutor {
    pub fn new(timeout: Option<Duration>, output_limit_bytes: usize) -> Self {
        Self {
            timeout,
            output_limit_bytes,
        }
    }

    pub fn from_config(config: &PrepConfig) -> Self {
        Self::new(config.command_timeout(), config.output_limit_bytes)
    }
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self::from_config(&PrepConfig::default())
    }
}

impl Executor for SystemExecutor {
    #[instrument(skip_all, fields(command = %command, workdir = %workdir.display()))]
    fn execute(&self, command: &ShellCommand, workdir: &Path) -> Result<CommandOutcome> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // With a timeout the child leads its own process group so expiry can
        // kill everything it spawned. Without one it stays in ours and
        // receives terminal signals like Ctrl-C.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            if self.timeout.is_some() {
                cmd.process_group(0);
            }
        }

        debug!("spawning child process");
        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                error!(err = %e, "failed to spawn command");
                return Err(e).with_context(|| format!("spawn {command}"));
            }
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout was not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("stderr was not piped"))?;

        let limit = self.output_limit_bytes;
        let stdout_handle = thread::spawn(move || read_stream_limited(stdout, limit));
        let stderr_handle = thread::spawn(move || read_stream_limited(stderr, limit));

        let mut timed_out = false;
        let status = match self.timeout {
            None => child.wait().context("wait for command")?,
            Some(timeout) => match child.wait_timeout(timeout).context("wait for command")? {
                Some(status) => status,
                None => {
                    warn!(
                        timeout_secs = timeout.as_secs(),
                        "command timed out, killing"
                    );
                    timed_out = true;
                    kill_tree(&mut child)?;
                    child.wait().context("wait command after kill")?
                }
            },
        };

        let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
        let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

        if stdout_truncated > 0 || stderr_truncated > 0 {
            warn!(stdout_truncated, stderr_truncated, "output truncated");
        }

        let mut stderr = String::from_utf8_lossy(&stderr).into_owned();
        if timed_out && let Some(timeout) = self.timeout {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&format!("[timed out after {timeout:?}]"));
        }

        debug!(exit_code = ?status.code(), timed_out, "command finished");
        Ok(CommandOutcome {
            succeeded: status.success() && !timed_out,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr,
            exit_code: if timed_out {
                -1
            } else {
                status.code().unwrap_or(-1)
            },
        })
    }
}

/// Run `command` in `workdir` and apply the failure policy.
///
/// On failure a diagnostic with the captured stderr is written to standard
/// error in both modes. `FailFast` then returns an error; `Continue` returns
/// the outcome with `succeeded == false` (spawn failures become an outcome
/// with `exit_code == -1`).
pub fn run<E: Executor + ?Sized>(
    executor: &E,
    command: &ShellCommand,
    workdir: &Path,
    mode: FailMode,
) -> Result<CommandOutcome> {
    let outcome = match executor.execute(command, workdir) {
        Ok(outcome) => outcome,
        Err(err) => {
            let outcome = CommandOutcome::failure(-1, format!("{err:#}"));
            report_failure(command, &outcome);
            return match mode {
                FailMode::FailFast => Err(err),
                FailMode::Continue => Ok(outcome),
            };
        }
    };

    if outcome.succeeded {
        return Ok(outcome);
    }

    report_failure(command, &outcome);
    match mode {
        FailMode::FailFast => Err(anyhow!(
            "{command} failed (exit code {}): {}",
            outcome.exit_code,
            outcome.stderr.trim()
        )),
        FailMode::Continue => Ok(outcome),
    }
}

fn report_failure(command: &ShellCommand, outcome: &CommandOutcome) {
    warn!(command = %command, exit_code = outcome.exit_code, "command failed");
    eprintln!("{}", failure_diagnostic(command, outcome));
}

/// Diagnostic text written to stderr for a failed command.
pub fn failure_diagnostic(command: &ShellCommand, outcome: &CommandOutcome) -> String {
    let mut msg = format!("Command failed: {command} (exit code {})", outcome.exit_code);
    let stderr = outcome.stderr.trim_end();
    if !stderr.is_empty() {
        msg.push_str("\nError: ");
        msg.push_str(stderr);
    }
    msg
}

/// Kill `child` and, on unix, every process in its group.
///
/// Descendants inherit the pipes; the reader threads only finish once all of
/// them are gone.
fn kill_tree(child: &mut Child) -> Result<()> {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let pid = i32::try_from(child.id()).context("child pid out of range")?;
        match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(err) => warn!(%err, "failed to kill process group"),
        }
    }
    // Still needed off unix, or if the child left its group.
    child.kill().context("kill command")
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
