//! Child-process plumbing shared by the fetcher and the format executors.
//!
//! Two waiting strategies are offered. [`wait_interruptible`] polls the child
//! so a [`CancelToken`] or its deadline can kill it promptly; it backs the
//! source fetcher. [`run_streaming`] forwards the child's stdout and stderr
//! into caller-supplied sinks on scoped threads and blocks until exit; it
//! backs every format executor.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::ExecutorError;
use crate::executor::{Environ, ExecutionResult};

/// Tracing target for child process operations.
const PROCESS_TARGET: &str = "skein_plugins::process";

/// Interval between exit polls while a cancellable child runs.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why an interruptible wait stopped before the child exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    /// The shared cancellation flag was raised.
    Cancelled,
    /// The token's deadline passed; carries the configured budget.
    TimedOut(Duration),
}

/// Result of [`wait_interruptible`].
#[derive(Debug)]
pub(crate) enum WaitOutcome {
    Exited(ExitStatus),
    Interrupted(Interrupt),
}

/// Polls `child` until it exits or `cancel` fires, killing it in the latter
/// case.
pub(crate) fn wait_interruptible(
    child: &mut Child,
    cancel: &CancelToken,
) -> io::Result<WaitOutcome> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(WaitOutcome::Exited(status));
        }

        let pending = if cancel.is_cancelled() {
            Some(Interrupt::Cancelled)
        } else {
            cancel.deadline_passed().map(Interrupt::TimedOut)
        };

        if let Some(interrupt) = pending {
            warn!(
                target: PROCESS_TARGET,
                pid = child.id(),
                ?interrupt,
                "interrupting child process"
            );
            kill_process_group(child);
            drop(child.kill());
            drop(child.wait());
            return Ok(WaitOutcome::Interrupted(interrupt));
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Starts `command` as the leader of a new process group, so an interrupt
/// also reaches the helpers it spawns.
#[cfg(unix)]
pub(crate) fn isolate_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    command.process_group(0);
}

#[cfg(not(unix))]
pub(crate) const fn isolate_process_group(_command: &mut Command) {}

/// Kills every process in the group `child` leads. A child that does not
/// lead a group is left to [`Child::kill`].
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(pid) = i32::try_from(child.id()) else {
        return;
    };
    if let Err(error) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        debug!(
            target: PROCESS_TARGET,
            pid,
            %error,
            "process group not signalled"
        );
    }
}

#[cfg(not(unix))]
const fn kill_process_group(_child: &Child) {}

/// Replaces the command's environment with exactly `environ`.
pub(crate) fn apply_environment(command: &mut Command, environ: &Environ) {
    command.env_clear();
    command.envs(environ.pairs());
}

/// Runs `command` to completion, streaming its output into the sinks.
///
/// Stdin is closed. A non-zero exit (or death by signal) is reported as
/// [`ExecutorError::NonZeroExit`].
pub(crate) fn run_streaming(
    mut command: Command,
    program: &str,
    stdout: &mut (dyn Write + Send),
    stderr: &mut (dyn Write + Send),
) -> Result<ExecutionResult, ExecutorError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(
        target: PROCESS_TARGET,
        program,
        args = ?command.get_args().collect::<Vec<_>>(),
        cwd = ?command.get_current_dir(),
        "spawning plugin process"
    );

    let mut child = command.spawn().map_err(|source| ExecutorError::Spawn {
        program: program.to_owned(),
        source: Arc::new(source),
    })?;

    let child_stdout = child.stdout.take();
    let child_stderr = child.stderr.take();

    let (waited, forwarded_out, forwarded_err) = thread::scope(|scope| {
        let out = scope.spawn(move || forward(child_stdout, stdout));
        let err = scope.spawn(move || forward(child_stderr, stderr));
        let exit = child.wait();
        (exit, join_forwarder(out), join_forwarder(err))
    });

    let io_error = |source: io::Error| ExecutorError::Io {
        program: program.to_owned(),
        source: Arc::new(source),
    };
    let status = waited.map_err(io_error)?;
    forwarded_out.map_err(io_error)?;
    forwarded_err.map_err(io_error)?;

    debug!(
        target: PROCESS_TARGET,
        program,
        ?status,
        "plugin process exited"
    );

    if status.success() {
        return Ok(ExecutionResult::new(status.code()));
    }
    Err(ExecutorError::NonZeroExit {
        program: program.to_owned(),
        status: status.code().unwrap_or(-1),
    })
}

/// Copies a child pipe into a sink until EOF.
fn forward(source: Option<impl Read>, sink: &mut (dyn Write + Send)) -> io::Result<u64> {
    let Some(mut reader) = source else {
        return Ok(0);
    };
    let copied = io::copy(&mut reader, sink)?;
    sink.flush()?;
    Ok(copied)
}

fn join_forwarder(handle: thread::ScopedJoinHandle<'_, io::Result<u64>>) -> io::Result<u64> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("output forwarding thread panicked")))
}

/// Reads a child pipe to a string, lossily.
pub(crate) fn drain_to_string(source: Option<impl Read>) -> String {
    let Some(mut reader) = source else {
        return String::new();
    };
    let mut bytes = Vec::new();
    if let Err(error) = reader.read_to_end(&mut bytes) {
        debug!(
            target: PROCESS_TARGET,
            %error,
            "failed to drain child output"
        );
    }
    String::from_utf8_lossy(&bytes).trim().to_owned()
}
