//! Blocking subprocess invocation with a deadline.
//!
//! External decode and probe calls must never hang a scan. [`run_captured`]
//! spawns a program with stdout piped, drains stdout on a helper thread, and
//! polls the child until it exits or the deadline passes, killing it in the
//! latter case.

use std::ffi::OsStr;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::DedupError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub(crate) struct CapturedOutput {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: Vec<u8>,
}

/// Run `program` with `arguments`, capturing stdout, killing it after `timeout`.
///
/// Stderr is discarded. A non-zero exit is **not** an error here; callers
/// decide what a failed status means for them.
///
/// # Errors
///
/// - [`DedupError::ExternalToolMissing`] if the program cannot be found.
/// - [`DedupError::ExternalToolTimeout`] if the deadline passes.
/// - [`DedupError::IoError`] for any other spawn or wait failure.
pub(crate) fn run_captured<I, S>(
    program: &Path,
    arguments: I,
    timeout: Duration,
) -> Result<CapturedOutput, DedupError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = program.display().to_string();

    let mut child = Command::new(program)
        .args(arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|error| match error.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                DedupError::ExternalToolMissing { tool: tool.clone() }
            }
            _ => DedupError::IoError(error),
        })?;

    let mut stdout = child.stdout.take().ok_or_else(|| DedupError::ExternalToolFailed {
        tool: tool.clone(),
        status: None,
        reason: "stdout was not captured".to_string(),
    })?;
    let reader = thread::spawn(move || {
        let mut buffer = Vec::new();
        stdout.read_to_end(&mut buffer).map(|_| buffer)
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(error) => {
                reap(&mut child, reader);
                log::debug!("{tool} killed after wait failure: {error}");
                return Err(DedupError::IoError(error));
            }
        }
        if Instant::now() >= deadline {
            reap(&mut child, reader);
            log::debug!("{tool} killed after {timeout:?}");
            return Err(DedupError::ExternalToolTimeout { tool, timeout });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = match reader.join() {
        Ok(result) => result?,
        Err(_) => {
            return Err(DedupError::ExternalToolFailed {
                tool,
                status: Some(status),
                reason: "stdout reader panicked".to_string(),
            });
        }
    };

    Ok(CapturedOutput { status, stdout })
}

/// Kill `child`, wait for it, and join its stdout reader.
fn reap<T>(child: &mut Child, reader: JoinHandle<T>) {
    let _ = child.kill();
    let _ = child.wait();
    let _ = reader.join();
}
