//! Cancellable command execution with live and captured output
//!
//! Stdout goes to the live sink. Stderr goes to the live sink and to an
//! in-memory buffer that is attached to the error if the command fails.

use crate::error::{CrossgoError, CrossgoResult};
use crate::logging::FanOutWriter;
use std::io::{self, Write};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::debug;

/// Receiver that never reports cancellation
pub fn never_cancelled() -> watch::Receiver<bool> {
    let (_tx, rx) = watch::channel(false);
    rx
}

/// Human-readable command line for logs and errors
pub fn describe(command: &Command) -> String {
    let std = command.as_std();
    std::iter::once(std.get_program())
        .chain(std.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `command` to completion, or until `cancel` turns `true`
///
/// A cancelled run kills the child and returns [`CrossgoError::Cancelled`].
/// A failed run returns [`CrossgoError::CommandExecution`] carrying all
/// captured stderr.
pub async fn run_command(
    mut command: Command,
    live: &mut (dyn Write + Send),
    cancel: &mut watch::Receiver<bool>,
) -> CrossgoResult<()> {
    let command_line = describe(&command);
    if *cancel.borrow() {
        return Err(CrossgoError::Cancelled);
    }

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Executing: {}", command_line);
    let mut child = command
        .spawn()
        .map_err(|e| CrossgoError::command_failed(&command_line, e))?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(CrossgoError::command_failed(
            &command_line,
            io::Error::other("output streams not captured"),
        ));
    };
    // Raw segments: output need not be valid UTF-8
    let mut stdout_reader = BufReader::new(stdout).split(b'\n');
    let mut stderr_reader = BufReader::new(stderr).split(b'\n');

    let mut captured: Vec<u8> = Vec::new();
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut cancel_open = true;

    while !stdout_done || !stderr_done {
        tokio::select! {
            segment = stdout_reader.next_segment(), if !stdout_done => {
                match read_segment(segment)? {
                    Some(line) => {
                        live.write_all(line.as_bytes())
                            .map_err(|e| CrossgoError::io("writing command output", e))?;
                    }
                    None => stdout_done = true,
                }
            }
            segment = stderr_reader.next_segment(), if !stderr_done => {
                match read_segment(segment)? {
                    Some(line) => {
                        let sinks = vec![
                            &mut *live as &mut (dyn Write + Send),
                            &mut captured as &mut (dyn Write + Send),
                        ];
                        FanOutWriter::new(sinks)
                            .write_all(line.as_bytes())
                            .map_err(|e| CrossgoError::io("writing command output", e))?;
                    }
                    None => stderr_done = true,
                }
            }
            changed = cancel.changed(), if cancel_open => {
                if cancel_requested(changed, cancel, &mut cancel_open) {
                    return terminate(child, &command_line).await;
                }
            }
        }
    }

    let status = loop {
        tokio::select! {
            status = child.wait() => {
                break status.map_err(|e| CrossgoError::command_failed(&command_line, e))?;
            }
            changed = cancel.changed(), if cancel_open => {
                if cancel_requested(changed, cancel, &mut cancel_open) {
                    return terminate(child, &command_line).await;
                }
            }
        }
    };

    if status.success() {
        return Ok(());
    }
    Err(CrossgoError::CommandExecution {
        command: command_line,
        status: status.to_string(),
        stderr: String::from_utf8_lossy(&captured).trim_end().to_string(),
    })
}

/// One output line, lossily decoded and newline terminated; `None` at end of stream
fn read_segment(segment: io::Result<Option<Vec<u8>>>) -> CrossgoResult<Option<String>> {
    let segment = segment.map_err(|e| CrossgoError::io("reading command output", e))?;
    Ok(segment.map(|bytes| {
        let mut line = String::from_utf8_lossy(&bytes).into_owned();
        line.push('\n');
        line
    }))
}

fn cancel_requested(
    changed: Result<(), watch::error::RecvError>,
    cancel: &watch::Receiver<bool>,
    open: &mut bool,
) -> bool {
    match changed {
        Ok(()) => *cancel.borrow(),
        Err(_) => {
            // Sender gone: nobody can cancel any more
            *open = false;
            false
        }
    }
}

async fn terminate(mut child: Child, command_line: &str) -> CrossgoResult<()> {
    debug!("Cancelling: {}", command_line);
    if let Err(e) = child.kill().await {
        debug!("Failed to kill {}: {}", command_line, e);
    }
    Err(CrossgoError::Cancelled)
}
