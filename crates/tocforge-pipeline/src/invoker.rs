// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Generic external tool invoker.
//
// Spawns exactly one child process per call, optionally streams a byte
// payload to its stdin, captures stdout/stderr, and classifies the outcome.
// Output is decoded as UTF-8 with U+FFFD replacement — the pipeline must be
// robust against tool encoding quirks, not faithful to them.  There are no
// retries at this layer: a tool failure is deterministic given its inputs.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use tocforge_core::error::{Result, TocforgeError};

use crate::cancel::CancelToken;

/// Captured streams of a successfully exited tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    /// Diagnostic only; a zero exit with noisy stderr is still a success.
    pub stderr: String,
}

/// Synchronous-in-effect executor for the external toolchain.
#[derive(Debug, Clone, Default)]
pub struct ToolRunner;

impl ToolRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `argv`, feeding `stdin_bytes` (if any) as the child's input.
    ///
    /// Fails with `StageTimeout` when the budget elapses and `Cancelled`
    /// when the token fires; in both cases the child is killed.  A non-zero
    /// exit becomes `ToolFailure` carrying argv, exit code, and both
    /// captured streams.
    #[instrument(skip_all, fields(tool = argv.first().map(String::as_str).unwrap_or("?")))]
    pub async fn run(
        &self,
        argv: &[String],
        stdin_bytes: Option<&[u8]>,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<ToolOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| TocforgeError::Internal("empty argv".into()))?;

        if cancel.is_cancelled() {
            return Err(TocforgeError::Cancelled);
        }

        debug!(?argv, timeout_secs = timeout.as_secs(), "spawning tool");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin_bytes.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TocforgeError::MissingDependency {
                    tools: vec![program.clone()],
                }
            } else {
                TocforgeError::Io(e)
            }
        })?;

        // Write stdin concurrently with collecting output; a large payload
        // must not deadlock against a child that fills its stdout pipe
        // before reading all of its input.
        let stdin_pipe = child.stdin.take();
        let payload = stdin_bytes.map(<[u8]>::to_vec);
        let io = async move {
            let write = async {
                if let (Some(mut pipe), Some(data)) = (stdin_pipe, payload) {
                    match pipe.write_all(&data).await {
                        // A child that exits without draining stdin is its
                        // own failure mode; the exit status reports it.
                        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                        Err(e) => return Err(e),
                        Ok(()) => {}
                    }
                    // Dropping the pipe closes it so the child sees EOF.
                }
                Ok(())
            };
            let (write_res, wait_res) = tokio::join!(write, child.wait_with_output());
            write_res?;
            wait_res
        };

        // Dropping the io future on the timeout/cancel arms kills the child
        // via kill_on_drop.
        let output = tokio::select! {
            () = cancel.cancelled() => return Err(TocforgeError::Cancelled),
            res = tokio::time::timeout(timeout, io) => match res {
                Err(_) => {
                    return Err(TocforgeError::StageTimeout {
                        argv: argv.to_vec(),
                        timeout_secs: timeout.as_secs(),
                    });
                }
                Ok(Err(e)) => return Err(TocforgeError::Io(e)),
                Ok(Ok(output)) => output,
            },
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(TocforgeError::ToolFailure {
                argv: argv.to_vec(),
                exit_code: output.status.code(),
                stderr,
                stdout,
            });
        }

        debug!(stdout_len = stdout.len(), "tool exited cleanly");
        Ok(ToolOutput { stdout, stderr })
    }
}
