// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Submission service — the interface the front-end calls.
//
// Validates preconditions synchronously, then supervises the run on a
// background tokio task and delivers the terminal report exactly once over
// a oneshot channel.  At most one run per input document may be in flight:
// concurrent runs against the same input would race on the shared derived
// artifact paths.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::oneshot;
use tracing::{error, info, instrument, warn};

use tocforge_core::config::ToolchainConfig;
use tocforge_core::error::{Result, TocforgeError};
use tocforge_core::types::{HeadingEntry, RunId, RunReport, RunStatus};

use crate::cancel::CancelToken;
use crate::deps;
use crate::orchestrator::PipelineRun;

/// Handle for one submitted run.
#[derive(Debug)]
pub struct RunHandle {
    id: RunId,
    cancel: CancelToken,
    rx: oneshot::Receiver<RunReport>,
}

impl RunHandle {
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Request cancellation; the in-flight subprocess is killed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the run's cancellation token, e.g. for a signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Await the terminal report.
    pub async fn wait(self) -> Result<RunReport> {
        self.rx.await.map_err(|_| {
            TocforgeError::Internal("run worker dropped its report channel".into())
        })
    }
}

/// Accepts run submissions after a one-time toolchain check.
#[derive(Clone, Debug)]
pub struct TocService {
    config: ToolchainConfig,
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

impl TocService {
    /// Fails with `MissingDependency` unless all three tools resolve.
    pub fn new(config: ToolchainConfig) -> Result<Self> {
        deps::check_toolchain(&config)?;
        Ok(Self {
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Submit a run.  Returns immediately; completion is reported through
    /// the handle.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub fn submit(
        &self,
        input: impl Into<PathBuf> + std::fmt::Debug,
        entries: Vec<HeadingEntry>,
    ) -> Result<RunHandle> {
        let input = input.into();

        // Fail fast, before any reservation or subprocess.
        if entries.is_empty() {
            return Err(TocforgeError::Validation(
                "at least one heading entry is required".into(),
            ));
        }
        if std::fs::metadata(&input).is_err() {
            return Err(TocforgeError::Validation(format!(
                "input file does not exist: {}",
                input.display()
            )));
        }

        // Reserve the input path.  Canonical form so `./a.pdf` and `a.pdf`
        // cannot run concurrently against the same artifacts.
        let key = input.canonicalize().unwrap_or_else(|_| input.clone());
        {
            let mut guard = self.in_flight.lock().expect("in-flight lock poisoned");
            if !guard.insert(key.clone()) {
                return Err(TocforgeError::RunInFlight(input));
            }
        }

        let cancel = CancelToken::new();
        let run = PipelineRun::new(input.clone(), entries, self.config.clone(), cancel.clone());
        let id = run.id();
        let started_at = Utc::now();
        let (tx, rx) = oneshot::channel();
        let in_flight = Arc::clone(&self.in_flight);

        tokio::spawn(async move {
            // Run the pipeline on its own task so a panic is contained and
            // still produces a report instead of a lost run.
            let worker = tokio::spawn(run.run());
            let report = match worker.await {
                Ok(report) => report,
                Err(e) => {
                    error!(run_id = %id, error = %e, "pipeline task panicked");
                    RunReport {
                        id,
                        input,
                        output: None,
                        status: RunStatus::Failed,
                        error: Some(format!("internal error: pipeline task panicked: {e}")),
                        failed_stage: None,
                        started_at,
                        finished_at: Utc::now(),
                    }
                }
            };

            // Release the reservation however the run ended.
            in_flight
                .lock()
                .expect("in-flight lock poisoned")
                .remove(&key);

            if tx.send(report).is_err() {
                warn!(run_id = %id, "run finished but the caller dropped its handle");
            }
        });

        info!(run_id = %id, "run submitted");
        Ok(RunHandle { id, cancel, rx })
    }
}
