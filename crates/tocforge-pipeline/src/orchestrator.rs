// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline orchestrator.
//
// Owns one run end to end: derives artifact paths, sequences the three
// stages as a strict waterfall, persists the intermediate documents next to
// the input, and folds any stage failure into a single terminal RunReport.
// Stage N+1 never starts unless stage N succeeded; a failed run aborts the
// rest outright, so a partial outline is never embedded.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

use tocforge_core::config::ToolchainConfig;
use tocforge_core::error::{Result, TocforgeError};
use tocforge_core::types::{
    ArtifactPaths, HeadingEntry, RunId, RunReport, RunStage, RunStatus,
};

use crate::cancel::CancelToken;
use crate::invoker::ToolRunner;
use crate::{embed, recipe, structure};

/// One pipeline invocation: ephemeral, consumed by `run`.
pub struct PipelineRun {
    id: RunId,
    input: PathBuf,
    paths: ArtifactPaths,
    entries: Vec<HeadingEntry>,
    config: ToolchainConfig,
    runner: ToolRunner,
    cancel: CancelToken,
    status: RunStatus,
    started_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn new(
        input: PathBuf,
        entries: Vec<HeadingEntry>,
        config: ToolchainConfig,
        cancel: CancelToken,
    ) -> Self {
        let paths = ArtifactPaths::derive(&input);
        Self {
            id: RunId::new(),
            input,
            paths,
            entries,
            config,
            runner: ToolRunner::new(),
            cancel,
            status: RunStatus::Idle,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn artifact_paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Execute all stages and produce the terminal report, exactly once.
    #[instrument(skip_all, fields(run_id = %self.id, input = %self.input.display()))]
    pub async fn run(mut self) -> RunReport {
        info!("pipeline run started");
        let result = self.execute().await;
        let failed_stage = match self.status {
            RunStatus::Running(stage) => Some(stage),
            _ => None,
        };
        let finished_at = Utc::now();

        match result {
            Ok(output) => {
                self.status = RunStatus::Done;
                info!(output = %output.display(), "pipeline run finished");
                self.report(Some(output), None, None, finished_at)
            }
            Err(TocforgeError::Cancelled) => {
                self.status = RunStatus::Cancelled;
                warn!(stage = ?failed_stage, "pipeline run cancelled");
                self.report(None, Some("run cancelled".into()), failed_stage, finished_at)
            }
            Err(e) => {
                self.status = RunStatus::Failed;
                error!(stage = ?failed_stage, error = %e, "pipeline run failed");
                self.report(None, Some(e.to_string()), failed_stage, finished_at)
            }
        }
    }

    async fn execute(&mut self) -> Result<PathBuf> {
        ensure_parent_dir(&self.paths.recipe).await?;

        // Stage 1 — recipe
        self.status = RunStatus::Running(RunStage::WritingRecipe);
        let recipe_doc = recipe::compile(
            &self.runner,
            &self.config,
            &self.entries,
            &self.input,
            &self.cancel,
        )
        .await?;
        tokio::fs::write(&self.paths.recipe, recipe_doc.as_bytes()).await?;
        self.checkpoint()?;

        // Stage 2 — structure
        self.status = RunStatus::Running(RunStage::GeneratingStructure);
        let structure_doc = structure::generate(
            &self.runner,
            &self.config,
            &recipe_doc,
            &self.input,
            &self.cancel,
        )
        .await?;
        tokio::fs::write(&self.paths.structure, structure_doc.as_bytes()).await?;
        self.checkpoint()?;

        // Stage 3 — embed
        self.status = RunStatus::Running(RunStage::Embedding);
        embed::embed(
            &self.runner,
            &self.config,
            &structure_doc,
            &self.input,
            &self.paths.output,
            &self.cancel,
        )
        .await?;

        Ok(self.paths.output.clone())
    }

    /// Between-stage cancellation point.
    fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(TocforgeError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn report(
        &self,
        output: Option<PathBuf>,
        error: Option<String>,
        failed_stage: Option<RunStage>,
        finished_at: DateTime<Utc>,
    ) -> RunReport {
        RunReport {
            id: self.id,
            input: self.input.clone(),
            output,
            status: self.status,
            error,
            failed_stage,
            started_at: self.started_at,
            finished_at,
        }
    }
}

/// Idempotent parent directory creation for the intermediate artifacts.
async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_ids_are_unique() {
        let a = PipelineRun::new(
            "a.pdf".into(),
            Vec::new(),
            ToolchainConfig::default(),
            CancelToken::new(),
        );
        let b = PipelineRun::new(
            "b.pdf".into(),
            Vec::new(),
            ToolchainConfig::default(),
            CancelToken::new(),
        );
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn artifacts_derive_from_the_input_path() {
        let run = PipelineRun::new(
            "/docs/report.pdf".into(),
            Vec::new(),
            ToolchainConfig::default(),
            CancelToken::new(),
        );
        assert_eq!(
            run.artifact_paths().output,
            Path::new("/docs/report_with_toc.pdf")
        );
    }

    #[tokio::test]
    async fn empty_entries_fail_in_the_recipe_stage() {
        let run = PipelineRun::new(
            "missing.pdf".into(),
            Vec::new(),
            ToolchainConfig::default(),
            CancelToken::new(),
        );
        let report = run.run().await;
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.failed_stage, Some(RunStage::WritingRecipe));
        assert!(report.output.is_none());
    }

    #[tokio::test]
    async fn pre_cancelled_run_never_spawns_anything() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let entries = vec![HeadingEntry::new(1, 1, "Intro").expect("valid")];
        let run = PipelineRun::new(
            "missing.pdf".into(),
            entries,
            ToolchainConfig::default(),
            cancel,
        );
        let report = run.run().await;
        assert_eq!(report.status, RunStatus::Cancelled);
    }
}
