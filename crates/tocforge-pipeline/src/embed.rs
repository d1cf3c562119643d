// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structure embedder — stage three of the pipeline.
//
// Pipes the structure document into the embedder, which writes the annotated
// PDF itself.  The postcondition is verified here: the output file must
// exist and be non-empty, and a zero-byte leftover from a failed write is
// removed so it can never be mistaken for a successful run.

use std::path::Path;

use tracing::{info, instrument, warn};

use tocforge_core::config::ToolchainConfig;
use tocforge_core::error::{Result, TocforgeError};
use tocforge_core::types::StructureDocument;

use crate::cancel::CancelToken;
use crate::invoker::ToolRunner;

/// Run `embedder -v -o <output> <pdf>` with the structure on stdin, then
/// verify the output artifact.
#[instrument(skip_all, fields(source = %source.display(), output = %output.display()))]
pub async fn embed(
    runner: &ToolRunner,
    config: &ToolchainConfig,
    structure: &StructureDocument,
    source: &Path,
    output: &Path,
    cancel: &CancelToken,
) -> Result<()> {
    let argv = vec![
        config.embedder.clone(),
        "-v".into(),
        "-o".into(),
        output.to_string_lossy().into_owned(),
        source.to_string_lossy().into_owned(),
    ];

    let result = runner
        .run(
            &argv,
            Some(structure.as_bytes()),
            config.embed_timeout(),
            cancel,
        )
        .await;

    if let Err(e) = result {
        discard_partial_output(output).await;
        return Err(e);
    }

    verify_output(output).await?;
    info!("TOC embedded into {}", output.display());
    Ok(())
}

/// The embedder claims success only if the file it promised actually exists
/// with content.
async fn verify_output(output: &Path) -> Result<()> {
    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => {
            discard_partial_output(output).await;
            Err(TocforgeError::Internal(format!(
                "embedder exited cleanly but {} is empty",
                output.display()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TocforgeError::Internal(
            format!("embedder exited cleanly but {} was not created", output.display()),
        )),
        Err(e) => Err(TocforgeError::Io(e)),
    }
}

/// Remove a zero-byte file a failed embedder may have left behind.  A
/// non-empty file is kept: it may be a previous run's valid output.
async fn discard_partial_output(output: &Path) {
    if let Ok(meta) = tokio::fs::metadata(output).await
        && meta.len() == 0
    {
        if let Err(e) = tokio::fs::remove_file(output).await {
            warn!(error = %e, "could not remove partial output {}", output.display());
        } else {
            warn!("removed empty partial output {}", output.display());
        }
    }
}
