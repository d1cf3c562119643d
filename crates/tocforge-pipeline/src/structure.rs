// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structure generator — stage two of the pipeline.
//
// Pipes the complete recipe into the generator's stdin and captures its
// stdout verbatim as the structure document.  The document is opaque here;
// only the embedder interprets it.

use std::path::Path;

use tracing::{info, instrument};

use tocforge_core::config::ToolchainConfig;
use tocforge_core::error::Result;
use tocforge_core::types::{RecipeDocument, StructureDocument};

use crate::cancel::CancelToken;
use crate::invoker::ToolRunner;

/// Run `generator -v <pdf>` with the recipe on stdin.
#[instrument(skip_all, fields(source = %source.display()))]
pub async fn generate(
    runner: &ToolRunner,
    config: &ToolchainConfig,
    recipe: &RecipeDocument,
    source: &Path,
    cancel: &CancelToken,
) -> Result<StructureDocument> {
    let argv = vec![
        config.generator.clone(),
        "-v".into(),
        source.to_string_lossy().into_owned(),
    ];

    let out = runner
        .run(
            &argv,
            Some(recipe.as_bytes()),
            config.generate_timeout(),
            cancel,
        )
        .await?;

    info!(bytes = out.stdout.len(), "structure document generated");
    Ok(StructureDocument::new(out.stdout))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tocforge_core::error::TocforgeError;

    fn fake_generator(dir: &std::path::Path, body: &str) -> ToolchainConfig {
        let path = dir.join("pdftocgen-fake");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
        ToolchainConfig {
            generator: path.to_string_lossy().into_owned(),
            ..ToolchainConfig::default()
        }
    }

    #[tokio::test]
    async fn recipe_flows_through_stdin_and_stdout_is_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Echo the source arg, then the recipe itself.
        let config = fake_generator(dir.path(), "echo \"toc for $2\"; cat");
        let recipe = RecipeDocument::new("level = 1\n".into());

        let structure = generate(
            &ToolRunner::new(),
            &config,
            &recipe,
            Path::new("report.pdf"),
            &CancelToken::new(),
        )
        .await
        .expect("generate");
        assert_eq!(structure.as_str(), "toc for report.pdf\nlevel = 1\n");
    }

    #[tokio::test]
    async fn generator_timeout_surfaces_as_stage_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = fake_generator(dir.path(), "sleep 30");
        config.generate_timeout_secs = 1;
        let recipe = RecipeDocument::new("level = 1\n".into());

        let err = generate(
            &ToolRunner::new(),
            &config,
            &recipe,
            Path::new("report.pdf"),
            &CancelToken::new(),
        )
        .await
        .expect_err("should time out");
        assert!(matches!(err, TocforgeError::StageTimeout { timeout_secs: 1, .. }));
    }
}
