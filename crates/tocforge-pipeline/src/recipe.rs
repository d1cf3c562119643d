// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recipe compiler — stage one of the pipeline.
//
// Queries the metadata extractor once per heading entry and assembles the
// comment-filtered outputs into a single recipe document, one block per
// entry, in entry order.  The failure policy for a failed extraction is
// configuration (`ExtractFailurePolicy`): strict abort by default, opt-in
// skip-and-warn.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use tocforge_core::config::{ExtractFailurePolicy, ToolchainConfig};
use tocforge_core::error::{Result, TocforgeError};
use tocforge_core::types::{HeadingEntry, RecipeDocument};

use crate::cancel::CancelToken;
use crate::invoker::ToolRunner;

/// Compile the ordered heading entries into a recipe document.
///
/// Exactly one extractor invocation per entry, no stdin, bounded by the
/// configured extract timeout.  Nothing downstream runs if this fails.
#[instrument(skip_all, fields(entries = entries.len(), source = %source.display()))]
pub async fn compile(
    runner: &ToolRunner,
    config: &ToolchainConfig,
    entries: &[HeadingEntry],
    source: &Path,
    cancel: &CancelToken,
) -> Result<RecipeDocument> {
    if entries.is_empty() {
        return Err(TocforgeError::Validation(
            "at least one heading entry is required".into(),
        ));
    }

    let mut blocks: Vec<String> = Vec::with_capacity(entries.len());
    let mut last_failure: Option<TocforgeError> = None;

    for entry in entries {
        let argv = extractor_argv(config, entry, source);
        match runner
            .run(&argv, None, config.extract_timeout(), cancel)
            .await
        {
            Ok(out) => {
                let block = filter_comment_lines(&out.stdout);
                if block.is_empty() {
                    warn!(title = entry.title(), "extractor produced no usable output");
                } else {
                    blocks.push(block);
                }
            }
            Err(e @ (TocforgeError::ToolFailure { .. } | TocforgeError::StageTimeout { .. }))
                if config.extract_failure_policy == ExtractFailurePolicy::SkipAndWarn =>
            {
                warn!(
                    title = entry.title(),
                    page = entry.page(),
                    error = %e,
                    "skipping heading after failed extraction"
                );
                last_failure = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    if blocks.is_empty() {
        // Even the tolerant policy cannot hand an empty recipe downstream.
        return Err(last_failure.unwrap_or_else(|| {
            TocforgeError::Validation("no heading produced any recipe content".into())
        }));
    }

    let doc = finalize_document(&blocks);
    debug!(bytes = doc.len(), blocks = blocks.len(), "recipe assembled");
    info!("recipe compiled for {} headings", blocks.len());
    Ok(RecipeDocument::new(doc))
}

/// argv for one extractor query: `extractor -p <page> -a <level> <pdf> <title>`.
fn extractor_argv(config: &ToolchainConfig, entry: &HeadingEntry, source: &Path) -> Vec<String> {
    vec![
        config.extractor.clone(),
        "-p".into(),
        entry.page().to_string(),
        "-a".into(),
        entry.level().to_string(),
        source.to_string_lossy().into_owned(),
        entry.title().to_owned(),
    ]
}

/// Drop every line whose trimmed form starts with `#`, keep the rest
/// verbatim, and trim trailing whitespace from the block.
fn filter_comment_lines(stdout: &str) -> String {
    let kept: Vec<&str> = stdout
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect();
    kept.join("\n").trim_end().to_owned()
}

/// Join blocks with a blank separator line, strip any BOM artifact, and end
/// with exactly one newline.
fn finalize_document(blocks: &[String]) -> String {
    let mut doc = blocks.join("\n\n").replace('\u{feff}', "");
    let trimmed = doc.trim_end().len();
    doc.truncate(trimmed);
    doc.push('\n');
    doc
}
