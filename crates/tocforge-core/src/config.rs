// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Toolchain configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when the metadata extractor fails for one heading entry.
///
/// Strict abort is the default: a silently incomplete outline is a
/// correctness bug, not a cosmetic one.  The tolerant variant is an explicit
/// opt-in and records every skipped entry in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractFailurePolicy {
    /// Fail the whole run on the first heading whose extraction fails.
    #[default]
    Abort,
    /// Log the failure, skip the heading, and continue with the rest.
    SkipAndWarn,
}

/// Names of the three external executables and the per-stage time budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Metadata extractor, queried once per heading entry.
    pub extractor: String,
    /// Structure generator, fed the recipe on stdin.
    pub generator: String,
    /// Structure embedder, fed the structure on stdin; writes the output PDF.
    pub embedder: String,
    /// Time budget per extractor invocation, in seconds.
    pub extract_timeout_secs: u64,
    /// Time budget for the structure generator, in seconds.
    pub generate_timeout_secs: u64,
    /// Time budget for the embedder, in seconds.
    pub embed_timeout_secs: u64,
    /// Failure policy for the recipe-writing stage.
    pub extract_failure_policy: ExtractFailurePolicy,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            extractor: "pdfxmeta".into(),
            generator: "pdftocgen".into(),
            embedder: "pdftocio".into(),
            extract_timeout_secs: 30,
            generate_timeout_secs: 60,
            embed_timeout_secs: 60,
            extract_failure_policy: ExtractFailurePolicy::default(),
        }
    }
}

impl ToolchainConfig {
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }

    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }

    /// The three executable names, in pipeline order.
    pub fn tools(&self) -> [&str; 3] {
        [&self.extractor, &self.generator, &self.embedder]
    }
}
