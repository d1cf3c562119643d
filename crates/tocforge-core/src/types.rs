// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Tocforge TOC pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Result, TocforgeError};

/// Unique identifier for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One outline entry the user wants embedded in the document.
///
/// Construction is the only validation point: level and page are 1-based,
/// the title must be non-empty after trimming.  Entries are never mutated
/// after creation; the order of the caller's `Vec<HeadingEntry>` defines
/// emission order.  Hierarchical consistency of levels (a level-3 entry
/// directly after a level-1) is NOT checked here — whether that is tolerated
/// is the structure generator's contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingEntry {
    level: u32,
    page: u32,
    title: String,
}

impl HeadingEntry {
    /// Validate and create an entry.  The title is stored trimmed.
    pub fn new(level: u32, page: u32, title: impl Into<String>) -> Result<Self> {
        if level < 1 {
            return Err(TocforgeError::Validation(format!(
                "heading level must be >= 1, got {level}"
            )));
        }
        if page < 1 {
            return Err(TocforgeError::Validation(format!(
                "page number must be >= 1, got {page}"
            )));
        }
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(TocforgeError::Validation(
                "heading title must not be empty".into(),
            ));
        }
        Ok(Self { level, page, title })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// The assembled recipe text fed to the structure generator.
///
/// One block per heading entry (the comment-filtered stdout of the metadata
/// extractor), blocks separated by a blank line, no line starting with `#`,
/// exactly one trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDocument(String);

impl RecipeDocument {
    pub fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The generator's output, opaque to us beyond being the embedder's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureDocument(String);

impl StructureDocument {
    pub fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Derived on-disk artifact names for one pipeline run.
///
/// The naming contract is fixed: `{base}_recipe.toml`, `{base}_toc`, and
/// `{base}_with_toc.pdf`, all next to the input file, where `{base}` is the
/// input name with its final extension stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub recipe: PathBuf,
    pub structure: PathBuf,
    pub output: PathBuf,
}

impl ArtifactPaths {
    pub fn derive(input: &Path) -> Self {
        let parent = input.parent().unwrap_or_else(|| Path::new(""));
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            recipe: parent.join(format!("{stem}_recipe.toml")),
            structure: parent.join(format!("{stem}_toc")),
            output: parent.join(format!("{stem}_with_toc.pdf")),
        }
    }
}

/// The three sequential external-tool stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStage {
    /// Querying the metadata extractor per entry and assembling the recipe.
    WritingRecipe,
    /// Feeding the recipe to the structure generator.
    GeneratingStructure,
    /// Feeding the structure to the embedder, which writes the output PDF.
    Embedding,
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::WritingRecipe => "writing recipe",
            Self::GeneratingStructure => "generating structure",
            Self::Embedding => "embedding",
        };
        write!(f, "{name}")
    }
}

/// Lifecycle states of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Created, not started yet.
    Idle,
    /// A stage is currently executing.
    Running(RunStage),
    /// Output PDF written and verified.
    Done,
    /// A stage failed — see the report's error field.
    Failed,
    /// Caller requested cancellation.
    Cancelled,
}

/// Terminal outcome of one pipeline run, delivered exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub id: RunId,
    pub input: PathBuf,
    /// Present only on success.
    pub output: Option<PathBuf>,
    pub status: RunStatus,
    /// Rendered error for the caller; the typed error is logged at the
    /// stage that produced it with argv/stderr intact.
    pub error: Option<String>,
    /// The stage that was executing when the run failed or was cancelled.
    pub failed_stage: Option<RunStage>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Done
    }
}
