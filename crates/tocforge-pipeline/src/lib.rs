// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tocforge-pipeline — Drives the three-stage TOC toolchain.
//
// A run feeds each heading entry to the metadata extractor, assembles the
// filtered output into a recipe, pipes the recipe through the structure
// generator, and pipes the structure through the embedder, which writes the
// annotated PDF.  Stages are a strict waterfall: each tool's contract
// requires a complete input document, so nothing streams across stages.

pub mod cancel;
pub mod deps;
pub mod embed;
pub mod invoker;
pub mod orchestrator;
pub mod recipe;
pub mod service;
pub mod structure;

pub use cancel::CancelToken;
pub use invoker::ToolRunner;
pub use orchestrator::PipelineRun;
pub use service::{RunHandle, TocService};
