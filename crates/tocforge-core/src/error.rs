// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Tocforge.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all Tocforge operations.
///
/// Tool-level failures keep their machine-inspectable fields (argv, exit
/// code, captured stderr/stdout) intact all the way up to the caller; the
/// pipeline never collapses them into a bare message string.
#[derive(Debug, Error)]
pub enum TocforgeError {
    // -- Input validation --
    #[error("invalid input: {0}")]
    Validation(String),

    // -- Toolchain --
    #[error("required tools not found on PATH: {}", .tools.join(", "))]
    MissingDependency { tools: Vec<String> },

    #[error("`{}` exited with {}: {}", .argv.join(" "), exit_label(.exit_code), .stderr.trim())]
    ToolFailure {
        argv: Vec<String>,
        exit_code: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("`{}` did not finish within {timeout_secs}s", .argv.join(" "))]
    StageTimeout {
        argv: Vec<String>,
        timeout_secs: u64,
    },

    // -- Run lifecycle --
    #[error("run cancelled")]
    Cancelled,

    #[error("a run is already in flight for {}", .0.display())]
    RunInFlight(PathBuf),

    // -- Ambient --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TocforgeError>;

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (killed by signal)".into(),
    }
}
