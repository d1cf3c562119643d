// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Toolchain presence check.
//
// The three executables are a hard precondition: their absence is reported
// once, as a distinct `MissingDependency` listing every unresolved tool,
// before any run is accepted.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use tocforge_core::config::ToolchainConfig;
use tocforge_core::error::{Result, TocforgeError};

/// Verify that all three configured tools resolve to executables.
pub fn check_toolchain(config: &ToolchainConfig) -> Result<()> {
    let missing: Vec<String> = config
        .tools()
        .iter()
        .filter(|tool| resolve_executable(tool).is_none())
        .map(|tool| (*tool).to_owned())
        .collect();

    if missing.is_empty() {
        info!("toolchain resolved: {}", config.tools().join(", "));
        Ok(())
    } else {
        Err(TocforgeError::MissingDependency { tools: missing })
    }
}

/// Resolve a tool name to an executable path.
///
/// A name containing a path separator is checked as-is; a bare name is
/// searched on `PATH`.  On unix the executable bit is required.
pub fn resolve_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    let found = std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|p| is_executable(p));
    if let Some(ref p) = found {
        debug!(tool = name, path = %p.display(), "tool resolved");
    }
    found
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(paths: [&str; 3]) -> ToolchainConfig {
        ToolchainConfig {
            extractor: paths[0].into(),
            generator: paths[1].into(),
            embedder: paths[2].into(),
            ..ToolchainConfig::default()
        }
    }

    #[test]
    fn all_missing_tools_are_reported_together() {
        let config = config_with([
            "/nonexistent/pdfxmeta",
            "/nonexistent/pdftocgen",
            "/nonexistent/pdftocio",
        ]);
        let err = check_toolchain(&config).expect_err("nothing resolvable");
        match err {
            TocforgeError::MissingDependency { tools } => {
                assert_eq!(tools.len(), 3);
                assert!(tools[0].contains("pdfxmeta"));
                assert!(tools[2].contains("pdftocio"));
            }
            other => panic!("expected MissingDependency, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn explicit_paths_resolve_without_path_lookup() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tempdir");
        let mut names = Vec::new();
        for tool in ["pdfxmeta", "pdftocgen", "pdftocio"] {
            let path = dir.path().join(tool);
            std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod");
            names.push(path.to_string_lossy().into_owned());
        }
        let config = config_with([&names[0], &names[1], &names[2]]);
        check_toolchain(&config).expect("all resolvable");
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_does_not_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pdfxmeta");
        std::fs::write(&path, "not a program").expect("write");
        // Default perms have no exec bit.
        assert!(resolve_executable(&path.to_string_lossy()).is_none());
    }

    #[test]
    fn well_known_shell_resolves_on_path_or_directly() {
        // `sh` exists on every platform this crate targets in CI.
        #[cfg(unix)]
        assert!(resolve_executable("sh").is_some() || resolve_executable("/bin/sh").is_some());
    }
}
