// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Heading entry parsing for the CLI.
//
// Two equivalent spellings are accepted: `LEVEL:PAGE:TITLE` and
// `LEVEL PAGE TITLE`.  Entry files additionally allow blank lines and
// `#` comments.

use std::path::Path;

use tocforge_core::error::{Result, TocforgeError};
use tocforge_core::types::HeadingEntry;

/// Parse a single `-e/--entry` argument.
pub fn parse_spec(spec: &str) -> Result<HeadingEntry> {
    let parts: Vec<&str> = if spec.contains(':') {
        spec.splitn(3, ':').collect()
    } else {
        spec.splitn(3, char::is_whitespace).collect()
    };
    let [level, page, title] = parts.as_slice() else {
        return Err(TocforgeError::Validation(format!(
            "expected LEVEL:PAGE:TITLE, got `{spec}`"
        )));
    };

    let level: u32 = level.trim().parse().map_err(|_| {
        TocforgeError::Validation(format!("level is not a number in `{spec}`"))
    })?;
    let page: u32 = page.trim().parse().map_err(|_| {
        TocforgeError::Validation(format!("page is not a number in `{spec}`"))
    })?;
    HeadingEntry::new(level, page, *title)
}

/// Parse an entries file: one entry per line, `#` comments and blank lines
/// ignored.  Reports the line number of the first bad line.
pub fn parse_file(path: &Path) -> Result<Vec<HeadingEntry>> {
    let text = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entry = parse_spec(line).map_err(|e| {
            TocforgeError::Validation(format!("{}:{}: {e}", path.display(), idx + 1))
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colon_form_parses() {
        let entry = parse_spec("2:14:Background and Related Work").expect("valid");
        assert_eq!(entry.level(), 2);
        assert_eq!(entry.page(), 14);
        assert_eq!(entry.title(), "Background and Related Work");
    }

    #[test]
    fn whitespace_form_parses() {
        let entry = parse_spec("1 1 Introduction").expect("valid");
        assert_eq!(entry.level(), 1);
        assert_eq!(entry.title(), "Introduction");
    }

    #[test]
    fn title_may_contain_further_colons() {
        let entry = parse_spec("1:5:Chapter 2: The Method").expect("valid");
        assert_eq!(entry.title(), "Chapter 2: The Method");
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert!(parse_spec("1:Introduction").is_err());
        assert!(parse_spec("Introduction").is_err());
    }

    #[test]
    fn non_numeric_level_is_rejected() {
        let err = parse_spec("one:1:Intro").expect_err("bad level");
        assert!(err.to_string().contains("level is not a number"));
    }

    #[test]
    fn invalid_field_values_still_fail_entry_validation() {
        assert!(parse_spec("0:1:Intro").is_err());
        assert!(parse_spec("1:2:   ").is_err());
    }

    #[test]
    fn entries_file_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("entries.txt");
        std::fs::write(
            &path,
            "# headings for report.pdf\n\n1:1:Introduction\n2 3 Background\n",
        )
        .expect("write");

        let entries = parse_file(&path).expect("parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title(), "Introduction");
        assert_eq!(entries[1].page(), 3);
    }

    #[test]
    fn entries_file_reports_the_offending_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("entries.txt");
        std::fs::write(&path, "1:1:Intro\nbogus line\n").expect("write");

        let err = parse_file(&path).expect_err("bad line");
        assert!(err.to_string().contains(":2:"), "error was: {err}");
    }
}
