//! Marker-keyed editing of shell startup files
//!
//! Toolchain installers own exactly one line in the invoking user's shell
//! startup file, keyed on a recognizable marker substring. Editing is
//! replace-if-present-else-append, so installs and upgrades converge to a
//! single line, and removal of an absent line is a no-op.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;

/// Ensure the startup file contains exactly one line carrying `marker`,
/// with the content `line`.
///
/// An existing marker line is replaced in place (keeping its position);
/// otherwise `line` is appended. The file is created when missing.
/// Returns true when the file changed.
pub fn ensure_line(rc_file: &Path, marker: &str, line: &str) -> Result<bool> {
    let contents = if rc_file.exists() {
        fs::read_to_string(rc_file)?
    } else {
        String::new()
    };

    let mut lines: Vec<&str> = contents.lines().collect();
    let existing = lines.iter().position(|l| l.contains(marker));

    match existing {
        Some(index) if lines[index] == line => {
            debug!("{}: marker line already current", rc_file.display());
            return Ok(false);
        }
        Some(index) => {
            lines[index] = line;
            // A second marker line would shadow the first; drop any extras
            let mut seen = 0;
            lines.retain(|l| {
                if l.contains(marker) {
                    seen += 1;
                    seen == 1
                } else {
                    true
                }
            });
        }
        None => lines.push(line),
    }

    let mut updated = lines.join("\n");
    updated.push('\n');
    fs::write(rc_file, updated)?;
    info!("{}: marker line written", rc_file.display());
    Ok(true)
}

/// Remove the line carrying `marker` from the startup file.
///
/// A missing file or absent line is a no-op. Returns true when the file
/// changed.
pub fn remove_line(rc_file: &Path, marker: &str) -> Result<bool> {
    if !rc_file.exists() {
        debug!("{}: no startup file, nothing to remove", rc_file.display());
        return Ok(false);
    }

    let contents = fs::read_to_string(rc_file)?;
    let kept: Vec<&str> = contents.lines().filter(|l| !l.contains(marker)).collect();
    if kept.len() == contents.lines().count() {
        return Ok(false);
    }

    let mut updated = kept.join("\n");
    if !updated.is_empty() {
        updated.push('\n');
    }
    fs::write(rc_file, updated)?;
    info!("{}: marker line removed", rc_file.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MARKER: &str = "oh-my-posh init";
    const LINE: &str = "eval \"$(/usr/local/bin/oh-my-posh init bash)\"";

    #[test]
    fn test_ensure_line_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".bashrc");
        fs::write(&rc, "export EDITOR=vim\n").unwrap();

        assert!(ensure_line(&rc, MARKER, LINE).unwrap());
        let contents = fs::read_to_string(&rc).unwrap();
        assert_eq!(contents, format!("export EDITOR=vim\n{}\n", LINE));
    }

    #[test]
    fn test_ensure_line_creates_missing_file() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".bashrc");

        assert!(ensure_line(&rc, MARKER, LINE).unwrap());
        assert_eq!(fs::read_to_string(&rc).unwrap(), format!("{}\n", LINE));
    }

    #[test]
    fn test_ensure_line_replaces_stale_marker_line() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".bashrc");
        fs::write(&rc, "alias ll='ls -l'\neval \"$(oh-my-posh init bash --old)\"\nexport X=1\n")
            .unwrap();

        assert!(ensure_line(&rc, MARKER, LINE).unwrap());
        let contents = fs::read_to_string(&rc).unwrap();
        // Replaced in place, position preserved
        assert_eq!(
            contents,
            format!("alias ll='ls -l'\n{}\nexport X=1\n", LINE)
        );
    }

    #[test]
    fn test_ensure_line_is_idempotent() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".bashrc");

        assert!(ensure_line(&rc, MARKER, LINE).unwrap());
        assert!(!ensure_line(&rc, MARKER, LINE).unwrap());
        let contents = fs::read_to_string(&rc).unwrap();
        assert_eq!(contents.matches(MARKER).count(), 1);
    }

    #[test]
    fn test_remove_line_deletes_marker_only() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".bashrc");
        fs::write(&rc, format!("export A=1\n{}\nexport B=2\n", LINE)).unwrap();

        assert!(remove_line(&rc, MARKER).unwrap());
        assert_eq!(
            fs::read_to_string(&rc).unwrap(),
            "export A=1\nexport B=2\n"
        );
    }

    #[test]
    fn test_remove_line_absent_is_noop() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".bashrc");
        fs::write(&rc, "export A=1\n").unwrap();

        assert!(!remove_line(&rc, MARKER).unwrap());
        assert_eq!(fs::read_to_string(&rc).unwrap(), "export A=1\n");
    }

    #[test]
    fn test_remove_line_missing_file_is_noop() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".bashrc");
        assert!(!remove_line(&rc, MARKER).unwrap());
        assert!(!rc.exists());
    }
}
