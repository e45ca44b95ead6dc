//! Point-in-time host discovery report
//!
//! Read-only collection of OS identity, kernel version, block devices,
//! filesystem mounts, and the invoking user, concatenated into a single
//! timestamped artifact and echoed to the operator. A pure function of host
//! state and current time; always safe to re-run. Individual collectors are
//! best-effort: a missing host tool yields an "unavailable" section, not a
//! failed report. Only writing the report itself can fail.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::exec;

/// Scratch directory the report lands in
pub const SCRATCH_DIR: &str = "/tmp";

/// Machine-readable report header.
#[derive(Debug, Serialize)]
struct ReportMeta {
    tool: &'static str,
    version: &'static str,
    platform: String,
    timestamp: u64,
}

/// Collect the discovery snapshot and write it under [`SCRATCH_DIR`].
pub fn run_discovery() -> Result<PathBuf> {
    run_discovery_into(Path::new(SCRATCH_DIR))
}

/// Collect the discovery snapshot into a specific directory.
pub fn run_discovery_into(dir: &Path) -> Result<PathBuf> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let platform = exec::run("uname", &["-s"])
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|_| std::env::consts::OS.to_string());

    let meta = ReportMeta {
        tool: "server-bootstrap",
        version: env!("CARGO_PKG_VERSION"),
        platform: platform.clone(),
        timestamp,
    };

    let mut report = String::new();
    let _ = writeln!(
        report,
        "{}",
        serde_json::to_string_pretty(&meta).unwrap_or_default()
    );
    push_section(&mut report, "Operating system", read_os_release());
    push_section(&mut report, "Kernel", exec::run("uname", &["-a"]));
    push_section(&mut report, "Block devices", exec::run("lsblk", &[]));
    push_section(&mut report, "Filesystem mounts", exec::run("df", &["-h"]));
    push_section(&mut report, "Invoking user", invoking_user());

    let path = dir.join(format!("system_discovery_{}_{}.log", platform, timestamp));
    fs::write(&path, &report)?;

    // Echo to the operator as well as persisting
    println!("{}", report);
    info!("discovery report written to {}", path.display());
    Ok(path)
}

fn push_section(report: &mut String, title: &str, content: Result<String>) {
    let _ = writeln!(report, "===== {} =====", title);
    match content {
        Ok(text) => {
            let _ = writeln!(report, "{}", text.trim_end());
        }
        Err(e) => {
            let _ = writeln!(report, "unavailable: {}", e);
        }
    }
    let _ = writeln!(report);
}

fn read_os_release() -> Result<String> {
    Ok(fs::read_to_string("/etc/os-release")?)
}

fn invoking_user() -> Result<String> {
    let mut out = exec::run("id", &[])?;
    // When elevated via sudo, record who actually invoked us
    if let Ok(invoker) = std::env::var("SUDO_USER") {
        out.push_str(&format!("invoked via sudo by: {}\n", invoker));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_report_is_written_and_named_by_platform_and_time() {
        let dir = tempdir().unwrap();
        let path = run_discovery_into(dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("system_discovery_"));
        assert!(name.ends_with(".log"));
        assert!(path.exists());
    }

    #[test]
    fn test_report_contains_expected_sections() {
        let dir = tempdir().unwrap();
        let path = run_discovery_into(dir.path()).unwrap();
        let report = fs::read_to_string(&path).unwrap();

        assert!(report.contains("===== Operating system ====="));
        assert!(report.contains("===== Kernel ====="));
        assert!(report.contains("===== Block devices ====="));
        assert!(report.contains("===== Filesystem mounts ====="));
        assert!(report.contains("===== Invoking user ====="));
        // JSON header parses back
        let first_brace = report.find('{').unwrap();
        let end = report.find("\n=====").unwrap();
        let meta: serde_json::Value =
            serde_json::from_str(&report[first_brace..end]).unwrap();
        assert_eq!(meta["tool"], "server-bootstrap");
    }

    #[test]
    fn test_rerun_produces_distinct_or_identical_artifacts_safely() {
        // Re-running is always safe; at worst the same second yields the
        // same filename, which is simply rewritten with fresh content
        let dir = tempdir().unwrap();
        let first = run_discovery_into(dir.path()).unwrap();
        let second = run_discovery_into(dir.path()).unwrap();
        assert!(first.exists());
        assert!(second.exists());
    }
}
