//! SSH access hardening
//!
//! Rewrites the sshd configuration to key-only, non-root login restricted to
//! the administrative account. Two invariants protect the operator from
//! locking themselves out:
//!
//! 1. A byte-verified backup must exist before the live file is touched.
//! 2. Password authentication is never disabled unless the target account
//!    already has at least one authorized key installed.
//!
//! This operation never restarts sshd. Restarting the very service carrying
//! the operator's session risks self-lockout; the exact follow-up command is
//! reported instead and left to the operator.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::account::AdminAccount;
use crate::error::{BootstrapError, Result};
use crate::privilege;
use crate::sshd_config::SshdConfig;

/// Well-known path of the live sshd configuration
pub const SSHD_CONFIG_PATH: &str = "/etc/ssh/sshd_config";

/// Manual follow-up the operator must run to apply the new configuration
pub const APPLY_HINT: &str = "systemctl restart ssh";

/// Directives forced to fixed values regardless of their prior state
const HARDENED_DIRECTIVES: &[(&str, &str)] = &[
    ("PermitRootLogin", "no"),
    ("PasswordAuthentication", "no"),
    ("ChallengeResponseAuthentication", "no"),
    ("UsePAM", "yes"),
];

/// Result of a hardening run.
#[derive(Debug)]
pub struct HardenOutcome {
    /// Path of the rewritten live configuration.
    pub config_path: PathBuf,
    /// Path of the pre-mutation backup.
    pub backup_path: PathBuf,
}

/// Harden remote login for the administrative account.
///
/// The contract ends at "configuration written"; applying it is the
/// operator's explicit follow-up ([`APPLY_HINT`]).
pub fn harden_remote_login(account: &AdminAccount) -> Result<HardenOutcome> {
    privilege::require_root()?;
    harden_config_file(
        Path::new(SSHD_CONFIG_PATH),
        &account.username,
        &account.authorized_keys(),
    )
}

/// Harden a specific configuration file (path-parameterized for tests).
pub fn harden_config_file(
    config_path: &Path,
    username: &str,
    authorized_keys: &Path,
) -> Result<HardenOutcome> {
    ensure_key_installed(username, authorized_keys)?;

    let backup_path = create_backup(config_path)?;
    info!("sshd config backed up to {}", backup_path.display());

    let text = fs::read_to_string(config_path)?;
    let mut config = SshdConfig::parse(&text);
    for (keyword, value) in HARDENED_DIRECTIVES {
        config.set(keyword, value);
    }
    config.allow_user(username);

    fs::write(config_path, config.to_string())?;
    info!(
        "sshd hardened for {}; apply with: {}",
        username, APPLY_HINT
    );

    Ok(HardenOutcome {
        config_path: config_path.to_path_buf(),
        backup_path,
    })
}

/// Lockout guard: refuse to disable password login while the target account
/// has no working key-based path in.
fn ensure_key_installed(username: &str, authorized_keys: &Path) -> Result<()> {
    let has_key = fs::read_to_string(authorized_keys)
        .map(|text| {
            text.lines()
                .map(str::trim)
                .any(|line| !line.is_empty() && !line.starts_with('#'))
        })
        .unwrap_or(false);

    if has_key {
        Ok(())
    } else {
        Err(BootstrapError::validation(format!(
            "refusing to disable password authentication: {} has no authorized keys yet \
             (run key authorization first)",
            username
        )))
    }
}

/// Copy the live configuration to a timestamped backup path and verify the
/// copy byte-for-byte. Existing backups are never overwritten; a suffix is
/// added on collision.
fn create_backup(config_path: &Path) -> Result<PathBuf> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut backup_path = PathBuf::from(format!("{}.bak.{}", config_path.display(), timestamp));
    let mut counter = 0u32;
    while backup_path.exists() {
        counter += 1;
        backup_path = PathBuf::from(format!(
            "{}.bak.{}.{}",
            config_path.display(),
            timestamp,
            counter
        ));
    }

    fs::copy(config_path, &backup_path)
        .map_err(|e| BootstrapError::backup(format!("copy failed: {}", e)))?;

    let original = fs::read(config_path).map_err(|e| BootstrapError::backup(e.to_string()))?;
    let copied = fs::read(&backup_path).map_err(|e| BootstrapError::backup(e.to_string()))?;
    if original != copied {
        return Err(BootstrapError::backup(format!(
            "verification failed: {} does not match {}",
            backup_path.display(),
            config_path.display()
        )));
    }

    Ok(backup_path)
}
