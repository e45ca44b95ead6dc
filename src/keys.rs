//! Public-key authorization for the administrative account
//!
//! Fetches the account owner's published public keys and installs them into
//! the account's authorized-keys file. Granting no access is safer than
//! partial or ambiguous access, so any fetch failure (network error,
//! non-success response, empty key set) aborts before a single byte is
//! written to the key store.
//!
//! Ownership and permission enforcement are unconditional post-conditions:
//! they run on every invocation, whether or not new keys were appended, so
//! permission drift self-heals.

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::account::{self, AdminAccount};
use crate::error::{BootstrapError, Result};
use crate::http;
use crate::privilege;

/// Base URL of the key-publishing endpoint; `<base>/<identity>.keys` returns
/// newline-delimited public keys.
pub const KEY_SOURCE_BASE: &str = "https://github.com";

/// The installed key store after a successful authorization run.
#[derive(Debug)]
pub struct KeyStore {
    /// Path of the authorized-keys file.
    pub path: PathBuf,
    /// Keys appended by this run.
    pub appended: usize,
    /// Total keys now present.
    pub total: usize,
}

/// Fetch the published public keys for a source identity.
///
/// An empty result set is a hard error: it usually means a typoed identity,
/// and installing nothing while reporting success would leave the operator
/// believing key-based login works.
pub fn fetch_public_keys(identity: &str) -> Result<Vec<String>> {
    if identity.is_empty() {
        return Err(BootstrapError::validation(
            "key source identity must not be empty",
        ));
    }

    let url = format!("{}/{}.keys", KEY_SOURCE_BASE, identity);
    let body = http::get_text(&url).map_err(|e| BootstrapError::key_fetch(e.to_string()))?;

    let keys: Vec<String> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if keys.is_empty() {
        return Err(BootstrapError::key_fetch(format!(
            "{} published no public keys",
            identity
        )));
    }

    info!("fetched {} public key(s) for {}", keys.len(), identity);
    Ok(keys)
}

/// Append keys to an authorized-keys file, skipping ones already present.
///
/// Returns the number of keys appended. Existing content is never replaced.
pub fn append_missing_keys(auth_file: &Path, keys: &[String]) -> Result<usize> {
    let existing = if auth_file.exists() {
        fs::read_to_string(auth_file)?
    } else {
        String::new()
    };
    let present: Vec<&str> = existing.lines().map(str::trim).collect();

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(auth_file)?;

    let mut appended = 0;
    for key in keys {
        if present.contains(&key.as_str()) {
            debug!("key already authorized, skipping");
            continue;
        }
        writeln!(file, "{}", key)?;
        appended += 1;
    }

    Ok(appended)
}

/// Enforce the key-store permission invariant: directory 0700, file 0600.
///
/// The fetch-and-append step writes before permissions are finalized, so this
/// must run after every content mutation and before the operation reports
/// success.
pub fn enforce_key_permissions(ssh_dir: &Path, auth_file: &Path) -> Result<()> {
    fs::set_permissions(ssh_dir, fs::Permissions::from_mode(0o700))?;
    fs::set_permissions(auth_file, fs::Permissions::from_mode(0o600))?;
    debug!("key store permissions enforced (0700/0600)");
    Ok(())
}

/// Fetch and install the public keys published by `source_identity` into the
/// account's key store.
pub fn authorize_keys(account: &AdminAccount, source_identity: &str) -> Result<KeyStore> {
    authorize_keys_with(account, || fetch_public_keys(source_identity))
}

/// Key authorization with an injectable key source.
///
/// The fetch runs strictly before any write: when it fails, the key store is
/// byte-for-byte unchanged and no permission-setting step has run.
pub fn authorize_keys_with<F>(account: &AdminAccount, fetch: F) -> Result<KeyStore>
where
    F: FnOnce() -> Result<Vec<String>>,
{
    privilege::require_root()?;

    let keys = fetch()?;
    if keys.is_empty() {
        return Err(BootstrapError::key_fetch("empty key set"));
    }

    let ssh_dir = account.ssh_dir();
    let auth_file = account.authorized_keys();
    fs::create_dir_all(&ssh_dir)?;

    let appended = append_missing_keys(&auth_file, &keys)?;

    // Unconditional post-conditions, run whether or not anything was appended
    account::chown_tree_to(&ssh_dir, &account.username)?;
    enforce_key_permissions(&ssh_dir, &auth_file)?;

    let total = fs::read_to_string(&auth_file)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count();

    info!(
        "authorized {} new key(s) for {} ({} total)",
        appended, account.username, total
    );
    Ok(KeyStore {
        path: auth_file,
        appended,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_missing_keys_appends_and_dedupes() {
        let dir = tempdir().unwrap();
        let auth = dir.path().join("authorized_keys");
        let keys = vec![
            "ssh-ed25519 AAAA alice@laptop".to_string(),
            "ssh-rsa BBBB alice@desktop".to_string(),
        ];

        assert_eq!(append_missing_keys(&auth, &keys).unwrap(), 2);
        // Re-run with the same set is a no-op
        assert_eq!(append_missing_keys(&auth, &keys).unwrap(), 0);

        let contents = fs::read_to_string(&auth).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_append_preserves_prior_entries() {
        let dir = tempdir().unwrap();
        let auth = dir.path().join("authorized_keys");
        fs::write(&auth, "ssh-rsa OLD pre-existing\n").unwrap();

        let keys = vec!["ssh-ed25519 NEW fresh".to_string()];
        assert_eq!(append_missing_keys(&auth, &keys).unwrap(), 1);

        let contents = fs::read_to_string(&auth).unwrap();
        assert!(contents.starts_with("ssh-rsa OLD pre-existing\n"));
        assert!(contents.contains("ssh-ed25519 NEW fresh"));
    }

    #[test]
    fn test_enforce_key_permissions() {
        let dir = tempdir().unwrap();
        let ssh_dir = dir.path().join(".ssh");
        let auth = ssh_dir.join("authorized_keys");
        fs::create_dir_all(&ssh_dir).unwrap();
        fs::write(&auth, "").unwrap();
        // Start from permissive modes to prove enforcement tightens them
        fs::set_permissions(&ssh_dir, fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(&auth, fs::Permissions::from_mode(0o644)).unwrap();

        enforce_key_permissions(&ssh_dir, &auth).unwrap();

        let dir_mode = fs::metadata(&ssh_dir).unwrap().permissions().mode() & 0o777;
        let file_mode = fs::metadata(&auth).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
        assert_eq!(file_mode, 0o600);
    }
}
