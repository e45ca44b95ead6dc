//! Administrative account provisioning
//!
//! Creates the privileged account this tool hands the server over to: system
//! user with a home directory, membership in the elevation and container
//! groups, a passwordless sudo grant, and the `.ssh`/workspace skeleton the
//! key authorizer populates afterwards.
//!
//! Steps run strictly in order and fail fast. There is no rollback of earlier
//! steps on a later failure; failures are reported and remediation is left to
//! the operator.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use nix::unistd::{Group, User};
use tracing::{debug, info};

use crate::error::{BootstrapError, Result};
use crate::exec;
use crate::privilege;

/// Group whose members may elevate via sudo
pub const ELEVATION_GROUP: &str = "sudo";
/// Group granting access to the container runtime socket
pub const CONTAINER_GROUP: &str = "docker";
/// Directory holding per-user sudoers drop-in files
pub const SUDOERS_DIR: &str = "/etc/sudoers.d";
/// Login shell for the new account
const LOGIN_SHELL: &str = "/bin/bash";
/// Project workspace directory created under the new home
const WORKSPACE_DIR: &str = "workspace";

/// A provisioned administrative account.
///
/// Created once by [`create_admin_account`]; never mutated by this tool
/// afterwards.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub username: String,
    pub home: PathBuf,
}

impl AdminAccount {
    /// The account's `.ssh` directory.
    pub fn ssh_dir(&self) -> PathBuf {
        self.home.join(".ssh")
    }

    /// The account's authorized-keys file.
    pub fn authorized_keys(&self) -> PathBuf {
        self.ssh_dir().join("authorized_keys")
    }

    /// The account's project workspace directory.
    pub fn workspace(&self) -> PathBuf {
        self.home.join(WORKSPACE_DIR)
    }

    /// Look up an already-provisioned account in the identity database.
    pub fn lookup(username: &str) -> Result<Self> {
        validate_username(username)?;
        let user = User::from_name(username)
            .map_err(|e| BootstrapError::system(format!("identity lookup failed: {}", e)))?
            .ok_or_else(|| {
                BootstrapError::validation(format!("no such account: {}", username))
            })?;
        Ok(Self {
            username: user.name,
            home: user.dir,
        })
    }
}

/// Validate a candidate username.
///
/// Empty input is the operator hitting enter by mistake; anything outside
/// the conservative `useradd` charset is rejected before it reaches a shell.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(BootstrapError::validation("username must not be empty"));
    }
    let mut chars = username.chars();
    let first = chars.next().unwrap_or(' ');
    if !(first.is_ascii_lowercase() || first == '_') {
        return Err(BootstrapError::validation(format!(
            "username must start with a lowercase letter or underscore: {:?}",
            username
        )));
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-') {
        return Err(BootstrapError::validation(format!(
            "username contains invalid characters: {:?}",
            username
        )));
    }
    Ok(())
}

/// Check whether an account exists in the identity database.
pub fn account_exists(username: &str) -> Result<bool> {
    let user = User::from_name(username)
        .map_err(|e| BootstrapError::system(format!("identity lookup failed: {}", e)))?;
    Ok(user.is_some())
}

/// Ensure a system group exists.
///
/// Creating an already-existing group is a no-op, not an error, so this is
/// safe to invoke on every run.
pub fn ensure_group(name: &str) -> Result<()> {
    let group = Group::from_name(name)
        .map_err(|e| BootstrapError::system(format!("group lookup failed: {}", e)))?;
    if group.is_some() {
        debug!("group {} already exists", name);
        return Ok(());
    }
    exec::run("groupadd", &[name])?;
    info!("created group {}", name);
    Ok(())
}

/// The fixed-format sudoers rule granting passwordless elevation.
pub fn elevation_grant_line(username: &str) -> String {
    format!("{} ALL=(ALL) NOPASSWD:ALL", username)
}

/// Write the per-user sudoers drop-in granting passwordless elevation.
///
/// The grant file must never be group- or world-writable; sudo refuses to
/// honor it otherwise. Mode is forced to 0440 after the write.
pub fn write_elevation_grant(sudoers_dir: &Path, username: &str) -> Result<PathBuf> {
    let path = sudoers_dir.join(username);
    fs::write(&path, format!("{}\n", elevation_grant_line(username)))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o440))?;
    info!("elevation grant written: {}", path.display());
    Ok(path)
}

/// Create the `.ssh` and workspace skeleton under a home directory.
///
/// The authorized-keys file is created empty if absent so the key authorizer
/// always has a file to append to. Permissions on the key store are finalized
/// here and re-enforced by the key authorizer after every content mutation.
pub fn ensure_home_skeleton(home: &Path) -> Result<()> {
    let ssh_dir = home.join(".ssh");
    let workspace = home.join(WORKSPACE_DIR);
    let auth_keys = ssh_dir.join("authorized_keys");

    fs::create_dir_all(&ssh_dir)?;
    fs::create_dir_all(&workspace)?;
    if !auth_keys.exists() {
        fs::write(&auth_keys, "")?;
    }
    fs::set_permissions(&ssh_dir, fs::Permissions::from_mode(0o700))?;
    fs::set_permissions(&auth_keys, fs::Permissions::from_mode(0o600))?;

    debug!("home skeleton ready under {}", home.display());
    Ok(())
}

/// Create the administrative account.
///
/// Preconditions: root privilege, valid username, account must not already
/// exist. A pre-existing account is a hard error, never silently reused; the
/// operator did not intend to provision an account somebody else owns.
pub fn create_admin_account(username: &str) -> Result<AdminAccount> {
    privilege::require_root()?;
    validate_username(username)?;

    if account_exists(username)? {
        return Err(BootstrapError::AccountExists(username.to_string()));
    }

    info!("creating administrative account {}", username);
    exec::run("useradd", &["-m", "-s", LOGIN_SHELL, username])?;

    // Container group may not exist on a fresh host; elevation group ships
    // with the distribution.
    ensure_group(CONTAINER_GROUP)?;
    exec::run(
        "usermod",
        &[
            "-aG",
            &format!("{},{}", ELEVATION_GROUP, CONTAINER_GROUP),
            username,
        ],
    )?;

    write_elevation_grant(Path::new(SUDOERS_DIR), username)?;

    let account = AdminAccount::lookup(username)?;
    ensure_home_skeleton(&account.home)?;
    chown_tree_to(&account.ssh_dir(), &account.username)?;
    chown_tree_to(&account.workspace(), &account.username)?;

    info!(
        "account {} provisioned with home {}",
        account.username,
        account.home.display()
    );
    Ok(account)
}

/// Recursively hand ownership of a path to an account.
pub fn chown_tree_to(path: &Path, username: &str) -> Result<()> {
    let user = User::from_name(username)
        .map_err(|e| BootstrapError::system(format!("identity lookup failed: {}", e)))?
        .ok_or_else(|| BootstrapError::validation(format!("no such account: {}", username)))?;

    chown_tree(path, &user)
}

fn chown_tree(path: &Path, user: &User) -> Result<()> {
    nix::unistd::chown(path, Some(user.uid), Some(user.gid))
        .map_err(|e| BootstrapError::system(format!("chown {} failed: {}", path.display(), e)))?;

    if path.is_dir() {
        for entry in fs::read_dir(path)? {
            chown_tree(&entry?.path(), user)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_username_rejects_empty() {
        let err = validate_username("").unwrap_err();
        assert!(matches!(err, BootstrapError::Validation(_)));
    }

    #[test]
    fn test_validate_username_rejects_bad_charset() {
        assert!(validate_username("Alice").is_err());
        assert!(validate_username("a lice").is_err());
        assert!(validate_username("9lives").is_err());
        assert!(validate_username("bob;rm").is_err());
    }

    #[test]
    fn test_validate_username_accepts_typical_names() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("dev-ops_2").is_ok());
        assert!(validate_username("_svc").is_ok());
    }

    #[test]
    fn test_elevation_grant_line_format() {
        assert_eq!(
            elevation_grant_line("alice"),
            "alice ALL=(ALL) NOPASSWD:ALL"
        );
    }

    #[test]
    fn test_write_elevation_grant_mode_0440() {
        let dir = tempdir().unwrap();
        let path = write_elevation_grant(dir.path(), "alice").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "alice ALL=(ALL) NOPASSWD:ALL\n");

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o440, "grant file must be read-only");
    }

    #[test]
    fn test_home_skeleton_layout_and_modes() {
        let dir = tempdir().unwrap();
        ensure_home_skeleton(dir.path()).unwrap();

        let ssh_dir = dir.path().join(".ssh");
        let auth = ssh_dir.join("authorized_keys");
        assert!(ssh_dir.is_dir());
        assert!(dir.path().join("workspace").is_dir());
        assert!(auth.is_file());

        let dir_mode = fs::metadata(&ssh_dir).unwrap().permissions().mode() & 0o777;
        let file_mode = fs::metadata(&auth).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
        assert_eq!(file_mode, 0o600);
    }

    #[test]
    fn test_home_skeleton_is_idempotent_and_keeps_keys() {
        let dir = tempdir().unwrap();
        ensure_home_skeleton(dir.path()).unwrap();
        fs::write(dir.path().join(".ssh/authorized_keys"), "ssh-ed25519 AAAA key\n").unwrap();

        ensure_home_skeleton(dir.path()).unwrap();
        let contents = fs::read_to_string(dir.path().join(".ssh/authorized_keys")).unwrap();
        assert_eq!(contents, "ssh-ed25519 AAAA key\n", "re-run must not truncate keys");
    }

    #[test]
    fn test_account_exists_for_root_and_missing() {
        assert!(account_exists("root").unwrap());
        assert!(!account_exists("no_such_user_42x").unwrap());
    }
}
