//! Package manager wrapper
//!
//! Thin, logged front-end over the host's package manager. Installs run
//! non-interactively so a stray confirmation prompt can never hang a
//! provisioning operation.

use tracing::{info, warn};

use crate::error::Result;
use crate::exec;

/// Non-interactive frontend marker for dpkg-based hosts
const NONINTERACTIVE_ENV: &[(&str, &str)] = &[("DEBIAN_FRONTEND", "noninteractive")];

/// Logged wrapper over `apt-get`.
pub struct PackageManager;

impl PackageManager {
    pub fn new() -> Self {
        Self
    }

    /// Refresh package metadata.
    pub fn update_metadata(&self) -> Result<()> {
        info!("refreshing package metadata");
        exec::run_with_env("apt-get", &["update", "-q"], NONINTERACTIVE_ENV)?;
        Ok(())
    }

    /// Install packages.
    pub fn install(&self, packages: &[&str]) -> Result<()> {
        if packages.is_empty() {
            warn!("install called with empty package list");
            return Ok(());
        }
        info!("installing packages: {:?}", packages);

        let mut args = vec!["install", "-y", "-q"];
        args.extend_from_slice(packages);
        exec::run_with_env("apt-get", &args, NONINTERACTIVE_ENV)?;

        info!("package installation complete: {:?}", packages);
        Ok(())
    }
}

impl Default for PackageManager {
    fn default() -> Self {
        Self::new()
    }
}
