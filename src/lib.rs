//! server-bootstrap library
//!
//! Core provisioning operations for turning a fresh Linux server into a
//! secured, developer-ready machine: administrative account creation, SSH
//! key authorization, sshd hardening, toolchain installers, and a host
//! discovery report.

pub mod account;
pub mod cli;
pub mod discovery;
pub mod error;
pub mod exec;
pub mod harden;
pub mod http;
pub mod keys;
pub mod menu;
pub mod pkg;
pub mod privilege;
pub mod shell_init;
pub mod sshd_config;
pub mod theme;
pub mod toolchain;

// Re-export main types for convenience
pub use account::{create_admin_account, AdminAccount};
pub use error::{BootstrapError, Result};
pub use harden::{harden_remote_login, HardenOutcome, APPLY_HINT, SSHD_CONFIG_PATH};
pub use keys::{authorize_keys, KeyStore};
pub use menu::MenuItem;
pub use pkg::PackageManager;
pub use sshd_config::SshdConfig;
