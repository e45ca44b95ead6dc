use clap::{Parser, Subcommand};

/// server-bootstrap - provision a fresh server into a secured, developer-ready state
#[derive(Parser)]
#[command(name = "server-bootstrap")]
#[command(about = "Interactive menu-driven server provisioning: admin account, SSH hardening, dev toolchain")]
#[command(version)]
pub struct Cli {
    /// Skip the root privilege check (development only).
    ///
    /// Equivalent to SERVER_BOOTSTRAP_SKIP_ROOT_CHECK=1. Operations that
    /// mutate system state will still fail on permission errors from the
    /// kernel; this only bypasses the up-front guard.
    #[arg(long, global = true)]
    pub skip_root_check: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Non-interactive equivalents of the menu operations.
#[derive(Subcommand)]
pub enum Commands {
    /// Create the administrative account and authorize its SSH keys
    CreateAdmin {
        /// Username for the new account
        username: String,
        /// GitHub identity whose published keys are installed
        #[arg(long)]
        keys_from: String,
    },
    /// Harden sshd configuration for an existing account
    HardenSsh {
        /// Account SSH login is restricted to
        username: String,
    },
    /// Install the prompt theme engine and font
    InstallPrompt,
    /// Uninstall the prompt theme engine
    UninstallPrompt {
        /// Also remove the installed font (no interactive prompt)
        #[arg(long)]
        remove_font: bool,
    },
    /// Install the container runtime
    InstallDocker,
    /// Write a system discovery report
    Discover,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
