//! Interactive numbered menu
//!
//! Thin I/O wrapper around the provisioning operations: displays the menu,
//! reads a selection, runs the operation to completion (success or hard
//! failure), reports the result in color, and re-displays the menu. Errors
//! that indicate an unsafe condition to continue under (privilege, existing
//! account, failed backup) terminate the process instead of looping.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use nix::unistd::User;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::debug;

use crate::account::{self, AdminAccount};
use crate::discovery;
use crate::error::{BootstrapError, Result};
use crate::harden;
use crate::keys;
use crate::theme;
use crate::toolchain;

/// One selectable menu operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum MenuItem {
    #[strum(serialize = "Provision administrative account (create user + authorize SSH keys)")]
    ProvisionAdmin,
    #[strum(serialize = "Harden SSH access for an account")]
    HardenSsh,
    #[strum(serialize = "Install prompt theme engine (oh-my-posh + Nerd Font)")]
    InstallPromptTheme,
    #[strum(serialize = "Uninstall prompt theme engine")]
    UninstallPromptTheme,
    #[strum(serialize = "Install container runtime (Docker)")]
    InstallContainerRuntime,
    #[strum(serialize = "Write system discovery report")]
    Discovery,
}

impl MenuItem {
    /// Map a typed selection ("1".."6") to its operation.
    pub fn from_choice(choice: &str) -> Option<Self> {
        let number: usize = choice.trim().parse().ok()?;
        MenuItem::iter().nth(number.checked_sub(1)?)
    }
}

/// Who invoked us, before any sudo elevation.
pub fn invoking_user() -> Option<String> {
    std::env::var("SUDO_USER").ok().filter(|u| !u.is_empty())
}

/// The invoking (non-root) user's shell startup file.
///
/// Resolved here at the edge and passed into the toolchain operations
/// explicitly, so the operations themselves stay decoupled from how
/// elevation was obtained.
pub fn invoking_user_rc() -> Result<PathBuf> {
    if let Some(name) = invoking_user() {
        let user = User::from_name(&name)
            .map_err(|e| BootstrapError::system(format!("identity lookup failed: {}", e)))?
            .ok_or_else(|| {
                BootstrapError::validation(format!("sudo invoker does not exist: {}", name))
            })?;
        return Ok(user.dir.join(".bashrc"));
    }
    let home = std::env::var("HOME")
        .map_err(|_| BootstrapError::validation("cannot resolve home directory (HOME unset)"))?;
    Ok(PathBuf::from(home).join(".bashrc"))
}

fn read_input(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    let bytes = io::stdin().lock().read_line(&mut line)?;
    if bytes == 0 {
        return Err(BootstrapError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "end of input",
        )));
    }
    Ok(line.trim().to_string())
}

/// Yes/no confirmation; empty input takes the safe default "no".
fn confirm(prompt: &str) -> Result<bool> {
    let answer = read_input(&format!("{} [y/N]: ", prompt))?;
    Ok(matches!(answer.as_str(), "y" | "Y" | "yes" | "YES"))
}

fn render_menu() {
    println!();
    println!("{}", theme::heading(theme::BANNER));
    println!();
    for (index, item) in MenuItem::iter().enumerate() {
        println!("{}", theme::menu_entry(index + 1, &item.to_string()));
    }
    println!("  0) Exit");
    println!();
}

/// Run the menu loop until the operator chooses to exit.
///
/// Returns the process exit code: 0 on explicit exit, 1 when an operation
/// failed in a way that makes further mutation unsafe.
pub fn run() -> i32 {
    loop {
        render_menu();
        let choice = match read_input("Select an option: ") {
            Ok(choice) => choice,
            Err(e) => {
                eprintln!("{}", theme::error(&e.to_string()));
                return 1;
            }
        };

        if matches!(choice.as_str(), "0" | "q" | "exit") {
            println!("{}", theme::info("Goodbye."));
            return 0;
        }

        let Some(item) = MenuItem::from_choice(&choice) else {
            println!("{}", theme::warning("Invalid selection, choose 0-6."));
            continue;
        };

        debug!("menu selection: {:?}", item);
        match execute(item) {
            Ok(()) => {}
            Err(e) => {
                eprintln!("{}", theme::error(&e.to_string()));
                if e.is_fatal() {
                    eprintln!(
                        "{}",
                        theme::warning("Unsafe to continue; resolve the above and re-run.")
                    );
                    return 1;
                }
            }
        }
    }
}

fn execute(item: MenuItem) -> Result<()> {
    match item {
        MenuItem::ProvisionAdmin => {
            let username = read_input("Username for the new administrative account: ")?;
            let identity = read_input("GitHub identity to fetch SSH keys from: ")?;

            let admin = account::create_admin_account(&username)?;
            println!(
                "{}",
                theme::success(&format!(
                    "account {} created (home: {})",
                    admin.username,
                    admin.home.display()
                ))
            );

            let store = keys::authorize_keys(&admin, &identity)?;
            println!(
                "{}",
                theme::success(&format!(
                    "{} key(s) authorized in {} ({} total)",
                    store.appended,
                    store.path.display(),
                    store.total
                ))
            );
        }
        MenuItem::HardenSsh => {
            let username = read_input("Account to restrict SSH login to: ")?;
            let admin = AdminAccount::lookup(&username)?;
            let outcome = harden::harden_remote_login(&admin)?;
            println!(
                "{}",
                theme::success(&format!(
                    "sshd configuration hardened (backup: {})",
                    outcome.backup_path.display()
                ))
            );
            println!(
                "{}",
                theme::warning(&format!(
                    "Not applied yet. Verify key-based login works, then run: {}",
                    harden::APPLY_HINT
                ))
            );
        }
        MenuItem::InstallPromptTheme => {
            let rc = invoking_user_rc()?;
            toolchain::install_prompt_theme(&rc)?;
            println!("{}", theme::success("prompt theme installed"));
        }
        MenuItem::UninstallPromptTheme => {
            let rc = invoking_user_rc()?;
            let remove_font = confirm("Also remove the installed Nerd Font?")?;
            toolchain::uninstall_prompt_theme(&rc, remove_font)?;
            println!("{}", theme::success("prompt theme uninstalled"));
        }
        MenuItem::InstallContainerRuntime => {
            toolchain::install_container_runtime(invoking_user().as_deref())?;
            println!("{}", theme::success("container runtime installed"));
        }
        MenuItem::Discovery => {
            let path = discovery::run_discovery()?;
            println!(
                "{}",
                theme::success(&format!("discovery report: {}", path.display()))
            );
        }
    }
    Ok(())
}
