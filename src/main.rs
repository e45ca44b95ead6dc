//! server-bootstrap - main entry point
//!
//! Parses the CLI, initializes logging, and either runs a single
//! non-interactive operation or drops into the numbered menu.

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use server_bootstrap::account::{self, AdminAccount};
use server_bootstrap::cli::{Cli, Commands};
use server_bootstrap::error::BootstrapError;
use server_bootstrap::{discovery, harden, keys, menu, privilege, theme, toolchain};

/// Initialize tracing with RUST_LOG override support
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    info!("server-bootstrap starting up");

    let cli = Cli::parse_args();
    if cli.skip_root_check {
        std::env::set_var("SERVER_BOOTSTRAP_SKIP_ROOT_CHECK", "1");
    }

    let code = match cli.command {
        Some(command) => match run_command(command) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("{}", theme::error(&e.to_string()));
                1
            }
        },
        None => {
            debug!("no subcommand, launching interactive menu");
            // Fail fast on missing host tools before offering any operation
            privilege::run_preflight_checks(cli.skip_root_check);
            menu::run()
        }
    };

    std::process::exit(code);
}

fn run_command(command: Commands) -> Result<(), BootstrapError> {
    match command {
        Commands::CreateAdmin {
            username,
            keys_from,
        } => {
            let admin = account::create_admin_account(&username)?;
            println!(
                "{}",
                theme::success(&format!(
                    "account {} created (home: {})",
                    admin.username,
                    admin.home.display()
                ))
            );
            let store = keys::authorize_keys(&admin, &keys_from)?;
            println!(
                "{}",
                theme::success(&format!(
                    "{} key(s) authorized ({} total)",
                    store.appended, store.total
                ))
            );
        }
        Commands::HardenSsh { username } => {
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
        Commands::InstallPrompt => {
            let rc = menu::invoking_user_rc()?;
            toolchain::install_prompt_theme(&rc)?;
            println!("{}", theme::success("prompt theme installed"));
        }
        Commands::UninstallPrompt { remove_font } => {
            let rc = menu::invoking_user_rc()?;
            toolchain::uninstall_prompt_theme(&rc, remove_font)?;
            println!("{}", theme::success("prompt theme uninstalled"));
        }
        Commands::InstallDocker => {
            toolchain::install_container_runtime(menu::invoking_user().as_deref())?;
            println!("{}", theme::success("container runtime installed"));
        }
        Commands::Discover => {
            let path = discovery::run_discovery()?;
            println!(
                "{}",
                theme::success(&format!("discovery report: {}", path.display()))
            );
        }
    }
    Ok(())
}
