//! Optional developer-toolchain installers
//!
//! Independent, individually invocable, idempotent operations: the prompt
//! theme engine (oh-my-posh plus a Nerd Font for its glyphs) and the
//! container runtime. Each verifies privilege, refreshes package metadata,
//! performs its package/archive work, and owns exactly one marker-keyed line
//! in the invoking user's shell startup file.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tracing::{info, warn};

use crate::account::{self, CONTAINER_GROUP};
use crate::error::Result;
use crate::exec;
use crate::http;
use crate::pkg::PackageManager;
use crate::privilege;
use crate::shell_init;

/// Install location of the prompt theme engine binary
pub const PROMPT_ENGINE_PATH: &str = "/usr/local/bin/oh-my-posh";
/// Release artifact for the prompt theme engine
const PROMPT_ENGINE_URL: &str =
    "https://github.com/JanDeDobbeleer/oh-my-posh/releases/latest/download/posh-linux-amd64";
/// Marker substring identifying our line in the shell startup file
pub const PROMPT_MARKER: &str = "oh-my-posh init";
/// The single initialization line added to the shell startup file
pub const PROMPT_INIT_LINE: &str = "eval \"$(/usr/local/bin/oh-my-posh init bash)\"";

/// Nerd Font archive providing the glyphs prompt themes rely on
const FONT_ARCHIVE_URL: &str =
    "https://github.com/ryanoasis/nerd-fonts/releases/latest/download/Meslo.zip";
/// System-wide install directory for the font
pub const FONT_DIR: &str = "/usr/local/share/fonts/meslo";

/// Packages the font installation depends on
const FONT_TOOL_PACKAGES: &[&str] = &["unzip", "fontconfig"];
/// Container runtime package set
const CONTAINER_PACKAGES: &[&str] = &["docker.io"];

/// Install the prompt theme engine, its font, and the shell init line.
pub fn install_prompt_theme(rc_file: &Path) -> Result<()> {
    privilege::require_root()?;

    let pkg = PackageManager::new();
    pkg.update_metadata()?;
    pkg.install(FONT_TOOL_PACKAGES)?;

    let bytes = http::download(PROMPT_ENGINE_URL, Path::new(PROMPT_ENGINE_PATH))?;
    fs::set_permissions(
        Path::new(PROMPT_ENGINE_PATH),
        fs::Permissions::from_mode(0o755),
    )?;
    info!("prompt engine installed ({} bytes)", bytes);

    install_nerd_font()?;

    shell_init::ensure_line(rc_file, PROMPT_MARKER, PROMPT_INIT_LINE)?;
    info!("prompt theme ready; open a new shell to see it");
    Ok(())
}

/// Remove the prompt theme engine and its shell init line.
///
/// Every artifact is removed tolerantly: a missing binary, line, or font
/// directory is already the desired end state. Font removal only happens
/// when the operator confirmed it (`remove_font`).
pub fn uninstall_prompt_theme(rc_file: &Path, remove_font: bool) -> Result<()> {
    privilege::require_root()?;

    let engine = Path::new(PROMPT_ENGINE_PATH);
    if engine.exists() {
        fs::remove_file(engine)?;
        info!("prompt engine removed");
    }

    shell_init::remove_line(rc_file, PROMPT_MARKER)?;

    if remove_font {
        let font_dir = Path::new(FONT_DIR);
        if font_dir.exists() {
            fs::remove_dir_all(font_dir)?;
            refresh_font_cache();
            info!("font removed");
        }
    }

    info!("prompt theme uninstalled");
    Ok(())
}

/// Install the container runtime and grant the invoking user socket access.
pub fn install_container_runtime(invoking_user: Option<&str>) -> Result<()> {
    privilege::require_root()?;

    let pkg = PackageManager::new();
    pkg.update_metadata()?;
    pkg.install(CONTAINER_PACKAGES)?;

    account::ensure_group(CONTAINER_GROUP)?;
    if let Some(user) = invoking_user {
        exec::run("usermod", &["-aG", CONTAINER_GROUP, user])?;
        info!("{} added to the {} group", user, CONTAINER_GROUP);
    }

    // Service activation is best-effort: minimal hosts may not run systemd
    if let Err(e) = exec::run("systemctl", &["enable", "--now", "docker"]) {
        warn!("could not enable docker service: {}", e);
    }

    info!("container runtime installed");
    Ok(())
}

fn install_nerd_font() -> Result<()> {
    let font_dir = Path::new(FONT_DIR);
    fs::create_dir_all(font_dir)?;

    let archive = std::env::temp_dir().join("server-bootstrap-font.zip");
    http::download(FONT_ARCHIVE_URL, &archive)?;

    exec::run(
        "unzip",
        &[
            "-o",
            &archive.display().to_string(),
            "-d",
            &font_dir.display().to_string(),
        ],
    )?;
    let _ = fs::remove_file(&archive);

    refresh_font_cache();
    info!("font installed to {}", FONT_DIR);
    Ok(())
}

fn refresh_font_cache() {
    if let Err(e) = exec::run("fc-cache", &["-f"]) {
        warn!("font cache refresh failed: {}", e);
    }
}
