use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::info;

pub const DEFAULT_START_URL: &str = "https://www.italgiure.giustizia.it/sncass/";

/// Everything a crawl run needs, resolved up front from CLI flags and
/// the environment.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub start_url: String,
    pub category: String,
    pub max_pages: usize,
    pub headless: bool,
    pub chrome: PathBuf,
    pub download_dir: PathBuf,
}

/// Chromium binary names worth trying on PATH, most common first.
const CHROME_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Locate a Chrome/Chromium executable: an explicit path wins, then the
/// CHROME_PATH environment variable, then a PATH search.
pub fn resolve_chrome(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        bail!("no Chrome executable at {}", path.display());
    }

    if let Ok(env_path) = std::env::var("CHROME_PATH") {
        let path = PathBuf::from(env_path);
        if path.is_file() {
            info!("using Chrome from CHROME_PATH: {}", path.display());
            return Ok(path);
        }
    }

    for candidate in CHROME_CANDIDATES {
        if let Ok(path) = which::which(candidate) {
            info!("found Chrome on PATH: {}", path.display());
            return Ok(path);
        }
    }

    bail!(
        "Chrome/Chromium not found; install it or pass --chrome\n\
         - Debian/Ubuntu: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Arch: sudo pacman -S chromium"
    )
}
