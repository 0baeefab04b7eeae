use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Browsers looked up on `PATH`, in order of preference.
pub const BROWSERS: [&str; 5] = ["google-chrome", "chromium", "chromium-browser", "chrome", "firefox"];
const FLATPAK_APPS: [&str; 3] = ["com.google.Chrome", "org.chromium.Chromium", "org.mozilla.firefox"];

/// A way of opening a URL in a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Browser {
    /// A directly executable binary.
    Binary { path: PathBuf },
    /// A Flatpak-installed application.
    Flatpak { flatpak: PathBuf, app_id: String },
    /// The platform's "open with the default application" command.
    Opener { program: PathBuf, args: Vec<String> },
}
impl Browser {
    /// Find a browser: the `configured` one if given, otherwise the first
    /// known browser on `PATH`, then Flatpak installs, then the platform
    /// opener.
    pub fn discover(configured: Option<&Path>) -> Result<Self> {
        Self::discover_in(configured, None)
    }

    /// Like [`discover()`](Self::discover), searching `search_path` instead
    /// of `PATH`.
    pub fn discover_in(configured: Option<&Path>, search_path: Option<&OsStr>) -> Result<Self> {
        if let Some(configured) = configured {
            return Self::configured(configured, search_path);
        }
        for exe in BROWSERS {
            if let Some(path) = find(exe, search_path) {
                return Ok(Self::Binary { path });
            }
        }
        tracing::info!("No known browser found in PATH");
        if let Some(flatpak) = find("flatpak", search_path) {
            tracing::trace!(flatpak = %flatpak.display(), "Discovered Flatpak on system; searching installed apps");
            for app_id in FLATPAK_APPS {
                if Command::new(&flatpak).args(["info", app_id]).output().is_ok_and(|o| o.status.success()) {
                    return Ok(Self::Flatpak { flatpak, app_id: app_id.to_string() });
                }
            }
        } else {
            tracing::debug!("Flatpak not found; skipping containerized browser checks.");
        }
        Self::opener(search_path)
    }

    fn configured(configured: &Path, search_path: Option<&OsStr>) -> Result<Self> {
        // A bare name is looked up on PATH, anything else is taken as a path.
        let path = if configured.components().count() == 1 && !configured.is_absolute() {
            find(&configured.to_string_lossy(), search_path)
        } else {
            configured.is_file().then(|| configured.to_path_buf())
        };
        match path {
            Some(path) => Ok(Self::Binary { path }),
            None => {
                tracing::warn!(browser = %configured.display(), "Configured browser not found");
                exn::bail!(ErrorKind::BrowserNotFound)
            },
        }
    }

    #[cfg(target_os = "windows")]
    fn opener(_search_path: Option<&OsStr>) -> Result<Self> {
        // `start` treats its first quoted argument as the window title.
        Ok(Self::Opener {
            program: PathBuf::from("cmd"),
            args: vec!["/C".to_string(), "start".to_string(), String::new()],
        })
    }

    #[cfg(not(target_os = "windows"))]
    fn opener(search_path: Option<&OsStr>) -> Result<Self> {
        let name = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };
        match find(name, search_path) {
            Some(program) => Ok(Self::Opener { program, args: Vec::new() }),
            None => exn::bail!(ErrorKind::BrowserNotFound),
        }
    }

    /// The executable that will be spawned.
    pub fn program(&self) -> &Path {
        match self {
            Self::Binary { path } => path,
            Self::Flatpak { flatpak, .. } => flatpak,
            Self::Opener { program, .. } => program,
        }
    }

    fn command(&self, url: &str) -> Command {
        let mut command = Command::new(self.program());
        match self {
            Self::Binary { .. } => {},
            Self::Flatpak { app_id, .. } => {
                command.args(["run", app_id.as_str()]);
            },
            Self::Opener { args, .. } => {
                command.args(args);
            },
        }
        command.arg(url);
        command
    }

    /// Open `url` and return without waiting for the browser.
    pub fn open(&self, url: &str) -> Result<()> {
        validate_url(url)?;
        let child = self
            .command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .or_raise(|| ErrorKind::Spawn(self.program().to_path_buf()))?;
        tracing::info!(browser = %self.program().display(), pid = child.id(), url, "Opened web viewer");
        Ok(())
    }
}

fn find(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    match search_path {
        Some(paths) => which::which_in(name, Some(paths), ".").ok(),
        None => which::which(name).ok(),
    }
}

/// Only `http://` and `https://` URLs with something after the scheme are
/// handed to a browser.
pub fn validate_url(url: &str) -> Result<()> {
    let valid = url.split_once("://").is_some_and(|(scheme, rest)| {
        (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
            && !rest.is_empty()
            && !rest.starts_with('/')
            && !url.chars().any(char::is_whitespace)
    });
    if !valid {
        exn::bail!(ErrorKind::InvalidUrl(url.to_string()));
    }
    Ok(())
}

/// Discover a browser and open `url` in it.
pub fn open_url(url: &str, configured: Option<&Path>) -> Result<Browser> {
    validate_url(url)?;
    let browser = Browser::discover(configured)?;
    browser.open(url)?;
    Ok(browser)
}
