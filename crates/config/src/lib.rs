//! Layered configuration.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. built-in defaults;
//! 2. `archeon.{toml,yaml,yml,json}` in the platform config directory;
//! 3. the same files in the working directory;
//! 4. `firebase_config.json` (the Firebase web-app snippet with camelCase
//!    keys such as `apiKey` and `storageBucket`) from either directory,
//!    merged into the `firebase` section;
//! 5. a file named explicitly (e.g. `--config`);
//! 6. `ARCHEON_*` environment variables, `__` separating nested keys
//!    (`ARCHEON_FIREBASE__API_KEY`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "ARCHEON_";
pub const FILE_STEM: &str = "archeon";
pub const FIREBASE_WEB_CONFIG: &str = "firebase_config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub firebase: FirebaseConfig,
    /// Root of the per-user download directories. Relative paths resolve
    /// against the working directory.
    pub downloads: PathBuf,
    pub viewer: ViewerConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            firebase: FirebaseConfig::default(),
            downloads: PathBuf::from("downloads"),
            viewer: ViewerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub storage_bucket: String,
    /// Identity Toolkit base URL.
    pub auth_endpoint: String,
    /// Firebase Storage REST base URL.
    pub storage_endpoint: String,
}
impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            storage_bucket: String::new(),
            auth_endpoint: "https://identitytoolkit.googleapis.com/v1".to_string(),
            storage_endpoint: "https://firebasestorage.googleapis.com/v0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Bundled viewer support files, copied into every user directory.
    pub assets: PathBuf,
    /// Native viewer, relative to the user directory.
    pub executable: PathBuf,
    pub url: String,
    /// Browser executable (name on `PATH` or a path) for the web viewer.
    pub browser: Option<PathBuf>,
}
impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("viewer"),
            executable: PathBuf::from("ArcheonViewer.exe"),
            url: "http://127.0.0.1:8080/index.html".to_string(),
            browser: None,
        }
    }
}

impl Config {
    /// Load from the default locations.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut loader = Loader::new();
        if let Some(path) = explicit {
            loader = loader.with_file(path);
        }
        loader.load()
    }

    /// Reject settings without which nothing can work.
    pub fn validate(&self) -> Result<()> {
        if self.firebase.api_key.trim().is_empty() {
            exn::bail!(ErrorKind::Missing("firebase.api_key"));
        }
        if self.firebase.storage_bucket.trim().is_empty() {
            exn::bail!(ErrorKind::Missing("firebase.storage_bucket"));
        }
        Ok(())
    }
}

/// The subset of the Firebase web-app config we care about.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FirebaseWebConfig {
    #[serde(rename(deserialize = "apiKey"), skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(rename(deserialize = "storageBucket"), skip_serializing_if = "Option::is_none")]
    storage_bucket: Option<String>,
}

#[derive(Serialize)]
struct FirebaseOverlay {
    firebase: FirebaseWebConfig,
}

/// Builder over the configuration sources.
#[derive(Debug, Clone)]
pub struct Loader {
    user_dir: Option<PathBuf>,
    work_dir: PathBuf,
    file: Option<PathBuf>,
}
impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
impl Loader {
    pub fn new() -> Self {
        let user_dir = ProjectDirs::from("", "", FILE_STEM).map(|dirs| dirs.config_dir().to_path_buf());
        if user_dir.is_none() {
            tracing::debug!("No home directory; skipping user configuration");
        }
        Self {
            user_dir,
            work_dir: PathBuf::from("."),
            file: None,
        }
    }

    pub fn with_user_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_dir = dir;
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Assemble every source without extracting.
    pub fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let dirs: Vec<&Path> = self.user_dir.as_deref().into_iter().chain([self.work_dir.as_path()]).collect();

        for dir in &dirs {
            for ext in ["toml", "yaml", "yml", "json"] {
                let path = dir.join(format!("{FILE_STEM}.{ext}"));
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "Merging configuration file");
                    figment = merge_file(figment, &path)?;
                }
            }
        }

        for dir in &dirs {
            let path = dir.join(FIREBASE_WEB_CONFIG);
            if path.is_file() {
                let web: FirebaseWebConfig =
                    Figment::from(Json::file_exact(&path)).extract().or_raise(|| ErrorKind::Extract)?;
                tracing::debug!(path = %path.display(), "Merging Firebase web config");
                figment = figment.merge(Serialized::defaults(FirebaseOverlay { firebase: web }));
            }
        }

        if let Some(path) = &self.file {
            if !path.is_file() {
                exn::bail!(ErrorKind::FileNotFound(path.clone()));
            }
            tracing::debug!(path = %path.display(), "Merging explicit configuration file");
            figment = merge_file(figment, path)?;
        }

        // The password is read by the CLI directly and must never end up in
        // the config tree.
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["password"])))
    }

    pub fn load(&self) -> Result<Config> {
        self.figment()?.extract().or_raise(|| ErrorKind::Extract)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match ext.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
