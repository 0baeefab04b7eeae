use crate::cli::{Account, Cli, Command, Viewer};
use crate::error::{ErrorKind, Result};
use archeon_auth::{Authenticator, FirebaseAuth, Session};
use archeon_config::Config;
use archeon_launch::NativeViewer;
use archeon_storage::{FirebaseStore, LocalCache, Prefix};
use archeon_sync::{Outcome, SyncEvent};
use exn::ResultExt;
use inquire::Password;
use inquire::PasswordDisplayMode;
use std::path::PathBuf;

pub const PASSWORD_ENV: &str = "ARCHEON_PASSWORD";

pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Login(account) => login(&config, &account).await,
        Command::List(account) => list(&config, &account).await,
        Command::Sync(account) => sync(&config, &account).await,
        Command::Launch { account, viewer } => launch(&config, &account, viewer).await,
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::load(cli.config.as_deref()).map_err(config_error)?;
    config.validate().map_err(config_error)?;
    tracing::debug!(downloads = %config.downloads.display(), "Loaded configuration");
    Ok(config)
}

fn config_error(err: archeon_config::error::Error) -> crate::error::Error {
    let message = (*err).to_string();
    err.raise(ErrorKind::Config(message))
}

async fn login(config: &Config, account: &Account) -> Result<()> {
    let session = sign_in(config, account).await?;
    println!("Signed in as {} (user id {})", session.email(), session.user_id());
    session.logout();
    Ok(())
}

async fn list(config: &Config, account: &Account) -> Result<()> {
    let session = sign_in(config, account).await?;
    let (store, prefix, cache) = open_user_storage(config, &session)?;
    let entries = archeon_sync::inventory(&store, &prefix, &cache).await.map_err(sync_error)?;
    if entries.is_empty() {
        println!("You don't have any models stored yet. Upload models to your cloud storage to see them here.");
    }
    for (key, cached) in entries {
        let name = key.file_name().unwrap_or(key.as_str());
        println!("{} {name}", if cached { "[local]" } else { "[cloud]" });
    }
    session.logout();
    Ok(())
}

async fn sync(config: &Config, account: &Account) -> Result<()> {
    let session = sign_in(config, account).await?;
    let (store, prefix, cache) = open_user_storage(config, &session)?;
    let mut render = |event: &SyncEvent| {
        if let Some(line) = render_event(event) {
            println!("{line}");
        }
    };
    let report = archeon_sync::run(&store, &prefix, &cache, &config.viewer.assets, &mut render)
        .await
        .map_err(sync_error)?;
    for (key, outcome) in report.failures() {
        tracing::warn!(key = %key, outcome = %outcome, "Not synced");
    }
    session.logout();
    Ok(())
}

fn sync_error(err: archeon_sync::error::Error) -> crate::error::Error {
    let kind = match &*err {
        archeon_sync::error::ErrorKind::Listing => ErrorKind::Listing,
        archeon_sync::error::ErrorKind::Provision => ErrorKind::Provision,
        archeon_sync::error::ErrorKind::Cache => ErrorKind::Cache,
    };
    err.raise(kind)
}

async fn launch(config: &Config, account: &Account, viewer: Viewer) -> Result<()> {
    let session = sign_in(config, account).await?;
    match viewer {
        Viewer::Vr => {
            let dir = session.cache_dir(&downloads_root(config)?);
            let viewer = NativeViewer::locate(&dir, &config.viewer.executable).map_err(launch_error)?;
            viewer.launch().map_err(launch_error)?;
            println!("VR Model Viewer launched.");
        },
        Viewer::Web => {
            let browser =
                archeon_launch::open_url(&config.viewer.url, config.viewer.browser.as_deref()).map_err(launch_error)?;
            println!("Opened {} with {}", config.viewer.url, browser.program().display());
        },
    }
    session.logout();
    Ok(())
}

fn launch_error(err: archeon_launch::error::Error) -> crate::error::Error {
    let message = (*err).to_string();
    err.raise(ErrorKind::Launch(message))
}

async fn sign_in(config: &Config, account: &Account) -> Result<Session> {
    let password = read_password().await?;
    let auth = FirebaseAuth::new(&config.firebase.auth_endpoint, &config.firebase.api_key).map_err(auth_error)?;
    let session = auth.sign_in(&account.email, &password).await.map_err(auth_error)?;
    tracing::debug!(session = ?session, "Signed in");
    Ok(session)
}

fn auth_error(err: archeon_auth::error::Error) -> crate::error::Error {
    let message = err.user_message();
    err.raise(ErrorKind::Auth(message))
}

/// `ARCHEON_PASSWORD` if set, otherwise a masked prompt on the terminal.
async fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    let answer = tokio::task::spawn_blocking(|| password_prompt().prompt()).await.or_raise(|| ErrorKind::Password)?;
    answer.or_raise(|| ErrorKind::Password)
}

fn password_prompt() -> Password<'static> {
    Password::new("Password:").with_display_mode(PasswordDisplayMode::Masked).without_confirmation()
}

fn downloads_root(config: &Config) -> Result<PathBuf> {
    std::path::absolute(&config.downloads).or_raise(|| ErrorKind::Cache)
}

fn open_user_storage(config: &Config, session: &Session) -> Result<(FirebaseStore, Prefix, LocalCache)> {
    let store = FirebaseStore::new(
        &config.firebase.storage_endpoint,
        &config.firebase.storage_bucket,
        session.id_token(),
    )
    .or_raise(|| ErrorKind::Storage)?;
    let prefix = Prefix::new(session.model_prefix()).or_raise(|| ErrorKind::Storage)?;
    let cache = LocalCache::open(session.cache_dir(&downloads_root(config)?)).or_raise(|| ErrorKind::Cache)?;
    Ok((store, prefix, cache))
}

/// One line of progress output per event, if the event deserves one.
pub fn render_event(event: &SyncEvent) -> Option<String> {
    match event {
        SyncEvent::Started { total: 0 } | SyncEvent::Processing { .. } => None,
        SyncEvent::Started { total } => Some(format!("Syncing {total} model(s)")),
        SyncEvent::Finished { key, outcome, progress } => {
            let name = key.file_name().unwrap_or(key.as_str());
            let status = match outcome {
                Outcome::Downloaded { .. } => format!("Downloaded {name}"),
                Outcome::Skipped => format!("{name} already present, skipping"),
                Outcome::Failed { .. } => format!("Failed to download {name}"),
            };
            Some(format!("[{progress}] {status}"))
        },
        SyncEvent::Complete(report) if report.is_empty() => Some("No files to sync.".to_string()),
        SyncEvent::Complete(report) => Some(format!(
            "Sync finished: {} downloaded, {} skipped, {} failed",
            report.downloaded(),
            report.skipped(),
            report.failed()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archeon_storage::ObjectKey;
    use archeon_sync::{Progress, SyncReport};
    use rstest::rstest;

    fn finished(outcome: Outcome) -> SyncEvent {
        SyncEvent::Finished {
            key: ObjectKey::new("models/u1/a.gs"),
            outcome,
            progress: Progress { processed: 1, total: 2 },
        }
    }

    #[rstest]
    #[case(SyncEvent::Started { total: 0 }, None)]
    #[case(SyncEvent::Started { total: 2 }, Some("Syncing 2 model(s)"))]
    #[case(finished(Outcome::Downloaded { bytes: 5 }), Some("[1/2] Downloaded a.gs"))]
    #[case(finished(Outcome::Skipped), Some("[1/2] a.gs already present, skipping"))]
    #[case(finished(Outcome::Failed { reason: "HTTP 500".into() }), Some("[1/2] Failed to download a.gs"))]
    #[case(SyncEvent::Complete(SyncReport::default()), Some("No files to sync."))]
    fn test_render_event(#[case] event: SyncEvent, #[case] expected: Option<&str>) {
        assert_eq!(render_event(&event).as_deref(), expected);
    }

    #[test]
    fn test_password_prompt_is_masked() {
        let prompt = password_prompt();
        assert!(matches!(prompt.display_mode, PasswordDisplayMode::Masked));
        assert!(!prompt.enable_confirmation);
    }

    #[rstest]
    #[case(archeon_sync::error::ErrorKind::Listing, "Could not fetch your models. Please try again later.")]
    #[case(
        archeon_sync::error::ErrorKind::Provision,
        "Could not copy the viewer files into your model directory."
    )]
    #[case(archeon_sync::error::ErrorKind::Cache, "Could not prepare your local model directory.")]
    fn test_sync_error_message(#[case] kind: archeon_sync::error::ErrorKind, #[case] expected: &str) {
        let err = sync_error(exn::Exn::from(kind));
        assert_eq!((*err).to_string(), expected);
    }

    #[rstest]
    #[case(
        archeon_launch::error::ErrorKind::ExecutableNotFound(PathBuf::from("/d/u1/ArcheonViewer.exe")),
        "Failed to launch viewer: viewer executable not found at /d/u1/ArcheonViewer.exe; sync your files first"
    )]
    #[case(
        archeon_launch::error::ErrorKind::BrowserNotFound,
        "Failed to launch viewer: no web browser detected on your system"
    )]
    #[case(
        archeon_launch::error::ErrorKind::InvalidUrl("file:///x".to_string()),
        "Failed to launch viewer: not an http(s) URL: file:///x"
    )]
    #[case(
        archeon_launch::error::ErrorKind::Spawn(PathBuf::from("/usr/bin/firefox")),
        "Failed to launch viewer: could not start /usr/bin/firefox"
    )]
    fn test_launch_error_message(#[case] kind: archeon_launch::error::ErrorKind, #[case] expected: &str) {
        let err = launch_error(exn::Exn::from(kind));
        assert_eq!((*err).to_string(), expected);
    }

    #[rstest]
    #[case(archeon_auth::error::ErrorKind::InvalidCredentials, "Invalid email or password. Please try again.")]
    #[case(
        archeon_auth::error::ErrorKind::AccountDisabled,
        "This account has been disabled. Please contact support."
    )]
    #[case(
        archeon_auth::error::ErrorKind::TooManyAttempts,
        "Too many failed attempts. Please try again later."
    )]
    #[case(
        archeon_auth::error::ErrorKind::Network("timed out".to_string()),
        "Network error. Please check your internet connection."
    )]
    #[case(archeon_auth::error::ErrorKind::Server("HTTP 503".to_string()), "Server error. Please try again later.")]
    #[case(
        archeon_auth::error::ErrorKind::Rejected("PROJECT_NOT_FOUND".to_string()),
        "An unexpected error occurred: PROJECT_NOT_FOUND"
    )]
    #[case(
        archeon_auth::error::ErrorKind::InvalidEndpoint("::".to_string()),
        "The authentication service is misconfigured."
    )]
    fn test_auth_error_message(#[case] kind: archeon_auth::error::ErrorKind, #[case] expected: &str) {
        let err = auth_error(exn::Exn::from(kind));
        assert_eq!((*err).to_string(), expected);
    }
}
