use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sync your Archeon models from the cloud and launch the viewer.
#[derive(Debug, Parser)]
#[command(name = "archeon", version, about)]
pub struct Cli {
    /// Configuration file (toml, yaml or json) merged over the defaults
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// More logging (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check your credentials
    Login(Account),
    /// List your models, marking the ones already downloaded
    List(Account),
    /// Download missing models and refresh the viewer files
    Sync(Account),
    /// Start a viewer on your downloaded models
    Launch {
        #[command(flatten)]
        account: Account,
        #[arg(value_enum)]
        viewer: Viewer,
    },
}

/// The password is read from `ARCHEON_PASSWORD`, or from standard input.
#[derive(Debug, Args)]
pub struct Account {
    #[arg(long, env = "ARCHEON_EMAIL")]
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Viewer {
    /// The native VR viewer
    Vr,
    /// The web viewer, in a browser
    Web,
}

impl Cli {
    /// Default log level for the given `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["archeon", "sync", "--email", "me@example.com"], "warn")]
    #[case(&["archeon", "-v", "sync", "--email", "me@example.com"], "info")]
    #[case(&["archeon", "sync", "-vv", "--email", "me@example.com"], "debug")]
    #[case(&["archeon", "-vvvv", "list", "--email", "me@example.com"], "trace")]
    fn test_log_level(#[case] args: &[&str], #[case] expected: &str) {
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.log_level(), expected);
    }

    #[test]
    fn test_launch() {
        let cli = Cli::try_parse_from(["archeon", "--config", "a.toml", "launch", "--email", "e@x.io", "web"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        match cli.command {
            Command::Launch { account, viewer } => {
                assert_eq!(account.email, "e@x.io");
                assert_eq!(viewer, Viewer::Web);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[rstest]
    #[case(&["archeon", "launch", "--email", "e@x.io", "desktop"])]
    #[case(&["archeon", "launch", "--email", "e@x.io"])]
    #[case(&["archeon", "teleport"])]
    fn test_invalid(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }
}
