use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::cli::clean::CleanArg;
use crate::cli::provision::ProvisionArg;

#[derive(Clone, Debug, Parser)]
#[command(name = "kiln", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Settings file, instead of the per-user one.
    #[arg(long, short, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output: -v for info, -vv for debug. RUST_LOG wins when set.
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "p", name = "provision", about = "Download and unpack the engine when stale")]
    Provision(ProvisionArg),
    #[command(alias = "st", name = "status", about = "Show the local install, without network access")]
    Status,
    #[command(alias = "pf", name = "platform", about = "Print the detected platform")]
    Platform,
    #[command(alias = "rm", name = "clean", about = "Remove the install tree and download leftovers")]
    Clean(CleanArg),
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        App::command().debug_assert();
    }

    #[test]
    fn provision_flags_parse() {
        let app = App::parse_from([
            "kiln",
            "-vv",
            "provision",
            "--engine-version",
            "116.0.27",
            "--keep-archive",
            "--no-progress",
        ]);
        assert_eq!(app.verbose, 2);
        let Commands::Provision(arg) = app.cmd else {
            panic!("expected provision");
        };
        assert_eq!(arg.engine_version.as_deref(), Some("116.0.27"));
        assert!(arg.keep_archive);
        assert!(arg.no_progress);
        assert!(!arg.skip_download);
    }

    #[test]
    fn aliases_and_global_config() {
        let app = App::parse_from(["kiln", "rm", "--keep-checksum", "--config", "kiln.toml"]);
        assert_eq!(app.config, Some(PathBuf::from("kiln.toml")));
        let Commands::Clean(arg) = app.cmd else {
            panic!("expected clean");
        };
        assert!(arg.keep_checksum);
        assert!(matches!(App::parse_from(["kiln", "st"]).cmd, Commands::Status));
    }
}
