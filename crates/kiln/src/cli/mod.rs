use std::error::Error;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use kiln_config::Settings;
use kiln_platform::InstallLayout;

use crate::cli::app::{App, Commands};

pub mod app;
pub mod clean;
pub mod provision;
pub mod status;

pub fn run(app: App) -> Result<ExitCode> {
    let config = app.config.as_deref();
    match app.cmd {
        Commands::Provision(arg) => provision::provision(config, arg),
        Commands::Status => status::status(config).map(|_| ExitCode::SUCCESS),
        Commands::Platform => {
            status::platform();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Clean(arg) => clean::clean(config, arg).map(|_| ExitCode::SUCCESS),
    }
}

pub(crate) fn load_settings(config: Option<&Path>) -> Result<Settings> {
    Settings::load(config).with_context(|| match config {
        Some(path) => format!("could not load settings from {}", path.display()),
        None => "could not load settings".to_string(),
    })
}

pub(crate) fn local_layout(settings: &Settings) -> InstallLayout {
    InstallLayout::new(settings.install_root(), kiln_platform::resolve())
}

/// The error and any causes its message does not already spell out.
pub fn describe(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
