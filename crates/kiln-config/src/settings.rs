use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_MIRROR: &str = "https://mcef-download.cinemamod.com";
pub const DEFAULT_PREFIX: &str = "java-cef-builds";
pub const DEFAULT_SCHEME: &str = "mod";
pub const ENV_PREFIX: &str = "KILN_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub download_mirror: String,
    pub remote_prefix: String,
    pub engine_version: Option<String>,
    /// Overrides the engine's default user agent.
    pub user_agent: Option<String>,
    /// Never download, even when the install is stale.
    pub skip_download: bool,
    pub delete_archive: bool,
    pub install_root: Option<PathBuf>,
    /// Passed to the engine after the built-in switches.
    pub extra_switches: Vec<String>,
    pub scheme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_mirror: DEFAULT_MIRROR.to_string(),
            remote_prefix: DEFAULT_PREFIX.to_string(),
            engine_version: None,
            user_agent: None,
            skip_download: false,
            delete_archive: true,
            install_root: None,
            extra_switches: Vec::new(),
            scheme: DEFAULT_SCHEME.to_string(),
        }
    }
}

impl Settings {
    /// Layered provider: defaults, then `file` (or the per-user settings
    /// file), then the environment.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        let file = file
            .map(Path::to_path_buf)
            .or_else(kiln_platform::dir::default_settings_file);
        if let Some(file) = file {
            debug!(path = %file.display(), "settings file");
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(file: Option<&Path>) -> Result<Self> {
        let settings: Settings = Self::figment(file).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let mirror = self.download_mirror.trim();
        if !(mirror.starts_with("http://") || mirror.starts_with("https://")) {
            return Err(Error::Invalid {
                field: "download_mirror",
                reason: format!("'{mirror}' is not an http(s) URL"),
            });
        }
        let scheme_ok = self.scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && self
                .scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(Error::Invalid {
                field: "scheme",
                reason: format!("'{}' is not a valid URL scheme", self.scheme),
            });
        }
        Ok(())
    }

    /// The configured engine version; there is no built-in default.
    pub fn engine_version(&self) -> Result<&str> {
        self.engine_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(Error::MissingVersion)
    }

    pub fn install_root(&self) -> PathBuf {
        self.install_root
            .clone()
            .unwrap_or_else(kiln_platform::dir::default_install_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.download_mirror, DEFAULT_MIRROR);
        assert_eq!(settings.scheme, "mod");
        assert!(settings.delete_archive);
        assert!(!settings.skip_download);
        assert!(matches!(settings.engine_version(), Err(Error::MissingVersion)));
    }

    #[test]
    fn file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "settings.toml",
                r#"
                    engine_version = "116.0.19"
                    download_mirror = "https://mirror.example/"
                    extra_switches = ["--disable-gpu"]
                    delete_archive = false
                "#,
            )?;
            jail.set_env("KILN_SKIP_DOWNLOAD", "true");
            jail.set_env("KILN_ENGINE_VERSION", "117.0.0");

            let settings = Settings::load(Some(Path::new("settings.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(settings.engine_version().map_err(|e| e.to_string())?, "117.0.0");
            assert_eq!(settings.download_mirror, "https://mirror.example/");
            assert_eq!(settings.extra_switches, vec!["--disable-gpu".to_string()]);
            assert!(!settings.delete_archive);
            assert!(settings.skip_download);
            assert_eq!(settings.remote_prefix, DEFAULT_PREFIX);
            Ok(())
        });
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        Jail::expect_with(|_| {
            let settings =
                Settings::load(Some(Path::new("absent.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(settings, Settings::default());
            Ok(())
        });
    }

    #[test]
    fn bad_scheme_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("settings.toml", r#"scheme = "9 lives""#)?;
            let err = Settings::load(Some(Path::new("settings.toml"))).unwrap_err();
            assert!(matches!(err, Error::Invalid { field: "scheme", .. }));
            Ok(())
        });
    }

    #[test]
    fn blank_version_counts_as_missing() {
        let settings = Settings {
            engine_version: Some("  ".into()),
            ..Settings::default()
        };
        assert!(matches!(settings.engine_version(), Err(Error::MissingVersion)));
    }

    #[test]
    fn explicit_install_root_wins() {
        let settings = Settings {
            install_root: Some(PathBuf::from("/srv/kiln")),
            ..Settings::default()
        };
        assert_eq!(settings.install_root(), PathBuf::from("/srv/kiln"));
    }
}
