use std::env;
use std::path::PathBuf;

pub fn user_home() -> Option<PathBuf> {
    home::home_dir()
}

pub fn user_config() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var_os("APPDATA").map(PathBuf::from)
    }
    #[cfg(target_os = "macos")]
    {
        user_home().map(|p| p.join("Library/Application Support"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| user_home().map(|p| p.join(".config")))
    }
}

pub fn user_data() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var_os("LOCALAPPDATA").map(PathBuf::from)
    }
    #[cfg(target_os = "macos")]
    {
        user_home().map(|p| p.join("Library/Application Support"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| user_home().map(|p| p.join(".local/share")))
    }
}

/// Default install root: `<data dir>/kiln/engine`, or `./kiln-engine` when
/// the user has no data directory.
pub fn default_install_root() -> PathBuf {
    user_data()
        .map(|p| p.join("kiln").join("engine"))
        .unwrap_or_else(|| PathBuf::from("kiln-engine"))
}

/// Default settings file: `<config dir>/kiln/settings.toml`.
pub fn default_settings_file() -> Option<PathBuf> {
    user_config().map(|p| p.join("kiln").join("settings.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_home_returns_optional() {
        let home = user_home();
        assert!(home.is_none() || home.unwrap().to_string_lossy().len() > 0);
    }

    #[test]
    fn test_default_install_root_ends_with_engine_dir() {
        let root = default_install_root();
        assert!(root.ends_with("kiln/engine") || root.ends_with("kiln-engine"));
    }

    #[test]
    fn test_default_settings_file_name() {
        if let Some(path) = default_settings_file() {
            assert!(path.ends_with("kiln/settings.toml"));
        }
    }
}
