// ABOUTME: Reads default GMP credentials from the INI-style gvm-tools config file.
// ABOUTME: Only the [Auth] section is consulted; keys are matched lowercase.

use super::ConfigError;
use ini::{Ini, ParseOption};
use std::path::{Path, PathBuf};

/// Path used when `-c` is given without a value.
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/gvm-tools.conf";

const AUTH_SECTION: &str = "Auth";

/// Credential defaults taken from the `[Auth]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthDefaults {
    pub gmp_username: Option<String>,
    pub gmp_password: Option<String>,
}

/// Expand a leading `~` to `$HOME`. Paths without one are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Values are taken literally: quotes and backslashes are part of the value.
fn literal_values() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    }
}

/// Load the `[Auth]` section of the config file at `path`.
pub fn load_auth_defaults(path: &Path) -> Result<AuthDefaults, ConfigError> {
    let path = expand_home(path);
    tracing::debug!("Loading GMP defaults from {}", path.display());

    let document = Ini::load_from_file_opt(&path, literal_values()).map_err(|e| ConfigError::Read {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let section = document
        .iter()
        .find(|(name, _)| name.is_some_and(|name| name.eq_ignore_ascii_case(AUTH_SECTION)))
        .map(|(_, properties)| properties)
        .ok_or(ConfigError::MissingSection {
            path: path.clone(),
            section: AUTH_SECTION,
        })?;

    let mut defaults = AuthDefaults::default();
    for (key, value) in section.iter() {
        let key = key.to_lowercase();
        match key.as_str() {
            "gmp_username" => defaults.gmp_username = Some(value.to_string()),
            "gmp_password" => defaults.gmp_password = Some(value.to_string()),
            other => tracing::debug!("Ignoring unknown [Auth] key {}", other),
        }
    }

    Ok(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_auth_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvm-tools.conf");
        fs::write(&path, "[Auth]\ngmp_username=alice\ngmp_password=secret\n").unwrap();

        let defaults = load_auth_defaults(&path).unwrap();
        assert_eq!(defaults.gmp_username.as_deref(), Some("alice"));
        assert_eq!(defaults.gmp_password.as_deref(), Some("secret"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvm-tools.conf");
        fs::write(&path, "[Auth]\ngmp_username=bob\ncolor=blue\n").unwrap();

        let defaults = load_auth_defaults(&path).unwrap();
        assert_eq!(defaults.gmp_username.as_deref(), Some("bob"));
        assert_eq!(defaults.gmp_password, None);
    }

    #[test]
    fn keys_are_lowercased() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvm-tools.conf");
        fs::write(&path, "[Auth]\nGMP_Username=dave\n").unwrap();

        let defaults = load_auth_defaults(&path).unwrap();
        assert_eq!(defaults.gmp_username.as_deref(), Some("dave"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_auth_defaults(&dir.path().join("nope.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn missing_section_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvm-tools.conf");
        fs::write(&path, "[Other]\nkey=value\n").unwrap();

        let err = load_auth_defaults(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { .. }));
        assert!(err.to_string().contains("No section: 'Auth'"));
    }

    #[test]
    fn tilde_expands_to_home() {
        temp_env::with_var("HOME", Some("/home/alice"), || {
            assert_eq!(
                expand_home(Path::new("~/.config/gvm-tools.conf")),
                PathBuf::from("/home/alice/.config/gvm-tools.conf")
            );
            assert_eq!(
                expand_home(Path::new("/etc/gvm-tools.conf")),
                PathBuf::from("/etc/gvm-tools.conf")
            );
        });
    }
}
