use log::warn;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Credential that authorizes the owner-only `sync` command
pub const OWNER_TOKEN_VAR: &str = "CALLDESK_OWNER_TOKEN";

// Names of optional environment variables
pub const OPTIONAL_ENV_VARS: &[&str] = &[LOG_LEVEL_VAR, "CALLDESK_CONFIG_PATH"];

/// Selects the default log filter; `RUST_LOG` still takes precedence
pub const LOG_LEVEL_VAR: &str = "CALLDESK_LOG_LEVEL";

/// What happened while looking for a `.env` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFile {
    Loaded(PathBuf),
    /// Nothing was found; a template was written at this path
    TemplateCreated(PathBuf),
}

/// Load `.env` from the working directory or one of its parents.
///
/// Runs before the logger is initialised so the file can set
/// `CALLDESK_LOG_LEVEL`; the caller logs the returned outcome.
pub fn load_env_file() -> io::Result<EnvFile> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(EnvFile::Loaded(path)),
        Err(e) if e.not_found() => {
            let path = PathBuf::from(".env");
            create_env_template(&path)?;
            Ok(EnvFile::TemplateCreated(path))
        }
        Err(e) => Err(io::Error::new(io::ErrorKind::InvalidData, e.to_string())),
    }
}

/// Load a specific `.env` file, writing a template there when it is absent.
pub fn load_env_file_from(env_path: &Path) -> io::Result<EnvFile> {
    if !env_path.exists() {
        create_env_template(env_path)?;
        return Ok(EnvFile::TemplateCreated(env_path.to_path_buf()));
    }
    dotenvy::from_path(env_path)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    Ok(EnvFile::Loaded(env_path.to_path_buf()))
}

/// Default log filter from the environment, `info` when unset.
pub fn log_level() -> String {
    env::var(LOG_LEVEL_VAR)
        .ok()
        .map(|level| level.trim().to_string())
        .filter(|level| !level.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

fn create_env_template(env_path: &Path) -> io::Result<()> {
    // Don't overwrite existing .env file
    if env_path.exists() {
        return Ok(());
    }

    let mut file = File::create(env_path)?;
    writeln!(file, "{}=", OWNER_TOKEN_VAR)?;
    for var in OPTIONAL_ENV_VARS {
        writeln!(file, "# {}=", var)?;
    }

    Ok(())
}

/// Owner credential from the environment, if one is set.
pub fn owner_token() -> Option<SecretString> {
    match env::var(OWNER_TOKEN_VAR) {
        Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value.trim().to_string())),
        _ => {
            warn!("{} is not set; the sync command is disabled over the API", OWNER_TOKEN_VAR);
            None
        }
    }
}

/// Compare a presented credential against the owner token.
pub fn is_owner_token(expected: Option<&SecretString>, presented: Option<&str>) -> bool {
    match (expected, presented) {
        (Some(expected), Some(presented)) => {
            let expected = expected.expose_secret().as_bytes();
            let presented = presented.trim().as_bytes();
            expected.len() == presented.len()
                && expected.iter().zip(presented).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn owner_token_must_match_exactly() {
        let token = SecretString::from("s3cret".to_string());
        assert!(is_owner_token(Some(&token), Some("s3cret")));
        assert!(is_owner_token(Some(&token), Some(" s3cret ")));
        assert!(!is_owner_token(Some(&token), Some("s3cre")));
        assert!(!is_owner_token(Some(&token), Some("S3CRET")));
        assert!(!is_owner_token(Some(&token), None));
        assert!(!is_owner_token(None, Some("s3cret")));
    }

    #[test]
    fn template_lists_known_variables() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(".env");
        create_env_template(&path)?;
        let content = std::fs::read_to_string(&path)?;
        assert!(content.starts_with("CALLDESK_OWNER_TOKEN="));
        assert!(content.contains("# CALLDESK_LOG_LEVEL="));

        // Existing files are left alone
        std::fs::write(&path, "KEEP=1\n")?;
        create_env_template(&path)?;
        assert_eq!(std::fs::read_to_string(&path)?, "KEEP=1\n");
        Ok(())
    }

    #[test]
    fn log_level_comes_from_the_env_file() -> io::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(".env");
        env::remove_var(LOG_LEVEL_VAR);

        assert_eq!(load_env_file_from(&path)?, EnvFile::TemplateCreated(path.clone()));

        std::fs::write(&path, format!("{}=debug\n", LOG_LEVEL_VAR))?;
        assert_eq!(load_env_file_from(&path)?, EnvFile::Loaded(path.clone()));
        assert_eq!(log_level(), "debug");

        env::remove_var(LOG_LEVEL_VAR);
        assert_eq!(log_level(), "info");
        Ok(())
    }
}
