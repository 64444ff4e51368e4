//! Credential file storage.
//!
//! Loads and saves the signed-in principal from
//! ~/.config/securibot/credentials.json.

use crate::paths::SecuribotPaths;
use securibot_core::Result;
use securibot_core::config::CredentialsConfig;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const ENV_ID_TOKEN: &str = "SECURIBOT_ID_TOKEN";

/// Storage for the credentials file.
///
/// A missing file means nobody is signed in. The file is plaintext JSON; on
/// Unix it is written with mode 600.
pub struct CredentialStorage {
    path: PathBuf,
}

impl CredentialStorage {
    /// Creates a CredentialStorage with the default path.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(SecuribotPaths::credentials_file()?))
    }

    /// Creates a CredentialStorage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads stored credentials, `Ok(None)` when the file does not exist.
    pub fn load(&self) -> Result<Option<CredentialsConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Loads stored credentials and applies the `SECURIBOT_ID_TOKEN` override.
    pub fn load_with_env(&self) -> Result<Option<CredentialsConfig>> {
        let mut credentials = self.load()?;
        if let Some(creds) = credentials.as_mut()
            && let Ok(token) = std::env::var(ENV_ID_TOKEN)
            && !token.trim().is_empty()
        {
            creds.id_token = Some(token);
        }
        Ok(credentials)
    }

    /// Writes credentials, creating the parent directory if needed.
    pub fn save(&self, credentials: &CredentialsConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(credentials)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // `mode` only applies on creation; tighten a file left by an older save.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(content.as_bytes())?;

        tracing::info!(path = %self.path.display(), "Credentials saved");
        Ok(())
    }

    /// Removes the credentials file. Succeeds if it did not exist.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_means_signed_out() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CredentialStorage::with_path(temp_dir.path().join("credentials.json"));
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_save_load_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CredentialStorage::with_path(temp_dir.path().join("nested/credentials.json"));
        let creds = CredentialsConfig {
            uid: "uid-1".to_string(),
            email: Some("user@example.test".to_string()),
            display_name: Some("User".to_string()),
            id_token: Some("token".to_string()),
        };

        storage.save(&creds).unwrap();
        assert_eq!(storage.load().unwrap(), Some(creds));

        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
        storage.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let storage = CredentialStorage::with_path(path.clone());
        storage.save(&CredentialsConfig {
            uid: "uid-1".to_string(),
            id_token: Some("secret".to_string()),
            ..CredentialsConfig::default()
        })
        .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(storage.load().unwrap().unwrap().id_token.as_deref(), Some("secret"));

        let fresh = CredentialStorage::with_path(temp_dir.path().join("fresh.json"));
        fresh.save(&CredentialsConfig::default()).unwrap();
        let mode = fs::metadata(fresh.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_minimal_credentials_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.json");
        fs::write(&path, r#"{"uid": "only-uid"}"#).unwrap();

        let creds = CredentialStorage::with_path(path).load().unwrap().unwrap();
        assert_eq!(creds.uid, "only-uid");
        assert_eq!(creds.id_token, None);
    }
}
