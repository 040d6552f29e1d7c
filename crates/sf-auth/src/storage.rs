//! Profile persistence.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::SfConfig;
use crate::error::{Error, ErrorKind, Result};

/// Trait for profile storage implementations.
///
/// Stores hold only the file layer of a profile; defaults and environment
/// overrides are never written.
pub trait ProfileStore: Send + Sync {
    /// Load a profile, `None` if it was never saved.
    fn load(&self, profile: &str) -> Result<Option<SfConfig>>;

    /// Save a profile.
    ///
    /// Read-only stores fail with [`ErrorKind::ReadOnly`] carrying the
    /// rendered content so the caller can show it to the user.
    fn save(&self, profile: &str, config: &SfConfig) -> Result<()>;

    /// Whether [`ProfileStore::save`] is refused.
    fn is_read_only(&self) -> bool {
        false
    }
}

/// JSON files under a directory, one per profile.
///
/// The default directory is `<config dir>/sftools` (for example
/// `~/.config/sftools` on Linux).
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    base_path: PathBuf,
    read_only: bool,
}

impl FileProfileStore {
    /// Create a store at the default location.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(default_profile_dir()?))
    }

    /// Create a store rooted at a custom directory.
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            base_path: path.as_ref().to_path_buf(),
            read_only: false,
        }
    }

    /// Refuse all writes to this store.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Directory holding the profile files.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File path for a profile; the name is reduced to a safe file stem.
    pub fn profile_path(&self, profile: &str) -> PathBuf {
        let safe_key = profile
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();

        self.base_path.join(format!("{}.json", safe_key))
    }

    /// Profiles saved in this store.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().to_string());
                }
            }
        }
        names.sort();

        Ok(names)
    }
}

impl ProfileStore for FileProfileStore {
    fn load(&self, profile: &str) -> Result<Option<SfConfig>> {
        let path = self.profile_path(profile);
        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)?;
        let stored: StoredProfile = serde_json::from_str(&json)?;
        debug!(path = %path.display(), saved_at = %stored.saved_at, "Loaded profile");

        Ok(Some(stored.profile))
    }

    fn save(&self, profile: &str, config: &SfConfig) -> Result<()> {
        if self.read_only {
            return Err(Error::new(ErrorKind::ReadOnly(config.render()?)));
        }

        std::fs::create_dir_all(&self.base_path)?;

        let path = self.profile_path(profile);
        let stored = StoredProfile {
            profile: config.clone(),
            saved_at: chrono::Utc::now(),
        };
        std::fs::write(&path, serde_json::to_string_pretty(&stored)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        debug!(path = %path.display(), "Saved profile");
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

/// Profile with storage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredProfile {
    profile: SfConfig,
    saved_at: chrono::DateTime<chrono::Utc>,
}

/// Get the default profile directory.
pub fn default_profile_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        Error::new(ErrorKind::Config(
            "Could not find user config directory".to_string(),
        ))
    })?;

    Ok(base.join("sftools"))
}
