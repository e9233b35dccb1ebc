use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{DomainError, UserProfile};
use crate::ports::ProfileStore;

/// JSON file profile store under the application data directory.
pub struct JsonProfileStore {
    path: PathBuf,
}

impl JsonProfileStore {
    /// Store the profile as `profile.json` inside the given directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join("profile.json"),
        }
    }
}

impl ProfileStore for JsonProfileStore {
    fn load(&self) -> Result<Option<UserProfile>, DomainError> {
        if !self.path.exists() {
            return Ok(None);
        }
        debug!(path = ?self.path, "Loading profile");
        let content = fs::read_to_string(&self.path)?;
        let profile: UserProfile = serde_json::from_str(&content)
            .map_err(|e| DomainError::Profile(format!("Malformed profile file: {}", e)))?;
        Ok(Some(profile))
    }

    fn save(&self, profile: &UserProfile) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(profile)?;
        fs::write(&self.path, content)?;
        info!(path = ?self.path, "Profile saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), DomainError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!(path = ?self.path, "Profile cleared");
        }
        Ok(())
    }
}
