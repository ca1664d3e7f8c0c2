//! Scan profile management.
//!
//! Profiles save a port list and scan settings under a name. A few built-in
//! profiles are always available; user profiles live as JSON files and may
//! shadow a built-in of the same name.

use crate::error::{ConfigError, ProfileError, ProfileResult};
use crate::scanner::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_MS};
use crate::types::PortSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::settings::Paths;

/// A saved scan profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name (used as identifier).
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Port specification string.
    pub ports: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub port_concurrency: Option<usize>,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub banner: bool,
    /// Probes per second, 0 for unlimited.
    #[serde(default)]
    pub rate_limit: u32,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Profile {
    pub fn new(name: impl Into<String>, ports: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            ports: ports.into(),
            concurrency: default_concurrency(),
            port_concurrency: None,
            timeout_ms: default_timeout(),
            banner: false,
            rate_limit: 0,
        }
    }

    pub fn validate(&self) -> ProfileResult<()> {
        if self.name.is_empty() {
            return Err(ProfileError::InvalidName("name cannot be empty".to_string()));
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ProfileError::InvalidName(
                "name can only contain alphanumeric characters, hyphens, and underscores"
                    .to_string(),
            ));
        }

        let spec: PortSpec = self.ports.parse()?;
        if spec.is_empty() {
            return Err(ProfileError::Invalid("profile has no ports".to_string()));
        }
        if let Some(max) = spec.max_port().filter(|&p| p > u32::from(u16::MAX)) {
            return Err(ProfileError::Invalid(format!("port {} is out of range", max)));
        }
        if self.concurrency == 0 || self.timeout_ms == 0 {
            return Err(ProfileError::Invalid(
                "concurrency and timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Built-in profile presets.
impl Profile {
    /// Common service ports on a single host.
    pub fn quick() -> Self {
        Self {
            description: "Most common service ports".to_string(),
            concurrency: 500,
            ..Self::new(
                "quick",
                "21,22,23,25,53,80,110,111,135,139,143,443,445,993,995,1723,3306,3389,5900,8080",
            )
        }
    }

    /// Web servers, with banners so Apache and nginx are identified.
    pub fn web() -> Self {
        Self {
            description: "Common web service ports with banner grabbing".to_string(),
            concurrency: 100,
            timeout_ms: 2000,
            banner: true,
            ..Self::new("web", "80,443,3000,5000,8000,8080,8443,8888,9000,9090")
        }
    }

    /// Database servers.
    pub fn database() -> Self {
        Self {
            description: "Common database ports with banner grabbing".to_string(),
            concurrency: 50,
            timeout_ms: 2000,
            banner: true,
            ..Self::new("database", "1433,1521,3306,5432,5984,6379,9042,11211,27017")
        }
    }

    /// Host discovery across a subnet: few ports, many hosts, split limits.
    pub fn subnet() -> Self {
        Self {
            description: "Sweep a subnet for hosts answering on SSH, HTTP or SMB".to_string(),
            concurrency: 256,
            port_concurrency: Some(4),
            timeout_ms: 500,
            ..Self::new("subnet", "22,80,443,445")
        }
    }

    pub fn builtins() -> Vec<Profile> {
        vec![Self::quick(), Self::web(), Self::database(), Self::subnet()]
    }

    pub fn is_builtin(name: &str) -> bool {
        Self::builtins().iter().any(|p| p.name == name)
    }
}

/// Manages profile storage and retrieval.
pub struct ProfileManager {
    profiles_dir: PathBuf,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileManager {
    /// Open the profiles directory under the default config location.
    pub fn new() -> ProfileResult<Self> {
        Self::with_dir(Paths::get()?.profiles_dir())
    }

    /// Open a specific profiles directory.
    pub fn with_dir(profiles_dir: PathBuf) -> ProfileResult<Self> {
        fs::create_dir_all(&profiles_dir).map_err(|e| {
            ProfileError::Config(ConfigError::WriteFailed {
                path: profiles_dir.clone(),
                reason: e.to_string(),
            })
        })?;

        let mut manager = Self {
            profiles_dir,
            profiles: BTreeMap::new(),
        };
        manager.load_all()?;
        Ok(manager)
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// All profiles ordered by name.
    pub fn list(&self) -> Vec<&Profile> {
        self.profiles.values().collect()
    }

    pub fn create(&mut self, profile: Profile) -> ProfileResult<()> {
        profile.validate()?;

        if self.profiles.contains_key(&profile.name) {
            return Err(ProfileError::AlreadyExists(profile.name));
        }

        self.save_profile(&profile)?;
        self.profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    /// Delete a user profile. Built-ins cannot be deleted.
    pub fn delete(&mut self, name: &str) -> ProfileResult<()> {
        if Profile::is_builtin(name) && !self.profile_file(name).exists() {
            return Err(ProfileError::InvalidName(
                "cannot delete built-in profile".to_string(),
            ));
        }
        if !self.profiles.contains_key(name) {
            return Err(ProfileError::NotFound(name.to_string()));
        }

        let file = self.profile_file(name);
        if file.exists() {
            fs::remove_file(&file).map_err(|e| ProfileError::SaveFailed(e.to_string()))?;
        }
        self.profiles.remove(name);

        // A deleted override uncovers the built-in again.
        if let Some(builtin) = Profile::builtins().into_iter().find(|p| p.name == name) {
            self.profiles.insert(builtin.name.clone(), builtin);
        }
        Ok(())
    }

    fn load_all(&mut self) -> ProfileResult<()> {
        for profile in Profile::builtins() {
            self.profiles.insert(profile.name.clone(), profile);
        }

        let entries = fs::read_dir(&self.profiles_dir)
            .map_err(|e| ProfileError::SaveFailed(e.to_string()))?;
        for entry in entries {
            let path = entry
                .map_err(|e| ProfileError::SaveFailed(e.to_string()))?
                .path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            match fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str::<Profile>(&content).ok())
            {
                Some(profile) => {
                    self.profiles.insert(profile.name.clone(), profile);
                }
                None => tracing::warn!(path = %path.display(), "skipping unreadable profile"),
            }
        }

        Ok(())
    }

    fn save_profile(&self, profile: &Profile) -> ProfileResult<()> {
        let content = serde_json::to_string_pretty(profile)
            .map_err(|e| ProfileError::SaveFailed(e.to_string()))?;
        fs::write(self.profile_file(&profile.name), content)
            .map_err(|e| ProfileError::SaveFailed(e.to_string()))
    }

    fn profile_file(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{}.json", name))
    }
}
