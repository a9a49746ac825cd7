//! Identity configuration from TOML (`[identity]` section)

use ragloop_domain::IdentityProfile;
use serde::{Deserialize, Serialize};

/// Raw identity configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileIdentityConfig {
    /// Model file the server was started with; the display name is derived from it
    pub model_path: Option<String>,
    /// Explicit display name, wins over `model_path`
    pub model_name: Option<String>,
    pub short_circuit: bool,
    /// Replaces the built-in list when set
    pub disallowed_names: Option<Vec<String>>,
}

impl Default for FileIdentityConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            model_name: None,
            short_circuit: true,
            disallowed_names: None,
        }
    }
}

impl FileIdentityConfig {
    pub fn to_profile(&self) -> IdentityProfile {
        let mut profile = match &self.model_path {
            Some(path) => IdentityProfile::from_model_path(path),
            None => IdentityProfile::default(),
        };
        if let Some(name) = self.model_name.as_deref().filter(|n| !n.trim().is_empty()) {
            profile = profile.with_model_name(name.trim());
        }
        if let Some(names) = &self.disallowed_names {
            profile.disallowed_names = names.clone();
        }
        profile.with_short_circuit(self.short_circuit)
    }
}
