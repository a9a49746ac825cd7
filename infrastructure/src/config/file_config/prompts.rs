//! Prompt configuration from TOML (`[prompts]` section)

use ragloop_domain::{PromptCatalog, PromptKey};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw prompt configuration from TOML
///
/// Precedence, lowest to highest: built-in text, `<dir>/<name>.txt`, inline value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePromptsConfig {
    /// Directory holding `system.txt`, `casual_response.txt`, ...
    pub dir: Option<PathBuf>,
    pub system: Option<String>,
    pub casual_response: Option<String>,
    pub out_of_scope: Option<String>,
    pub generation_error: Option<String>,
    pub timeout: Option<String>,
}

impl FilePromptsConfig {
    fn inline(&self, key: PromptKey) -> Option<&str> {
        match key {
            PromptKey::System => self.system.as_deref(),
            PromptKey::CasualResponse => self.casual_response.as_deref(),
            PromptKey::OutOfScope => self.out_of_scope.as_deref(),
            PromptKey::GenerationError => self.generation_error.as_deref(),
            PromptKey::Timeout => self.timeout.as_deref(),
        }
    }

    /// Apply the inline values on top of `catalog`.
    pub fn apply_inline(&self, mut catalog: PromptCatalog) -> PromptCatalog {
        for key in PromptKey::ALL {
            if let Some(text) = self.inline(key) {
                catalog.set(key, text);
            }
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_overrides() {
        let toml_str = r#"
casual_response = "반갑습니다!"
timeout = "   "
"#;
        let config: FilePromptsConfig = toml::from_str(toml_str).unwrap();
        let catalog = config.apply_inline(PromptCatalog::default());
        assert_eq!(catalog.casual_response, "반갑습니다!");
        // blank values keep the built-in text
        assert_eq!(catalog.timeout, PromptCatalog::default().timeout);
    }
}
