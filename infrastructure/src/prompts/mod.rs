//! Prompt override directory
//!
//! Loads `<dir>/<name>.txt` for every [`PromptKey`]. Missing or blank files
//! keep the text already in the catalog.

use ragloop_domain::{PromptCatalog, PromptKey};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A directory of prompt text files
#[derive(Debug, Clone)]
pub struct PromptDirectory {
    dir: PathBuf,
}

impl PromptDirectory {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: PromptKey) -> PathBuf {
        self.dir.join(format!("{}.txt", key.as_str()))
    }

    /// Override the texts in `catalog` with the files present in the directory.
    pub fn apply(&self, mut catalog: PromptCatalog) -> PromptCatalog {
        if !self.dir.is_dir() {
            warn!(
                "Prompt directory {} not found, using built-in prompts",
                self.dir.display()
            );
            return catalog;
        }

        for key in PromptKey::ALL {
            let path = self.path_for(key);
            match fs::read_to_string(&path) {
                Ok(text) if text.trim().is_empty() => {
                    warn!("Ignoring empty prompt file {}", path.display());
                }
                Ok(text) => {
                    debug!("Loaded prompt '{}' from {}", key.as_str(), path.display());
                    catalog.set(key, text);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("No override for prompt '{}'", key.as_str());
                }
                Err(e) => {
                    warn!("Could not read prompt file {}: {}", path.display(), e);
                }
            }
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_present_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("system.txt"), "  새 시스템 프롬프트  \n").unwrap();
        fs::write(dir.path().join("timeout.txt"), "\n").unwrap();

        let catalog = PromptDirectory::new(dir.path()).apply(PromptCatalog::default());
        let defaults = PromptCatalog::default();
        assert_eq!(catalog.system, "새 시스템 프롬프트");
        assert_eq!(catalog.timeout, defaults.timeout);
        assert_eq!(catalog.casual_response, defaults.casual_response);
    }

    #[test]
    fn test_missing_directory_keeps_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog =
            PromptDirectory::new(dir.path().join("absent")).apply(PromptCatalog::default());
        assert_eq!(catalog, PromptCatalog::default());
    }

    #[test]
    fn test_path_for_uses_key_stem() {
        let dir = PromptDirectory::new("/etc/ragloop/prompts");
        assert_eq!(
            dir.path_for(PromptKey::GenerationError),
            PathBuf::from("/etc/ragloop/prompts/generation_error.txt")
        );
    }
}
