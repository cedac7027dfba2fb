//! Module directory layout: metadata, configuration and message files.
//!
//! ```text
//! <root>/module.json
//! <root>/config/config.json
//! <root>/messages/<lang>.json
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    config::ModuleConfig,
    error::{LoginError, LoginResultOf},
    types::ModuleInfo,
};

/// Files belonging to one installed module.
#[derive(Debug, Clone)]
pub struct ModuleResources {
    root: PathBuf,
}

impl ModuleResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config").join("config.json")
    }

    #[must_use]
    pub fn info_path(&self) -> PathBuf {
        self.root.join("module.json")
    }

    /// Load and validate `config/config.json`.
    ///
    /// # Errors
    /// Returns `LoginError::Config` if the file is missing or invalid.
    pub fn load_config(&self) -> LoginResultOf<ModuleConfig> {
        ModuleConfig::from_file(&self.config_path())
    }

    /// Load `module.json`.
    ///
    /// # Errors
    /// Returns `LoginError::Resource` if the file is missing or lacks
    /// `name`/`identifier`.
    pub fn load_info(&self) -> LoginResultOf<ModuleInfo> {
        let path = self.info_path();
        let json = std::fs::read_to_string(&path).map_err(|e| resource_error(&path, &e))?;
        serde_json::from_str(&json).map_err(|e| resource_error(&path, &e))
    }

    /// Load `messages/<lang>.json`.
    ///
    /// Returns `Ok(None)` when no file exists for `lang`, including language
    /// codes that are not plain identifiers (`../config`, `en/US`, ...).
    ///
    /// # Errors
    /// Returns `LoginError::Resource` if the file exists but is not a JSON
    /// object of strings.
    pub fn messages(&self, lang: &str) -> LoginResultOf<Option<BTreeMap<String, String>>> {
        if !is_language_code(lang) {
            debug!(lang, "Ignoring malformed language code");
            return Ok(None);
        }

        let path = self.root.join("messages").join(format!("{lang}.json"));
        if !path.is_file() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path).map_err(|e| resource_error(&path, &e))?;
        let messages = serde_json::from_str(&json).map_err(|e| resource_error(&path, &e))?;
        Ok(Some(messages))
    }
}

fn is_language_code(lang: &str) -> bool {
    !lang.is_empty()
        && lang.len() <= 16
        && lang
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn resource_error(path: &Path, err: &dyn std::fmt::Display) -> LoginError {
    LoginError::Resource {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
