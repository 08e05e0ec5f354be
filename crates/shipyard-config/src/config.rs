//! contexts.toml parser.
//!
//! ```toml
//! [[contexts]]
//! name = "default"
//!
//! [contexts.http]
//! url = "https://fleet.example.com/"
//! username = "token"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ConfigError, ConfigResult};

pub const CONTEXTS_FILE_NAME: &str = "contexts.toml";
pub const DEFAULT_PROFILE: &str = "default";

const CONTEXTS_DIR: &str = ".shipyard";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSpec {
    pub url: String,
    /// Sent verbatim as the `Authorization` header.
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub name: String,
    pub http: HttpSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextsFile {
    pub contexts: Vec<ContextEntry>,
}

/// A fully validated profile, ready to build a fleet client from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub url: Url,
    pub username: String,
}

impl ContextsFile {
    /// Parse a contexts document. Entries with missing or mistyped fields
    /// are skipped with a warning; a document without a `contexts` array
    /// is invalid.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let doc: toml::Table = content
            .parse()
            .map_err(|e: toml::de::Error| ConfigError::InvalidSyntax(e.message().to_string()))?;

        let Some(toml::Value::Array(entries)) = doc.get("contexts") else {
            return Err(ConfigError::InvalidSyntax(
                "expected a `contexts` array".to_string(),
            ));
        };

        let mut contexts = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match entry.clone().try_into::<ContextEntry>() {
                Ok(ctx) => contexts.push(ctx),
                Err(e) => warn!(index, error = %e.message(), "context entry skipped"),
            }
        }
        Ok(Self { contexts })
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        debug!(path = %path.display(), "contexts file loaded");
        Self::parse(&content)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidSyntax(e.to_string()))
    }

    /// Write the file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_toml_string()?).map_err(io_err)
    }

    /// Insert `entry`, replacing any entry with the same name.
    pub fn upsert(&mut self, entry: ContextEntry) {
        match self.contexts.iter_mut().find(|c| c.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.contexts.push(entry),
        }
    }

    /// Resolve and validate the profile called `name`.
    pub fn profile(&self, name: &str) -> ConfigResult<Profile> {
        let entry = self
            .contexts
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))?;

        let url = Url::parse(&entry.http.url).map_err(|e| ConfigError::InvalidUrl {
            profile: name.to_string(),
            url: entry.http.url.clone(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                profile: name.to_string(),
                url: entry.http.url.clone(),
                reason: "expected an http or https url".to_string(),
            });
        }

        Ok(Profile {
            name: entry.name.clone(),
            url,
            username: entry.http.username.clone(),
        })
    }
}

/// `$HOME/.shipyard/contexts.toml`, if a home directory is known.
pub fn default_contexts_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONTEXTS_DIR).join(CONTEXTS_FILE_NAME))
}

/// Find the contexts file: an explicit path wins, then `./contexts.toml`,
/// then the home directory default.
pub fn locate(explicit: Option<&Path>) -> ConfigResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let local = PathBuf::from(CONTEXTS_FILE_NAME);
    if local.is_file() {
        return Ok(local);
    }

    match default_contexts_path() {
        Some(path) if path.is_file() => Ok(path),
        Some(path) => Err(ConfigError::NotFound(path)),
        None => Err(ConfigError::NotFound(local)),
    }
}

/// Locate the contexts file and resolve `profile` from it.
pub fn load_profile(explicit: Option<&Path>, profile: &str) -> ConfigResult<Profile> {
    let path = locate(explicit)?;
    ContextsFile::from_file(&path)?.profile(profile)
}
