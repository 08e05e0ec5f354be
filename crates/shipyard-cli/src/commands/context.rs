//! `shipyard context` — manage the contexts file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use shipyard_config::{ConfigError, ContextEntry, ContextsFile, HttpSpec};

/// Add or update profile `name` in the contexts file.
pub fn init(name: &str, url: &str, username: &str, path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => shipyard_config::default_contexts_path()
            .context("could not determine the home directory, pass --path")?,
    };

    let mut file = match ContextsFile::from_file(&path) {
        Ok(file) => file,
        Err(ConfigError::NotFound(_)) => ContextsFile::default(),
        Err(e) => return Err(e).with_context(|| format!("could not read {}", path.display())),
    };

    if !force && file.contexts.iter().any(|c| c.name == name) {
        bail!("profile '{name}' already exists in {}, use --force to replace it", path.display());
    }

    file.upsert(ContextEntry {
        name: name.to_string(),
        http: HttpSpec {
            url: url.to_string(),
            username: username.to_string(),
        },
    });
    // Reject the entry before writing it if it would not resolve.
    file.profile(name)?;
    file.save(&path)?;

    info!(profile = %name, path = %path.display(), "context saved");
    println!("✓ Saved profile '{}' to {}", name, path.display());
    Ok(())
}

/// Print every profile with its backend url.
pub fn list(path: Option<&Path>) -> Result<()> {
    let path = shipyard_config::locate(path)?;
    let file = ContextsFile::from_file(&path)?;

    println!("{}", path.display());
    for entry in &file.contexts {
        println!("  {:<16} {}", entry.name, entry.http.url);
    }
    Ok(())
}
