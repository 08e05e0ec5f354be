//! Contexts file handling for shipyard.
//!
//! A contexts file lists named profiles, each pointing at one fleet
//! backend. The CLI resolves one [`Profile`] and hands it to the engine;
//! nothing below the CLI reads the environment.

pub mod config;
pub mod error;

pub use config::{
    default_contexts_path, load_profile, locate, ContextEntry, ContextsFile, HttpSpec, Profile,
    CONTEXTS_FILE_NAME, DEFAULT_PROFILE,
};
pub use error::{ConfigError, ConfigResult};
