//! Configuration module for burrow
//!
//! Two layers live here: the flat `key: value` store each workspace keeps in
//! `.ws/config`, and the tool-level `config.toml` settings.

mod settings;
mod store;

pub use settings::{expand_string, BurrowPaths, SessionSettings, Settings};
pub use store::{ConfigStore, Field};
