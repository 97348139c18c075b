// src/config/mod.rs

//! Configuration loading and resolution for stoker.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional `Stoker.toml` from disk (`loader.rs`).
//! - Merge file values with CLI flags into immutable [`Settings`]
//!   (`settings.rs`) and validate the result (`validate.rs`).
//!
//! Settings are fixed at startup and read-only for the lifetime of the
//! process.

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{default_config_path, load_from_path, load_optional};
pub use model::{BuildSection, ConfigFile, ProxySection, RunSection, WatchSection};
pub use settings::Settings;
pub use validate::validate_settings;
