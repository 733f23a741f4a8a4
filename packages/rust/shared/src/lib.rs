//! Shared types, error model, and configuration for bookmirror.
//!
//! This crate is the foundation depended on by all other bookmirror crates.
//! It provides:
//! - [`MirrorError`] — the unified error type
//! - Domain types ([`BookEdition`], [`Chapter`], [`Section`], [`QuestionRef`], [`ExerciseDetail`])
//! - Configuration ([`AppConfig`], [`MirrorConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, DefaultsConfig, MirrorConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_session_token,
};
pub use error::{MirrorError, Result};
pub use types::{
    BookEdition, Chapter, DEFAULT_TITLE, ExerciseDetail, ExerciseRef, QuestionRef, Section,
};
