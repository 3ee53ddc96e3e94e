//! Shared data model and configuration for hookwatch.
//!
//! Holds the [`Source`] and [`Item`] types every other crate speaks, the
//! YAML sources file loader, and the environment-driven [`AppConfig`].

pub mod app_config;
pub mod config;
pub mod error;
pub mod item;
pub mod source;
pub mod sources_file;

pub use app_config::{AppConfig, Environment};
pub use config::{build_app_config, parse_webhook_url, WEBHOOK_URL_VAR};
pub use error::ConfigError;
pub use item::Item;
pub use source::{Source, SourceKind, SourceProfile};
pub use sources_file::{load_sources, SourcesFile};
