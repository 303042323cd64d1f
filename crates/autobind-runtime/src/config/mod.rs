//! Configuration for autobind.
//!
//! Layered loading through figment (defaults, files, `AUTOBIND_*`
//! environment variables, programmatic merges) plus validation.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    AutoConfigSection, AutobindConfig, InjectorConfig, LogFormat, LogLevel, LogOutput,
    LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;
