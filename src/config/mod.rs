//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ScaffoldConfig (validated, immutable)
//!     → handed to Scaffold::new
//! ```
//!
//! # Design Decisions
//! - Config is fixed at construction; the health check is supplied in code
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DrainConfig, MarkdownConfig, ObservabilityConfig, ProbeConfig, ScaffoldConfig, SurfaceConfig,
};
pub use validation::{markdown_method_filter, validate_config, ValidationError};
