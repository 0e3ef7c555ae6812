//! Configuration module for Wastemap
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Politeness, retry, and threshold knobs are all configuration, not
//! constants: the source site's tolerances change more often than code.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, OutputConfig, PipelineConfig, SeedEntry, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
