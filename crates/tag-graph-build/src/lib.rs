//! Build-time utilities for tag-graph.
//!
//! This crate provides tools for:
//! - Parsing `taxonomy.toml` configuration files
//! - Validating the resulting table exactly as the runtime would
//! - Generating a Rust module with a static `TABLE`
//!
//! # Usage in build.rs
//!
//! ```ignore
//! // build.rs
//! fn main() {
//!     println!("cargo:rerun-if-changed=taxonomy.toml");
//!     let out = std::path::Path::new(&std::env::var("OUT_DIR").unwrap()).join("taxonomy.rs");
//!     tag_graph_build::generate("taxonomy.toml", out)
//!         .expect("Failed to generate taxonomy");
//! }
//!
//! // src/lib.rs
//! include!(concat!(env!("OUT_DIR"), "/taxonomy.rs"));
//! ```
//!
//! # Format
//!
//! ```toml
//! module_name = "lexicon"   # optional, defaults to "taxonomy"
//!
//! [[node]]
//! path = "root.api.nabu"
//! capabilities = ["boolean-leaf"]
//! aliases = ["root.api.legacy_nabu"]
//!
//! [[node]]
//! path = "boolean-leaf"
//! ```
//!
//! Missing parents are filled in. A table that `tag_graph::Table::load`
//! would reject is reported here, before any code is written.

mod codegen;
mod toml_parser;

pub use codegen::generate_table_code;
pub use toml_parser::{TaxonomyConfig, TaxonomyConfigError, TaxonomyEntry};

use std::path::Path;

/// Main entry point for build.rs integration.
///
/// Reads `taxonomy.toml`, validates it and writes the generated module.
///
/// # Errors
///
/// Returns an error if:
/// - `taxonomy.toml` cannot be read or parsed
/// - the table fails load-time validation (cycles, dangling aliases, ...)
/// - the output file cannot be written
pub fn generate(
    config_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<(), GenerateError> {
    let config = TaxonomyConfig::from_file(config_path)?;
    let code = generate_to_string(&config)?;
    std::fs::write(output_path, code)?;
    Ok(())
}

/// Validate `config` and return the generated source.
pub fn generate_to_string(config: &TaxonomyConfig) -> Result<String, GenerateError> {
    let table = tag_graph::Table::load(config.rows())?;
    tracing::debug!(
        module = %config.module_name,
        nodes = table.len(),
        aliases = table.aliases().len(),
        "generating taxonomy module"
    );
    Ok(generate_table_code(config))
}

/// Errors that can occur during generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Failed to read or parse taxonomy.toml
    #[error("config error: {0}")]
    Config(#[from] TaxonomyConfigError),
    /// The table would be rejected at load time
    #[error("invalid taxonomy: {0}")]
    Table(#[from] tag_graph::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
