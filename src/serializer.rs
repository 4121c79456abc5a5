//! Serialization module for converting OpenAPI documents to YAML or JSON
//! format and writing generated artifacts to disk.
//!
//! Serialization happens entirely in memory before any file is touched, so
//! a failed pass leaves previously generated artifacts untouched.

use crate::error::{Error, Result};
use crate::openapi_builder::OpenApiDocument;
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to YAML format.
///
/// # Errors
///
/// Returns [`Error::Serialize`] if serialization fails.
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Serializes an OpenAPI document to JSON format with pretty printing.
///
/// # Errors
///
/// Returns [`Error::Serialize`] if serialization fails.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Writes string content to a file, creating parent directories as needed
/// and overwriting any existing file.
///
/// # Errors
///
/// Returns [`Error::Write`] if the directories or the file cannot be
/// created or written.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Write {
            file: path.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(path, content).map_err(|e| Error::Write {
        file: path.to_path_buf(),
        source: e,
    })?;

    debug!(
        "Successfully wrote {} bytes to {}",
        content.len(),
        path.display()
    );
    Ok(())
}
