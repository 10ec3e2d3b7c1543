//! Error types for the refiner.
//!
//! `RefineError` is the single error type handed to library consumers.
//! Document-level failures carry enough context (paths, identifiers) to be
//! reported without the caller having to wrap them again.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the refiner library.
#[derive(Debug, Error)]
pub enum RefineError {
    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to download a metadata dump.
    #[error("Failed to download metadata dump from {url}: {source}")]
    MetadataDownload {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// All retry attempts for a request failed.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing required XML element.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// Fewer facsimile references than image placeholders.
    #[error("Document has {needed} image placeholders but only {available} image references")]
    MissingImageReference { needed: usize, available: usize },

    /// No metadata row for a Transkribus document.
    #[error("No metadata for document {document} in collection {collection}")]
    MissingMetadata {
        collection: String,
        document: String,
    },

    /// The project dump has no entry under the expected key.
    #[error("Project metadata dump has no entry '{0}'")]
    MissingProjectMetadata(String),

    /// Identifier that cannot be used as an output file name.
    #[error("Invalid document identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Template could not be loaded or rendered.
    #[error("Template error in {path}: {message}")]
    Template { path: PathBuf, message: String },

    /// Rendered output is not well-formed XML.
    #[error("Rendered document {identifier} is not well-formed: {source}")]
    InvalidOutput {
        identifier: String,
        #[source]
        source: roxmltree::Error,
    },
}

/// Result type alias for refiner operations.
pub type Result<T> = std::result::Result<T, RefineError>;
