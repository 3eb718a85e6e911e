//! Structured error types for xlmerge.

/// All errors that can occur while reading, merging or writing workbooks.
#[derive(Debug, thiserror::Error)]
pub enum XlmergeError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Configuration JSON could not be decoded.
    #[error("Config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No input workbooks were supplied.
    #[error("No input files supplied")]
    NoInput,

    /// Merge configuration violates an invariant.
    #[error("Invalid merge config: {0}")]
    Config(String),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A formula cannot be serialized as-is.
    #[error("Formula error: {0}")]
    Formula(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlmergeError>;
