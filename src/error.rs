//! Error types for the PDF extraction server

use thiserror::Error;

/// Result type alias for the PDF extraction server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDF extraction server
#[derive(Error, Debug)]
pub enum Error {
    /// Request is missing required data or has the wrong shape
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Source bytes do not parse as a PDF document
    #[error("Malformed source PDF: {reason}")]
    MalformedSource { reason: String },

    /// Requested page index outside `1..=total`
    #[error("Invalid page number: {page} (document has {total} pages)")]
    PageOutOfRange { page: i64, total: u32 },

    /// Source document is encrypted
    #[error("Encrypted PDFs are not supported")]
    EncryptedSource,

    /// Name is not a plain file name
    #[error("Invalid file name: {name}")]
    InvalidName { name: String },

    /// Named file is not in the store
    #[error("File not found: {name}")]
    NotFound { name: String },

    /// Upload exceeds the configured limit
    #[error("Upload too large: {size} bytes (max: {max_size} bytes)")]
    UploadTooLarge { size: u64, max_size: u64 },

    /// Account is not registered
    #[error("Account not found: {account}")]
    AccountNotFound { account: String },

    /// Artifact does not fit into the in-memory store
    #[error("Storage full: {size} bytes (max: {max_size} bytes)")]
    StorageFull { size: usize, max_size: usize },

    /// Page rendering failed in the rasterized path
    #[error("Render error: {reason}")]
    Render { reason: String },

    /// Fault inside the PDF library that is not caused by the input
    #[error("Internal error: {reason}")]
    Internal { reason: String },

    /// Base64 decode error
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure was caused by the caller's input (4xx-equivalent).
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidRequest { .. }
                | Error::MalformedSource { .. }
                | Error::PageOutOfRange { .. }
                | Error::EncryptedSource
                | Error::InvalidName { .. }
                | Error::NotFound { .. }
                | Error::UploadTooLarge { .. }
                | Error::AccountNotFound { .. }
                | Error::StorageFull { .. }
                | Error::Base64Decode(_)
        )
    }

    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::InvalidRequest { .. } => "Invalid request data".to_string(),
            Error::MalformedSource { .. } => "Invalid PDF file".to_string(),
            Error::PageOutOfRange { page, .. } => format!("Invalid page number: {}", page),
            Error::EncryptedSource => "Encrypted PDFs are not supported".to_string(),
            Error::InvalidName { name } => format!("Invalid file name: {}", name),
            Error::NotFound { .. } => "File not found".to_string(),
            Error::UploadTooLarge { max_size, .. } => {
                format!("Upload exceeds maximum size of {} bytes", max_size)
            }
            Error::AccountNotFound { .. } => "Account not found".to_string(),
            Error::StorageFull { .. } => "Storage full".to_string(),
            Error::Render { .. } => "Error rendering pages".to_string(),
            Error::Internal { .. } => "Error extracting pages".to_string(),
            Error::Base64Decode(_) => "Invalid base64 data".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Serialization(_) => "Serialization error".to_string(),
        }
    }
}
