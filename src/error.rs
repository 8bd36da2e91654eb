//! Error types for cv-forge.

use std::io;
use thiserror::Error;

use crate::document::{SectionId, SectionKind};

/// Result type alias for cv-forge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while editing, composing, or exporting a
/// template.
#[derive(Error, Debug)]
pub enum Error {
    /// A template failed validation before persistence.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The export target was not mounted when capture began.
    #[error("no mounted view tree with marker `{0}`")]
    ElementNotFound(String),

    /// Bitmap capture or encoding failed.
    #[error("rasterization failed: {0}")]
    Rasterization(String),

    /// Opaque failure from a template store.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// No section with this id exists in the document.
    #[error("section {0} not found")]
    SectionNotFound(SectionId),

    /// A settings patch named a field the section kind does not carry.
    #[error("`{field}` does not apply to {kind:?} sections")]
    SettingNotApplicable {
        field: &'static str,
        kind: SectionKind,
    },

    /// No stored template with this id.
    #[error("template `{0}` not found")]
    TemplateNotFound(String),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed template or CV JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether repeating the same call may succeed.
    ///
    /// `ElementNotFound` is a precondition failure: the caller must mount the
    /// view tree first, so a blind retry never helps.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Rasterization(_) | Error::Persistence(_))
    }

    /// Message suitable for a toast or an inline field error.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { message, .. } => message.clone(),
            Error::ElementNotFound(_) => {
                "The CV preview is not ready yet, so it could not be exported.".to_string()
            }
            Error::Rasterization(msg) => format!("Failed to generate the PDF: {msg}"),
            Error::Persistence(_) => "Could not save your changes. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}
