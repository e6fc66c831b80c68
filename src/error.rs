use thiserror::Error;

use crate::enums::Readiness;

/// Why a single file could not be turned into an image record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailureReason {
    #[error("missing DICM format marker")]
    MissingFormatMarker,

    #[error("malformed DICOM metadata: {0}")]
    Malformed(String),

    #[error("missing required attribute {0}")]
    MissingAttribute(&'static str),

    #[error("could not read file: {0}")]
    Unreadable(String),
}

/// Per-file parse failure. Never blocks grouping of the other files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ParseFailure in {file}: {reason}")]
pub struct LoadError {
    pub file: String,
    pub reason: ParseFailureReason,
}

impl LoadError {
    pub fn new(file: impl Into<String>, reason: ParseFailureReason) -> Self {
        Self {
            file: file.into(),
            reason,
        }
    }
}

/// Batch-level failure of a load call. Prior viewer state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadFailure {
    #[error("EmptyResult: none of the {attempted} files could be parsed")]
    EmptyResult {
        attempted: usize,
        errors: Vec<LoadError>,
    },

    #[error("rendering engine is not ready ({0:?})")]
    NotReady(Readiness),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for LoadFailure {
    fn from(err: std::io::Error) -> Self {
        LoadFailure::Io(err.to_string())
    }
}

/// The rendering engine failed to bind a series to one viewport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("RenderError: {0}")]
pub struct RenderError(pub String);

/// The rendering engine failed to initialize. Fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("InitError: {0}")]
pub struct InitError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("rendering engine is not ready ({0:?})")]
    NotReady(Readiness),
}
