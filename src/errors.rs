//! Outcome codes and the error type that ends a work item.
//!
//! Each stage owns its own error enum; [`PipelineError`] gathers them so the
//! runner can map any failure to one of the [`ErrorCode`]s reported in the
//! work-item ledger.

use crate::extract::ExtractError;
use crate::images::ImageError;
use crate::outputs::xlsx::ReportError;
use crate::site::PageError;
use crate::validation::ValidationError;
use crate::window::WindowError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Machine-readable failure code attached to a failed work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingKeys,
    InvalidCategory,
    InvalidTopicLength,
    InvalidMonthsValue,
    ApplicationError,
    UnexpectedError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingKeys => "MISSING_KEYS",
            ErrorCode::InvalidCategory => "INVALID_CATEGORY",
            ErrorCode::InvalidTopicLength => "INVALID_TOPIC_LENGTH",
            ErrorCode::InvalidMonthsValue => "INVALID_MONTHS_VALUE",
            ErrorCode::ApplicationError => "APPLICATION_ERROR",
            ErrorCode::UnexpectedError => "UNEXPECTED_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that stops a single work item.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    MalformedDate(#[from] ExtractError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl PipelineError {
    /// Outcome code reported for this failure.
    ///
    /// Date, window and image failures are application errors; browser and
    /// file-system failures are unexpected.
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::Validation(e) => e.code(),
            PipelineError::Window(_)
            | PipelineError::MalformedDate(_)
            | PipelineError::Image(_) => ErrorCode::ApplicationError,
            PipelineError::Page(_) | PipelineError::Report(_) => ErrorCode::UnexpectedError,
        }
    }
}
