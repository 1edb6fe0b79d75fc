//! Error types for the compare core
//!
//! Diffing and projection are total and never fail. Errors only arise when layouts or
//! configuration come from outside the process and have to be checked first.

use thiserror::Error;

/// Structural problems found in an externally supplied [`PageTextLayout`]
///
/// [`PageTextLayout`]: crate::text_layout::PageTextLayout
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("span {index} on page {page} is empty or reversed ({start}..{end})")]
    EmptySpan { page: u32, index: usize, start: usize, end: usize },

    #[error("span {index} on page {page} starts at {start}, before the previous span ends at {previous_end}")]
    OverlappingSpan { page: u32, index: usize, start: usize, previous_end: usize },

    #[error("span {index} on page {page} ends at {end}, past the page text length {text_len}")]
    SpanOutOfBounds { page: u32, index: usize, end: usize, text_len: usize },

    #[error("span {index} on page {page} text does not match the page text at {start}..{end}")]
    SpanTextMismatch { page: u32, index: usize, start: usize, end: usize },

    #[error("span {index} on page {page} has a rectangle without area")]
    DegenerateRect { page: u32, index: usize },
}

/// Invalid compare configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cell budget must be greater than zero")]
    ZeroCellBudget,

    #[error("search context must be at most {max} characters, got {value}")]
    SearchContextTooLarge { value: usize, max: usize },
}

/// Result alias for layout validation
pub type LayoutResult<T> = Result<T, LayoutError>;
