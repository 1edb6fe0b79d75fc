//! PDF Compare Core Library
//!
//! Text diff and highlight projection for comparing two rendered PDF documents.

pub mod compare;
pub mod config;
pub mod diff;
pub mod error;
pub mod geometry;
pub mod projection;
pub mod search;
pub mod text_layout;
pub mod tokenizer;

pub use compare::{CompareNote, CompareSession, CompareSummary, HighlightMap, PageUpdate};
pub use config::CompareConfig;
pub use diff::{
    diff_texts, simple_diff, DiffConfig, DiffOutcome, DiffRanges, DiffStrategy, OffsetRange,
    TextDiffer, DEFAULT_CELL_BUDGET,
};
pub use error::{ConfigError, LayoutError, LayoutResult};
pub use geometry::{ClientRect, NormalizedRect};
pub use projection::{rects_for_range, rects_for_ranges};
pub use search::{rects_for_query, search_pages, SearchConfig, SearchHit};
pub use text_layout::{
    capture_text_layout, LayoutIndex, PageTextLayout, TextRun, TextRunProvider, TextSpan,
};
pub use tokenizer::{tokenize, TextToken};
