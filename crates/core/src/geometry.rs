//! Page geometry for highlight overlays
//!
//! Rectangles arrive from the rendering collaborator in client space (pixels, shared origin
//! with the page content box) and are stored as percentages of the content box so overlays
//! survive zoom changes.

use serde::{Deserialize, Serialize};

/// Decimal places kept on normalized coordinates
pub const PERCENT_PRECISION: i32 = 4;

/// Round a percentage to [`PERCENT_PRECISION`] decimal places
pub fn round_percent(value: f64) -> f64 {
    let scale = 10f64.powi(PERCENT_PRECISION);
    (value * scale).round() / scale
}

/// Rectangle in client space
///
/// Used both for the bounding boxes of rendered text fragments and for the page content box
/// they are normalized against. All rectangles handed to the core for one page must share the
/// same coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientRect {
    /// Left edge in pixels
    pub left: f64,

    /// Top edge in pixels
    pub top: f64,

    /// Width in pixels
    pub width: f64,

    /// Height in pixels
    pub height: f64,
}

impl ClientRect {
    /// Create a new client rectangle
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Whether the rectangle has been laid out with a usable size
    ///
    /// A content box failing this check means the page has not been laid out yet.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Rectangle expressed as percentages (0-100) of a page's content box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    /// Left edge, percent of content box width
    pub left: f64,

    /// Top edge, percent of content box height
    pub top: f64,

    /// Width, percent of content box width
    pub width: f64,

    /// Height, percent of content box height
    pub height: f64,
}

impl NormalizedRect {
    /// Create a new normalized rectangle
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Normalize a client rectangle against the page content box
    ///
    /// Returns `None` when the content box has no area, since nothing can be expressed
    /// relative to it. Every coordinate is rounded to [`PERCENT_PRECISION`] decimals.
    pub fn from_client(rect: &ClientRect, container: &ClientRect) -> Option<Self> {
        if !container.has_area() {
            return None;
        }

        Some(Self {
            left: round_percent((rect.left - container.left) / container.width * 100.0),
            top: round_percent((rect.top - container.top) / container.height * 100.0),
            width: round_percent(rect.width / container.width * 100.0),
            height: round_percent(rect.height / container.height * 100.0),
        })
    }

    /// Whether this rectangle covers any area
    ///
    /// Only visible rectangles are ever stored in a layout or emitted as highlights.
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Right edge, percent of content box width
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge, percent of content box height
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}
