//! Projection of character ranges onto highlight rectangles
//!
//! There are no per-glyph metrics, so a sub-range of a span is approximated by slicing each of
//! the span's rectangles horizontally in proportion to the character positions.

use crate::diff::OffsetRange;
use crate::geometry::{round_percent, NormalizedRect};
use crate::text_layout::{PageTextLayout, TextSpan};

/// Rectangles covering the chars `[start, end)` of a page
///
/// Returns an empty list for an empty range. Runs in O(spans).
pub fn rects_for_range(layout: &PageTextLayout, start: usize, end: usize) -> Vec<NormalizedRect> {
    if start == end {
        return Vec::new();
    }

    let mut rects = Vec::new();
    for span in layout.overlapping_spans(start, end) {
        project_span(span, start, end, &mut rects);
    }

    rects.retain(NormalizedRect::is_visible);
    rects
}

/// Rectangles for several ranges, concatenated in range order
pub fn rects_for_ranges(layout: &PageTextLayout, ranges: &[OffsetRange]) -> Vec<NormalizedRect> {
    ranges.iter().flat_map(|range| rects_for_range(layout, range.start, range.end)).collect()
}

fn project_span(span: &TextSpan, start: usize, end: usize, out: &mut Vec<NormalizedRect>) {
    let span_len = span.len().max(1) as f64;
    let overlap_start = start.max(span.start);
    let overlap_end = end.min(span.end);

    let start_ratio = (overlap_start as f64 - span.start as f64) / span_len;
    let end_ratio = (overlap_end as f64 - span.start as f64) / span_len;
    let width_ratio = (end_ratio - start_ratio).max(0.0);

    for rect in &span.rects {
        // A zero ratio would collapse the highlight; show the whole fragment instead.
        let width = if width_ratio > 0.0 { rect.width * width_ratio } else { rect.width };

        out.push(NormalizedRect {
            left: round_percent(rect.left + rect.width * start_ratio),
            top: rect.top,
            width: round_percent(width),
            height: rect.height,
        });
    }
}
