//! Captured text layout for a rendered page
//!
//! A layout maps character offsets in the page's full text to the normalized rectangles the
//! text occupies on screen. Layouts are captured once per render from an ordered sequence of
//! text runs and thrown away when the page is rendered again.

use crate::error::{LayoutError, LayoutResult};
use crate::geometry::{ClientRect, NormalizedRect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A run of text as rendered, with one client rectangle per visual line it occupies
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextRun {
    /// Text content of the run
    pub text: String,

    /// Client-space rectangles, one per line fragment
    #[serde(default)]
    pub rects: Vec<ClientRect>,
}

impl TextRun {
    /// Create a new text run
    pub fn new(text: impl Into<String>, rects: Vec<ClientRect>) -> Self {
        Self { text: text.into(), rects }
    }
}

/// Source of rendered text runs in reading order
///
/// Implemented by whatever adapter sits on top of the renderer's text layer. The capture code
/// only ever sees this trait.
pub trait TextRunProvider {
    /// Iterate the page's text runs in reading order
    fn text_runs(&self) -> Box<dyn Iterator<Item = TextRun> + '_>;
}

impl TextRunProvider for [TextRun] {
    fn text_runs(&self) -> Box<dyn Iterator<Item = TextRun> + '_> {
        Box::new(self.iter().cloned())
    }
}

impl TextRunProvider for Vec<TextRun> {
    fn text_runs(&self) -> Box<dyn Iterator<Item = TextRun> + '_> {
        self.as_slice().text_runs()
    }
}

/// A span of page text with known on-screen rectangles
///
/// `start`/`end` are half-open char offsets into [`PageTextLayout::text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,

    /// One rectangle per line fragment; a wrapped span owns several
    pub rects: Vec<NormalizedRect>,
}

impl TextSpan {
    /// Create a new span
    pub fn new(
        start: usize,
        end: usize,
        text: impl Into<String>,
        rects: Vec<NormalizedRect>,
    ) -> Self {
        Self { start, end, text: text.into(), rects }
    }

    /// Length of the span in chars
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the span shares any offset with `[start, end)`
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.end > start && self.start < end
    }
}

/// Text layout for a single rendered page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTextLayout {
    /// 1-based page number
    pub page: u32,

    /// Content box width at capture time (client pixels)
    pub width: f64,

    /// Content box height at capture time (client pixels)
    pub height: f64,

    /// Full page text; span offsets index into it
    pub text: String,

    /// Spans in document order
    pub spans: Vec<TextSpan>,
}

impl PageTextLayout {
    /// Build a layout from an already extracted page text
    ///
    /// Used when the renderer hands over the full page text directly. The text must be the
    /// same concatenation a run walk would produce; see [`PageTextLayout::validate`].
    pub fn from_page_text(
        page: u32,
        width: f64,
        height: f64,
        text: impl Into<String>,
        spans: Vec<TextSpan>,
    ) -> Self {
        Self { page, width, height, text: text.into(), spans }
    }

    /// Length of the page text in chars
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Spans overlapping `[start, end)`, in document order
    pub fn overlapping_spans(&self, start: usize, end: usize) -> impl Iterator<Item = &TextSpan> {
        self.spans.iter().filter(move |span| span.overlaps(start, end))
    }

    /// Check the structural invariants of a layout received from outside the process
    pub fn validate(&self) -> LayoutResult<()> {
        let offsets = char_byte_offsets(&self.text);
        let text_len = offsets.len() - 1;
        let mut previous_end = 0;

        for (index, span) in self.spans.iter().enumerate() {
            let page = self.page;

            if span.end <= span.start {
                return Err(LayoutError::EmptySpan {
                    page,
                    index,
                    start: span.start,
                    end: span.end,
                });
            }
            if span.start < previous_end {
                return Err(LayoutError::OverlappingSpan {
                    page,
                    index,
                    start: span.start,
                    previous_end,
                });
            }
            if span.end > text_len {
                return Err(LayoutError::SpanOutOfBounds { page, index, end: span.end, text_len });
            }
            if self.text[offsets[span.start]..offsets[span.end]] != span.text {
                return Err(LayoutError::SpanTextMismatch {
                    page,
                    index,
                    start: span.start,
                    end: span.end,
                });
            }
            if !span.rects.iter().all(NormalizedRect::is_visible) {
                return Err(LayoutError::DegenerateRect { page, index });
            }

            previous_end = span.end;
        }

        Ok(())
    }
}

/// Capture the text layout of a rendered page
///
/// Walks the provider's runs in order. Each non-empty run whose rectangles survive
/// normalization becomes a span; every run, visible or not, advances the offset cursor and
/// contributes its text, so offsets always agree with the full page text.
///
/// Returns `None` while the content box has no area (the page is not laid out yet).
pub fn capture_text_layout<P>(
    page: u32,
    provider: &P,
    content_box: &ClientRect,
) -> Option<PageTextLayout>
where
    P: TextRunProvider + ?Sized,
{
    if !content_box.has_area() {
        return None;
    }

    let mut spans = Vec::new();
    let mut text = String::new();
    let mut cursor = 0;

    for run in provider.text_runs() {
        let length = run.text.chars().count();
        text.push_str(&run.text);

        if length > 0 {
            let rects: Vec<NormalizedRect> = run
                .rects
                .iter()
                .filter_map(|rect| NormalizedRect::from_client(rect, content_box))
                .filter(NormalizedRect::is_visible)
                .collect();

            if !rects.is_empty() {
                spans.push(TextSpan::new(cursor, cursor + length, run.text, rects));
            }
        }

        cursor += length;
    }

    Some(PageTextLayout {
        page,
        width: content_box.width,
        height: content_box.height,
        text,
        spans,
    })
}

/// Byte offset of every char boundary in `text`, including the end
pub(crate) fn char_byte_offsets(text: &str) -> Vec<usize> {
    text.char_indices().map(|(offset, _)| offset).chain(std::iter::once(text.len())).collect()
}

/// Captured layouts for one document, keyed by page number
///
/// Inserting a layout for a page replaces the previous capture outright.
#[derive(Debug, Clone, Default)]
pub struct LayoutIndex {
    layouts: BTreeMap<u32, PageTextLayout>,
}

impl LayoutIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a layout, returning the capture it replaced
    pub fn insert(&mut self, layout: PageTextLayout) -> Option<PageTextLayout> {
        self.layouts.insert(layout.page, layout)
    }

    pub fn get(&self, page: u32) -> Option<&PageTextLayout> {
        self.layouts.get(&page)
    }

    pub fn contains(&self, page: u32) -> bool {
        self.layouts.contains_key(&page)
    }

    pub fn remove(&mut self, page: u32) -> Option<PageTextLayout> {
        self.layouts.remove(&page)
    }

    pub fn clear(&mut self) {
        self.layouts.clear();
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Page numbers with a captured layout, ascending
    pub fn pages(&self) -> Vec<u32> {
        self.layouts.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageTextLayout> {
        self.layouts.values()
    }
}

impl FromIterator<PageTextLayout> for LayoutIndex {
    fn from_iter<I: IntoIterator<Item = PageTextLayout>>(iter: I) -> Self {
        let mut index = Self::new();
        for layout in iter {
            index.insert(layout);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_box() -> ClientRect {
        ClientRect::new(0.0, 0.0, 200.0, 100.0)
    }

    fn line(left: f64, top: f64, width: f64) -> ClientRect {
        ClientRect::new(left, top, width, 10.0)
    }

    #[test]
    fn test_capture_builds_contiguous_spans() {
        let runs = vec![
            TextRun::new("Hello", vec![line(0.0, 0.0, 50.0)]),
            TextRun::new(" ", vec![line(50.0, 0.0, 10.0)]),
            TextRun::new("World", vec![line(60.0, 0.0, 50.0)]),
        ];

        let layout = capture_text_layout(3, &runs, &content_box()).unwrap();
        assert_eq!(layout.page, 3);
        assert_eq!(layout.width, 200.0);
        assert_eq!(layout.height, 100.0);
        assert_eq!(layout.text, "Hello World");
        assert_eq!(layout.spans.len(), 3);
        assert_eq!((layout.spans[2].start, layout.spans[2].end), (6, 11));
        assert_eq!(layout.spans[2].rects, vec![NormalizedRect::new(30.0, 0.0, 25.0, 10.0)]);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_invisible_runs_still_advance_offsets() {
        let runs = vec![
            TextRun::new("ab", vec![line(0.0, 0.0, 20.0)]),
            TextRun::new("hidden", vec![ClientRect::new(20.0, 0.0, 0.0, 10.0)]),
            TextRun::new("", vec![line(0.0, 0.0, 20.0)]),
            TextRun::new("cd", vec![line(30.0, 0.0, 20.0)]),
        ];

        let layout = capture_text_layout(1, &runs, &content_box()).unwrap();
        assert_eq!(layout.text, "abhiddencd");
        assert_eq!(layout.spans.len(), 2);
        assert_eq!((layout.spans[1].start, layout.spans[1].end), (8, 10));
        assert_eq!(layout.spans[1].text, "cd");
    }

    #[test]
    fn test_capture_counts_chars_not_bytes() {
        let runs = vec![
            TextRun::new("日本", vec![line(0.0, 0.0, 20.0)]),
            TextRun::new("語", vec![line(20.0, 0.0, 10.0)]),
        ];

        let layout = capture_text_layout(1, &runs, &content_box()).unwrap();
        assert_eq!(layout.char_len(), 3);
        assert_eq!((layout.spans[1].start, layout.spans[1].end), (2, 3));
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_wrapped_run_keeps_every_line_rect() {
        let runs = vec![TextRun::new(
            "wrapping text",
            vec![line(100.0, 0.0, 100.0), line(0.0, 10.0, 30.0), ClientRect::default()],
        )];

        let layout = capture_text_layout(1, &runs, &content_box()).unwrap();
        assert_eq!(layout.spans.len(), 1);
        assert_eq!(layout.spans[0].rects.len(), 2);
        assert_eq!(layout.spans[0].rects[1], NormalizedRect::new(0.0, 10.0, 15.0, 10.0));
    }

    #[test]
    fn test_capture_waits_for_laid_out_page() {
        let runs = vec![TextRun::new("text", vec![line(0.0, 0.0, 20.0)])];

        assert!(capture_text_layout(1, &runs, &ClientRect::new(0.0, 0.0, 0.0, 100.0)).is_none());
        assert!(capture_text_layout(1, &runs, &ClientRect::new(0.0, 0.0, 100.0, 0.0)).is_none());
    }

    #[test]
    fn test_capture_is_idempotent() {
        let runs = vec![
            TextRun::new("one two", vec![line(3.0, 7.0, 41.0)]),
            TextRun::new(" three", vec![line(44.0, 7.0, 33.0), line(0.0, 17.0, 12.0)]),
        ];
        let container = ClientRect::new(5.0, 5.0, 333.0, 777.0);

        let first = capture_text_layout(2, &runs, &container);
        let second = capture_text_layout(2, runs.as_slice(), &container);
        assert_eq!(first, second);
    }

    #[test]
    fn test_validate_rejects_broken_spans() {
        let rect = NormalizedRect::new(0.0, 0.0, 10.0, 10.0);

        let empty = PageTextLayout::from_page_text(
            1,
            100.0,
            100.0,
            "abc",
            vec![TextSpan::new(1, 1, "", vec![rect])],
        );
        assert!(matches!(empty.validate(), Err(LayoutError::EmptySpan { index: 0, .. })));

        let overlapping = PageTextLayout::from_page_text(
            1,
            100.0,
            100.0,
            "abcdef",
            vec![TextSpan::new(0, 3, "abc", vec![rect]), TextSpan::new(2, 4, "cd", vec![rect])],
        );
        assert!(matches!(
            overlapping.validate(),
            Err(LayoutError::OverlappingSpan { index: 1, previous_end: 3, .. })
        ));

        let out_of_bounds = PageTextLayout::from_page_text(
            1,
            100.0,
            100.0,
            "abc",
            vec![TextSpan::new(1, 5, "bc", vec![rect])],
        );
        assert!(matches!(
            out_of_bounds.validate(),
            Err(LayoutError::SpanOutOfBounds { end: 5, text_len: 3, .. })
        ));

        let mismatch = PageTextLayout::from_page_text(
            1,
            100.0,
            100.0,
            "abc",
            vec![TextSpan::new(0, 2, "xy", vec![rect])],
        );
        assert!(matches!(mismatch.validate(), Err(LayoutError::SpanTextMismatch { .. })));

        let degenerate = PageTextLayout::from_page_text(
            4,
            100.0,
            100.0,
            "abc",
            vec![TextSpan::new(0, 3, "abc", vec![NormalizedRect::new(0.0, 0.0, 0.0, 1.0)])],
        );
        assert_eq!(degenerate.validate(), Err(LayoutError::DegenerateRect { page: 4, index: 0 }));
    }

    #[test]
    fn test_validate_allows_gaps_between_spans() {
        let rect = NormalizedRect::new(0.0, 0.0, 10.0, 10.0);
        let layout = PageTextLayout::from_page_text(
            1,
            100.0,
            100.0,
            "ab  cd",
            vec![TextSpan::new(0, 2, "ab", vec![rect]), TextSpan::new(4, 6, "cd", vec![rect])],
        );

        assert!(layout.validate().is_ok());
        assert_eq!(layout.overlapping_spans(1, 5).count(), 2);
        assert_eq!(layout.overlapping_spans(2, 4).count(), 0);
    }

    #[test]
    fn test_layout_index_replaces_on_recapture() {
        let mut index = LayoutIndex::new();
        assert!(index.is_empty());

        let first = PageTextLayout::from_page_text(2, 100.0, 100.0, "old", Vec::new());
        let second = PageTextLayout::from_page_text(2, 200.0, 200.0, "new", Vec::new());
        let other = PageTextLayout::from_page_text(1, 100.0, 100.0, "page one", Vec::new());

        assert!(index.insert(first).is_none());
        let replaced = index.insert(second).unwrap();
        assert_eq!(replaced.text, "old");
        index.insert(other);

        assert_eq!(index.len(), 2);
        assert_eq!(index.pages(), vec![1, 2]);
        assert_eq!(index.get(2).unwrap().text, "new");
        assert!(index.contains(1));

        index.remove(1);
        assert!(!index.contains(1));

        index.clear();
        assert!(index.is_empty());
    }
}
