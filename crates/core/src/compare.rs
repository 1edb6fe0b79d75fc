//! Page-level document comparison
//!
//! [`CompareSummary`] flags which pages differ. [`CompareSession`] turns those flags into
//! highlight rectangles once the pages involved have been rendered and their layouts captured.
//! A session belongs to one base/target document pair and is dropped on reset.

use crate::config::CompareConfig;
use crate::diff::{OffsetRange, TextDiffer};
use crate::geometry::NormalizedRect;
use crate::projection::rects_for_ranges;
use crate::text_layout::{LayoutIndex, PageTextLayout};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highlight rectangles keyed by 1-based page number
///
/// A missing entry means there is nothing to draw on that page.
pub type HighlightMap = BTreeMap<u32, Vec<NormalizedRect>>;

/// Human-readable outcome of a page comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompareNote {
    NoDifferences,
    TextDifferences,
}

impl CompareNote {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoDifferences => "No differences found",
            Self::TextDifferences => "Text comparison only; layout changes are not detected",
        }
    }
}

/// Which pages differ between two documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareSummary {
    /// Pages present only in the target
    pub added_pages: u32,

    /// Pages present only in the base
    pub removed_pages: u32,

    /// 1-based page numbers whose text differs, ascending
    pub changed_pages: Vec<u32>,

    pub note: CompareNote,
}

impl CompareSummary {
    /// Compare full page texts position by position
    ///
    /// A page missing from one document compares as empty text, so it is flagged as changed
    /// unless the other side's page is empty too.
    pub fn from_page_texts<B, T>(base: &[B], target: &[T]) -> Self
    where
        B: AsRef<str>,
        T: AsRef<str>,
    {
        let page_count = base.len().max(target.len());
        let changed_pages: Vec<u32> = (0..page_count)
            .filter(|&index| {
                let base_text = base.get(index).map_or("", AsRef::as_ref);
                let target_text = target.get(index).map_or("", AsRef::as_ref);
                base_text != target_text
            })
            .map(|index| index as u32 + 1)
            .collect();

        let added_pages = target.len().saturating_sub(base.len()) as u32;
        let removed_pages = base.len().saturating_sub(target.len()) as u32;

        let note = if changed_pages.is_empty() && added_pages == 0 && removed_pages == 0 {
            CompareNote::NoDifferences
        } else {
            CompareNote::TextDifferences
        };

        Self { added_pages, removed_pages, changed_pages, note }
    }

    pub fn is_changed(&self, page: u32) -> bool {
        self.changed_pages.binary_search(&page).is_ok()
    }

    pub fn has_differences(&self) -> bool {
        self.note == CompareNote::TextDifferences
    }
}

/// What a page update did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum PageUpdate {
    /// The page is not flagged as changed; any highlights were removed
    Unchanged,

    /// A layout the page needs has not been captured yet; nothing was touched
    Pending,

    /// Highlights were recomputed; counts are rectangles stored per side
    Highlighted { base_rects: usize, target_rects: usize },
}

/// Compare state for one base/target document pair
#[derive(Debug, Clone)]
pub struct CompareSession {
    base_page_count: u32,
    target_page_count: u32,
    summary: CompareSummary,
    differ: TextDiffer,
    base_layouts: LayoutIndex,
    target_layouts: LayoutIndex,
    base_highlights: HighlightMap,
    target_highlights: HighlightMap,
}

impl CompareSession {
    pub fn new(
        base_page_count: u32,
        target_page_count: u32,
        summary: CompareSummary,
        config: &CompareConfig,
    ) -> Self {
        Self {
            base_page_count,
            target_page_count,
            summary,
            differ: TextDiffer::new(config.diff),
            base_layouts: LayoutIndex::new(),
            target_layouts: LayoutIndex::new(),
            base_highlights: HighlightMap::new(),
            target_highlights: HighlightMap::new(),
        }
    }

    pub fn summary(&self) -> &CompareSummary {
        &self.summary
    }

    pub fn base_page_count(&self) -> u32 {
        self.base_page_count
    }

    pub fn target_page_count(&self) -> u32 {
        self.target_page_count
    }

    /// Store a freshly captured base layout and refresh its page
    pub fn set_base_layout(&mut self, layout: PageTextLayout) -> PageUpdate {
        let page = layout.page;
        self.base_layouts.insert(layout);
        self.update_page(page)
    }

    /// Store a freshly captured target layout and refresh its page
    pub fn set_target_layout(&mut self, layout: PageTextLayout) -> PageUpdate {
        let page = layout.page;
        self.target_layouts.insert(layout);
        self.update_page(page)
    }

    pub fn base_layouts(&self) -> &LayoutIndex {
        &self.base_layouts
    }

    pub fn target_layouts(&self) -> &LayoutIndex {
        &self.target_layouts
    }

    /// Recompute highlights for one page
    ///
    /// Safe to call at any time and in any order: a page whose layouts are not all captured
    /// is left untouched and reported as [`PageUpdate::Pending`].
    pub fn update_page(&mut self, page: u32) -> PageUpdate {
        if !self.summary.is_changed(page) {
            self.store_highlights(page, Vec::new(), Vec::new());
            return PageUpdate::Unchanged;
        }

        let base_exists = (1..=self.base_page_count).contains(&page);
        let target_exists = (1..=self.target_page_count).contains(&page);
        let base_layout = self.base_layouts.get(page).filter(|_| base_exists);
        let target_layout = self.target_layouts.get(page).filter(|_| target_exists);

        let (base_rects, target_rects) = match (base_exists, target_exists) {
            (true, true) => {
                let (Some(base), Some(target)) = (base_layout, target_layout) else {
                    trace!("page {page}: waiting for both layouts");
                    return PageUpdate::Pending;
                };

                let ranges = self.differ.diff(&base.text, &target.text);
                (rects_for_ranges(base, &ranges.base), rects_for_ranges(target, &ranges.target))
            }
            (true, false) => {
                let Some(base) = base_layout else {
                    trace!("page {page}: waiting for base layout");
                    return PageUpdate::Pending;
                };

                (whole_page_rects(base), Vec::new())
            }
            (false, true) => {
                let Some(target) = target_layout else {
                    trace!("page {page}: waiting for target layout");
                    return PageUpdate::Pending;
                };

                (Vec::new(), whole_page_rects(target))
            }
            (false, false) => {
                trace!("page {page}: outside both documents");
                self.store_highlights(page, Vec::new(), Vec::new());
                return PageUpdate::Unchanged;
            }
        };

        let update = PageUpdate::Highlighted {
            base_rects: base_rects.len(),
            target_rects: target_rects.len(),
        };
        debug!(
            "page {page}: {} base and {} target highlight rects",
            base_rects.len(),
            target_rects.len()
        );
        self.store_highlights(page, base_rects, target_rects);
        update
    }

    /// Drop every highlight and recompute all changed pages
    pub fn update_all_pages(&mut self) -> Vec<(u32, PageUpdate)> {
        self.base_highlights.clear();
        self.target_highlights.clear();

        let pages = self.summary.changed_pages.clone();
        pages.into_iter().map(|page| (page, self.update_page(page))).collect()
    }

    /// Forget all captured layouts and highlights, e.g. after a zoom change re-renders pages
    pub fn invalidate_layouts(&mut self) {
        self.base_layouts.clear();
        self.target_layouts.clear();
        self.base_highlights.clear();
        self.target_highlights.clear();
    }

    pub fn base_highlights(&self, page: u32) -> Option<&[NormalizedRect]> {
        self.base_highlights.get(&page).map(Vec::as_slice)
    }

    pub fn target_highlights(&self, page: u32) -> Option<&[NormalizedRect]> {
        self.target_highlights.get(&page).map(Vec::as_slice)
    }

    pub fn base_highlight_map(&self) -> &HighlightMap {
        &self.base_highlights
    }

    pub fn target_highlight_map(&self) -> &HighlightMap {
        &self.target_highlights
    }

    fn store_highlights(
        &mut self,
        page: u32,
        base_rects: Vec<NormalizedRect>,
        target_rects: Vec<NormalizedRect>,
    ) {
        store_or_remove(&mut self.base_highlights, page, base_rects);
        store_or_remove(&mut self.target_highlights, page, target_rects);
    }
}

fn whole_page_rects(layout: &PageTextLayout) -> Vec<NormalizedRect> {
    rects_for_ranges(layout, &[OffsetRange::new(0, layout.char_len())])
}

fn store_or_remove(map: &mut HighlightMap, page: u32, rects: Vec<NormalizedRect>) {
    if rects.is_empty() {
        map.remove(&page);
    } else {
        map.insert(page, rects);
    }
}
