//! Token-level text diff for page comparison
//!
//! Texts are split into whitespace-delimited tokens and aligned with a longest common
//! subsequence. Equal runs at both ends are matched up front, so the dynamic program only
//! covers the changed middle. When the middle is too large for the cell budget, or when one
//! side has no tokens at all, the whole comparison degrades to a single prefix/suffix
//! character diff, which is linear in the text length.
//!
//! All offsets are char offsets into the compared texts.

use crate::tokenizer::{tokenize, TextToken};
use log::debug;
use serde::{Deserialize, Serialize};

/// Largest DP table, in cells, the token diff will allocate
pub const DEFAULT_CELL_BUDGET: usize = 4_000_000;

/// Half-open char range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OffsetRange {
    pub start: usize,
    pub end: usize,
}

impl OffsetRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unmatched ranges on both sides of a comparison
///
/// `base` ranges index into the base text and `target` ranges into the target text. The two
/// lists have no positional correspondence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffRanges {
    pub base: Vec<OffsetRange>,
    pub target: Vec<OffsetRange>,
}

impl DiffRanges {
    /// Whether the two texts compared equal
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.target.is_empty()
    }
}

/// Algorithm that produced a [`DiffRanges`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffStrategy {
    /// At least one text was empty; the other is unmatched as a whole
    Whole,

    /// Token alignment with the bounded LCS
    Tokens,

    /// Character prefix/suffix diff because one text had no tokens
    CharsNoTokens,

    /// Character prefix/suffix diff because the LCS table exceeded the cell budget
    CharsOverBudget,
}

/// Result of a diff along with how it was computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOutcome {
    pub ranges: DiffRanges,
    pub strategy: DiffStrategy,
}

/// Tuning for the diff engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Maximum `(base_mid + 1) * (target_mid + 1)` the LCS table may have
    pub cell_budget: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self { cell_budget: DEFAULT_CELL_BUDGET }
    }
}

impl DiffConfig {
    /// Config with a custom cell budget
    pub fn with_cell_budget(cell_budget: usize) -> Self {
        Self { cell_budget }
    }
}

/// Diff engine configured with a cell budget
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDiffer {
    config: DiffConfig,
}

impl TextDiffer {
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Unmatched ranges between `base` and `target`
    pub fn diff(&self, base: &str, target: &str) -> DiffRanges {
        self.diff_with_strategy(base, target).ranges
    }

    /// Unmatched ranges plus the strategy that produced them
    pub fn diff_with_strategy(&self, base: &str, target: &str) -> DiffOutcome {
        if base.is_empty() || target.is_empty() {
            let ranges = whole_ranges(base, target);
            return DiffOutcome { ranges, strategy: DiffStrategy::Whole };
        }

        let base_tokens = tokenize(base);
        let target_tokens = tokenize(target);
        if base_tokens.is_empty() || target_tokens.is_empty() {
            debug!(
                "diff falling back to chars: no tokens (base {}, target {})",
                base_tokens.len(),
                target_tokens.len()
            );
            return DiffOutcome {
                ranges: simple_diff(base, target),
                strategy: DiffStrategy::CharsNoTokens,
            };
        }

        match match_tokens(&base_tokens, &target_tokens, self.config.cell_budget) {
            Ok(matches) => DiffOutcome {
                ranges: DiffRanges {
                    base: unmatched_ranges(&base_tokens, &matches.base),
                    target: unmatched_ranges(&target_tokens, &matches.target),
                },
                strategy: DiffStrategy::Tokens,
            },
            Err(exceeded) => {
                debug!(
                    "diff falling back to chars: {} cells exceed budget of {}",
                    exceeded.cells, self.config.cell_budget
                );
                DiffOutcome {
                    ranges: simple_diff(base, target),
                    strategy: DiffStrategy::CharsOverBudget,
                }
            }
        }
    }
}

/// Diff two texts with the default cell budget
pub fn diff_texts(base: &str, target: &str) -> DiffRanges {
    TextDiffer::default().diff(base, target)
}

/// Character diff that trims the common prefix and suffix
///
/// Reports at most one range per side: whatever is left between the shared prefix and the
/// shared suffix. The suffix never reaches back into the prefix.
pub fn simple_diff(base: &str, target: &str) -> DiffRanges {
    if base.is_empty() || target.is_empty() {
        return whole_ranges(base, target);
    }

    let base: Vec<char> = base.chars().collect();
    let target: Vec<char> = target.chars().collect();

    let prefix = base.iter().zip(&target).take_while(|(left, right)| left == right).count();

    let suffix = base[prefix..]
        .iter()
        .rev()
        .zip(target[prefix..].iter().rev())
        .take_while(|(left, right)| left == right)
        .count();

    DiffRanges {
        base: non_empty_range(prefix, base.len() - suffix),
        target: non_empty_range(prefix, target.len() - suffix),
    }
}

fn whole_ranges(base: &str, target: &str) -> DiffRanges {
    DiffRanges {
        base: non_empty_range(0, base.chars().count()),
        target: non_empty_range(0, target.chars().count()),
    }
}

fn non_empty_range(start: usize, end: usize) -> Vec<OffsetRange> {
    if start < end {
        vec![OffsetRange::new(start, end)]
    } else {
        Vec::new()
    }
}

/// Per-token match flags for both sides
#[derive(Debug, Clone, PartialEq, Eq)]
struct TokenMatches {
    base: Vec<bool>,
    target: Vec<bool>,
}

/// The LCS table for the middle section would need more cells than allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellBudgetExceeded {
    cells: usize,
}

fn match_tokens(
    base: &[TextToken],
    target: &[TextToken],
    cell_budget: usize,
) -> Result<TokenMatches, CellBudgetExceeded> {
    let mut matches =
        TokenMatches { base: vec![false; base.len()], target: vec![false; target.len()] };

    let mut start = 0;
    while start < base.len() && start < target.len() && base[start].value == target[start].value {
        matches.base[start] = true;
        matches.target[start] = true;
        start += 1;
    }

    let mut base_end = base.len();
    let mut target_end = target.len();
    while base_end > start
        && target_end > start
        && base[base_end - 1].value == target[target_end - 1].value
    {
        base_end -= 1;
        target_end -= 1;
        matches.base[base_end] = true;
        matches.target[target_end] = true;
    }

    let base_mid = &base[start..base_end];
    let target_mid = &target[start..target_end];
    if base_mid.is_empty() || target_mid.is_empty() {
        return Ok(matches);
    }

    let cells = match table_cells(base_mid.len(), target_mid.len()) {
        Some(cells) if cells <= cell_budget => cells,
        other => return Err(CellBudgetExceeded { cells: other.unwrap_or(usize::MAX) }),
    };

    let table = LcsTable::build(base_mid, target_mid, cells);

    // Walk back from the bottom-right corner. Ties step up, consuming a base token.
    let (mut i, mut j) = (base_mid.len(), target_mid.len());
    while i > 0 && j > 0 {
        if base_mid[i - 1].value == target_mid[j - 1].value {
            matches.base[start + i - 1] = true;
            matches.target[start + j - 1] = true;
            i -= 1;
            j -= 1;
        } else if table.get(i - 1, j) >= table.get(i, j - 1) {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    Ok(matches)
}

/// Cells an LCS table over `base_len` x `target_len` tokens needs, `None` on overflow
fn table_cells(base_len: usize, target_len: usize) -> Option<usize> {
    base_len.checked_add(1)?.checked_mul(target_len.checked_add(1)?)
}

/// Row-major LCS length table with one extra leading row and column of zeros
struct LcsTable {
    cols: usize,
    cells: Vec<u32>,
}

impl LcsTable {
    /// `len` must equal `(base.len() + 1) * (target.len() + 1)`
    fn build(base: &[TextToken], target: &[TextToken], len: usize) -> Self {
        let cols = target.len() + 1;
        let mut cells = vec![0u32; len];

        for (i, base_token) in base.iter().enumerate() {
            let row = (i + 1) * cols;
            let previous_row = i * cols;
            for (j, target_token) in target.iter().enumerate() {
                cells[row + j + 1] = if base_token.value == target_token.value {
                    cells[previous_row + j] + 1
                } else {
                    cells[previous_row + j + 1].max(cells[row + j])
                };
            }
        }

        Self { cols, cells }
    }

    fn get(&self, row: usize, col: usize) -> u32 {
        self.cells[row * self.cols + col]
    }
}

/// Collapse each run of unmatched tokens into one range, absorbing the whitespace inside it
fn unmatched_ranges(tokens: &[TextToken], matched: &[bool]) -> Vec<OffsetRange> {
    let mut ranges = Vec::new();
    let mut open: Option<OffsetRange> = None;

    for (token, &is_matched) in tokens.iter().zip(matched) {
        if is_matched {
            ranges.extend(open.take());
            continue;
        }

        match open.as_mut() {
            Some(range) => range.end = token.end,
            None => open = Some(OffsetRange::new(token.start, token.end)),
        }
    }

    ranges.extend(open);
    ranges
}
