use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, warn};
use pdf_compare_core::{
    capture_text_layout, rects_for_query, search_pages, ClientRect, CompareConfig,
    CompareSession, CompareSummary, DiffStrategy, HighlightMap, OffsetRange, PageTextLayout,
    PageUpdate, SearchHit, TextDiffer, TextRun,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "pdf-compare")]
#[command(about = "Compare page text of two PDF renders and project the differences")]
pub struct Cli {
    /// JSON file with compare settings.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the largest LCS table the token diff may allocate.
    #[arg(long, global = true, value_name = "CELLS")]
    cell_budget: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Diff two plain text files and print the unmatched char ranges.
    Diff {
        #[arg(value_name = "BASE")]
        base: PathBuf,
        #[arg(value_name = "TARGET")]
        target: PathBuf,
    },
    /// Capture a page text layout from rendered text runs.
    Capture {
        #[arg(value_name = "RUNS_JSON")]
        runs: PathBuf,
    },
    /// Compare two documents' page layouts and print highlight rectangles.
    Compare {
        #[arg(value_name = "BASE_JSON")]
        base: PathBuf,
        #[arg(value_name = "TARGET_JSON")]
        target: PathBuf,
    },
    /// Search a document's page layouts.
    Search {
        #[arg(value_name = "LAYOUTS_JSON")]
        layouts: PathBuf,
        #[arg(long)]
        query: String,
    },
    /// Print CLI version.
    Version,
}

/// Rendered text runs for one page
#[derive(Debug, Deserialize)]
struct CaptureInput {
    page: u32,
    content_box: ClientRect,
    runs: Vec<TextRun>,
}

/// Captured layouts for one document
///
/// `page_count` defaults to the highest page number present.
#[derive(Debug, Deserialize)]
struct LayoutDocument {
    #[serde(default)]
    page_count: Option<u32>,
    pages: Vec<PageTextLayout>,
}

impl LayoutDocument {
    fn page_count(&self) -> u32 {
        self.page_count
            .unwrap_or_else(|| self.pages.iter().map(|layout| layout.page).max().unwrap_or(0))
    }

    /// Page texts in page order; pages without a layout count as empty
    fn page_texts(&self) -> Vec<&str> {
        (1..=self.page_count())
            .map(|page| {
                self.pages
                    .iter()
                    .find(|layout| layout.page == page)
                    .map_or("", |layout| layout.text.as_str())
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct DiffOutput {
    strategy: DiffStrategy,
    base: Vec<OffsetRange>,
    target: Vec<OffsetRange>,
}

#[derive(Debug, Serialize)]
struct CompareOutput<'a> {
    summary: &'a CompareSummary,
    note: &'static str,
    pending_pages: Vec<u32>,
    base_highlights: &'a HighlightMap,
    target_highlights: &'a HighlightMap,
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    hits: Vec<SearchHit>,
    highlights: HighlightMap,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let config = load_config(cli.config.as_deref(), cli.cell_budget)?;

    match cli.command {
        Commands::Diff { base, target } => run_diff(&base, &target, &config),
        Commands::Capture { runs } => run_capture(&runs),
        Commands::Compare { base, target } => run_compare(&base, &target, &config),
        Commands::Search { layouts, query } => run_search(&layouts, &query, &config),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, cell_budget: Option<usize>) -> Result<CompareConfig> {
    let mut config = match path {
        Some(path) => {
            ensure_file_exists(path)?;
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            CompareConfig::from_json_str(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => CompareConfig::default(),
    };

    if let Some(cell_budget) = cell_budget {
        config = config.with_cell_budget(cell_budget);
        config.validate().context("invalid --cell-budget")?;
    }

    debug!("using {config:?}");
    Ok(config)
}

fn run_diff(base: &Path, target: &Path, config: &CompareConfig) -> Result<()> {
    let base_text = read_text(base)?;
    let target_text = read_text(target)?;

    let outcome = TextDiffer::new(config.diff).diff_with_strategy(&base_text, &target_text);
    let payload = DiffOutput {
        strategy: outcome.strategy,
        base: outcome.ranges.base,
        target: outcome.ranges.target,
    };

    print_json(&payload)
}

fn run_capture(runs: &Path) -> Result<()> {
    let input: CaptureInput = read_json(runs)?;

    let layout = capture_text_layout(input.page, &input.runs, &input.content_box)
        .with_context(|| format!("page {} content box is not laid out", input.page))?;

    print_json(&layout)
}

fn run_compare(base: &Path, target: &Path, config: &CompareConfig) -> Result<()> {
    let base_doc = read_layouts(base)?;
    let target_doc = read_layouts(target)?;

    let summary = CompareSummary::from_page_texts(
        base_doc.page_texts().as_slice(),
        target_doc.page_texts().as_slice(),
    );
    let mut session =
        CompareSession::new(base_doc.page_count(), target_doc.page_count(), summary, config);

    for layout in base_doc.pages {
        session.set_base_layout(layout);
    }
    for layout in target_doc.pages {
        session.set_target_layout(layout);
    }

    let pending_pages = session
        .update_all_pages()
        .into_iter()
        .filter(|(_, update)| *update == PageUpdate::Pending)
        .map(|(page, _)| page)
        .collect();

    let payload = CompareOutput {
        summary: session.summary(),
        note: session.summary().note.message(),
        pending_pages,
        base_highlights: session.base_highlight_map(),
        target_highlights: session.target_highlight_map(),
    };

    print_json(&payload)
}

fn run_search(layouts: &Path, query: &str, config: &CompareConfig) -> Result<()> {
    let doc = read_layouts(layouts)?;

    let hits = search_pages(
        doc.pages.iter().map(|layout| (layout.page, layout.text.as_str())),
        query,
        &config.search,
    );

    let highlights: HighlightMap = doc
        .pages
        .iter()
        .map(|layout| (layout.page, rects_for_query(layout, query, &config.search)))
        .filter(|(_, rects)| !rects.is_empty())
        .collect();

    print_json(&SearchOutput { hits, highlights })
}

fn read_layouts(path: &Path) -> Result<LayoutDocument> {
    let mut doc: LayoutDocument = read_json(path)?;
    doc.pages.sort_by_key(|layout| layout.page);

    for layout in &doc.pages {
        if let Err(error) = layout.validate() {
            warn!("rejecting layout from {}: {error}", path.display());
            return Err(error).with_context(|| format!("invalid layout in {}", path.display()));
        }
    }

    Ok(doc)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = read_text(path)?;
    serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    ensure_file_exists(path)?;
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(payload: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;
    println!("{json}");
    Ok(())
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
