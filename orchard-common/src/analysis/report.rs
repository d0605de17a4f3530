//! Report composition and pagination
//!
//! [`compose`] turns observations into report sections (one per record, or a
//! single aggregate section). [`layout`] places those sections on fixed-height
//! pages, and [`render_text`] produces the downloadable document.
//!
//! # Pagination rules
//!
//! - Sections flow top to bottom; table rows that do not fit continue on a
//!   new page with the table header repeated. A header always shares its
//!   page with at least one row.
//! - The summary-code block never splits: when the space left after the
//!   table cannot hold it, a new page starts before the block.
//! - Per-record documents start every record after the first on a new page.
//!   Aggregate documents hold a single section, so they never break by
//!   record count.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::aggregate::{aggregate, aggregate_one, Distribution};
use super::catalog::{numbered, NO_RECOMMENDATION};
use super::dominance::{resolve, DominantEntry};
use super::summary_code::{self, SummaryPayload};
use super::{AnalysisConfig, Observation};
use crate::time;

/// Title of the aggregate section
pub const AGGREGATE_TITLE: &str = "Garden Analysis Report";

/// Title of a single-observation document
pub const SINGLE_RECORD_TITLE: &str = "Disease Analysis Report";

/// Body of a record section whose observation yielded no data
pub const NO_DATA_TEXT: &str = "No data available for this record";

/// Body of the aggregate section when no observation yielded data
pub const NO_GARDEN_DATA_TEXT: &str = "No data available for the garden";

/// Label printed above each summary code
pub const SUMMARY_LABEL: &str = "Scan summary code for quick access:";

/// Status column value of the dominant row
pub const DOMINANT_FLAG: &str = "Highest";

const SUMMARY_WRAP: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// One section per observation, one observation per page
    PerRecord,
    /// One section over all observations
    Aggregate,
    /// A single observation on its own
    SingleRecord,
}

impl ReportMode {
    pub fn document_title(&self) -> &'static str {
        match self {
            ReportMode::PerRecord => "All Records Report",
            ReportMode::Aggregate => AGGREGATE_TITLE,
            ReportMode::SingleRecord => SINGLE_RECORD_TITLE,
        }
    }

    /// Stem of the suggested download filename
    pub fn filename_stem(&self) -> &'static str {
        match self {
            ReportMode::PerRecord => "all-records-report",
            ReportMode::Aggregate => "garden-analysis",
            ReportMode::SingleRecord => "disease-analysis",
        }
    }

    /// Body printed in place of the table when a section has no data
    pub fn placeholder_text(&self) -> &'static str {
        match self {
            ReportMode::Aggregate => NO_GARDEN_DATA_TEXT,
            ReportMode::PerRecord | ReportMode::SingleRecord => NO_DATA_TEXT,
        }
    }
}

/// One table row of a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRow {
    pub category: String,
    pub percentage: f64,
    pub is_dominant: bool,
    /// Recommendation lines; only the dominant row has any
    pub recommendation: Vec<String>,
}

impl SectionRow {
    pub fn percentage_text(&self) -> String {
        format!("{:.2}%", self.percentage)
    }

    fn line_count(&self) -> usize {
        self.recommendation.len().max(1)
    }
}

/// One segment of a report document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    /// Secondary line under the title (trees analyzed)
    pub metadata: Option<String>,
    pub distribution: Distribution,
    pub dominant: DominantEntry,
    /// Catalog actions for the dominant category (empty when unknown)
    pub recommendations: Vec<String>,
    pub rows: Vec<SectionRow>,
    pub summary_code: String,
    /// True when the section renders the "no data" placeholder
    pub placeholder: bool,
}

impl ReportSection {
    fn build(
        title: String,
        metadata: Option<String>,
        distribution: Distribution,
        config: &AnalysisConfig,
    ) -> Self {
        let dominant = resolve(&distribution);
        if dominant.is_no_data() {
            return Self::placeholder(title, metadata, distribution);
        }

        let recommendations = config.catalog.recommend(&dominant.category).to_vec();
        if recommendations.is_empty() {
            debug!("No catalog entry for dominant category '{}'", dominant.category);
        }

        let rows = distribution
            .iter()
            .map(|share| {
                let is_dominant = share.category == dominant.category;
                SectionRow {
                    category: share.category.clone(),
                    percentage: share.percentage,
                    is_dominant,
                    recommendation: if is_dominant {
                        recommendation_lines(&recommendations)
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect();

        let summary_code = encoded_summary(&title, &distribution, &dominant, &recommendations);

        Self {
            title,
            metadata,
            distribution,
            dominant,
            recommendations,
            rows,
            summary_code,
            placeholder: false,
        }
    }

    fn placeholder(title: String, metadata: Option<String>, distribution: Distribution) -> Self {
        let dominant = DominantEntry::no_data();
        let summary_code = encoded_summary(&title, &distribution, &dominant, &[]);
        Self {
            title,
            metadata,
            distribution,
            dominant,
            recommendations: Vec::new(),
            rows: Vec::new(),
            summary_code,
            placeholder: true,
        }
    }

    /// The dominant row's table text: numbered actions or the fallback line
    pub fn recommendation_text(&self) -> String {
        recommendation_lines(&self.recommendations).join("\n")
    }
}

fn encoded_summary(
    title: &str,
    distribution: &Distribution,
    dominant: &DominantEntry,
    recommendations: &[String],
) -> String {
    let payload = SummaryPayload::new(title, distribution, dominant, recommendations);
    summary_code::encode(&payload).unwrap_or_else(|e| {
        warn!("Section '{}' rendered without summary code: {}", title, e);
        String::new()
    })
}

fn recommendation_lines(recommendations: &[String]) -> Vec<String> {
    if recommendations.is_empty() {
        vec![NO_RECOMMENDATION.to_string()]
    } else {
        numbered(recommendations)
    }
}

/// Build report sections for the given observations
///
/// A malformed observation in per-record mode becomes a placeholder section;
/// composition of the remaining records continues.
pub fn compose(
    observations: &[Observation],
    mode: ReportMode,
    config: &AnalysisConfig,
) -> Vec<ReportSection> {
    let known = config.catalog.categories();
    let policy = config.unknown_categories;

    match mode {
        ReportMode::PerRecord | ReportMode::SingleRecord => observations
            .iter()
            .enumerate()
            .map(|(index, observation)| {
                let title = record_title(index, observation);
                match aggregate_one(observation, known, policy) {
                    Ok(distribution) => ReportSection::build(title, None, distribution, config),
                    Err(e) => {
                        warn!("Observation {} rendered as placeholder: {}", observation.id, e);
                        ReportSection::placeholder(title, None, aggregate(&[], known, policy))
                    }
                }
            })
            .collect(),
        ReportMode::Aggregate => {
            let distribution = aggregate(observations, known, policy);
            vec![ReportSection::build(
                AGGREGATE_TITLE.to_string(),
                trees_analyzed(observations),
                distribution,
                config,
            )]
        }
    }
}

fn record_title(index: usize, observation: &Observation) -> String {
    let when = time::format_display(&observation.timestamp);
    match observation.tree_label() {
        Some(tree) => format!("Tree ID: {} - {}", tree, when),
        None => format!("Record {} - {}", index + 1, when),
    }
}

/// Unique tree labels in first-seen order
pub fn tree_ids(observations: &[Observation]) -> Vec<String> {
    let mut seen = HashSet::new();
    observations
        .iter()
        .filter_map(Observation::tree_label)
        .filter(|tree| seen.insert(*tree))
        .map(str::to_string)
        .collect()
}

fn trees_analyzed(observations: &[Observation]) -> Option<String> {
    let trees = tree_ids(observations);
    (!trees.is_empty()).then(|| format!("Trees analyzed: {}", trees.join(", ")))
}

/// Page dimensions and block heights, in page units (millimetres on A4)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub page_height: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
    /// Height of the title and metadata lines
    pub title_height: f64,
    /// Height of one text line inside a table cell
    pub row_line_height: f64,
    /// Padding above and below each table cell
    pub row_padding: f64,
    /// Label plus code; never split across pages
    pub summary_block_height: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_height: 297.0,
            top_margin: 20.0,
            bottom_margin: 10.0,
            title_height: 10.0,
            row_line_height: 5.0,
            row_padding: 4.0,
            summary_block_height: 60.0,
        }
    }
}

impl PageGeometry {
    fn limit(&self) -> f64 {
        self.page_height - self.bottom_margin
    }

    fn row_height(&self, lines: usize) -> f64 {
        lines as f64 * self.row_line_height + 2.0 * self.row_padding
    }
}

/// A placed piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Title { text: String },
    Metadata { text: String },
    Placeholder { text: String },
    TableHeader,
    TableRow { row: SectionRow },
    SummaryCode { label: String, code: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedBlock {
    /// Top edge, measured from the top of the page
    pub y: f64,
    pub height: f64,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    pub blocks: Vec<PlacedBlock>,
}

/// A laid-out report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub mode: ReportMode,
    pub pages: Vec<Page>,
    /// Page index on which each section starts
    pub section_pages: Vec<usize>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

struct PageCursor<'g> {
    geometry: &'g PageGeometry,
    pages: Vec<Page>,
    y: f64,
}

impl<'g> PageCursor<'g> {
    fn new(geometry: &'g PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            y: geometry.top_margin,
        }
    }

    fn page_index(&self) -> usize {
        self.pages.len() - 1
    }

    fn is_fresh(&self) -> bool {
        self.pages.last().map_or(true, |page| page.blocks.is_empty())
    }

    fn fits(&self, height: f64) -> bool {
        self.y + height <= self.geometry.limit()
    }

    fn new_page(&mut self) {
        if !self.is_fresh() {
            self.pages.push(Page::default());
        }
        self.y = self.geometry.top_margin;
    }

    /// Place a block, starting a new page first when it does not fit
    fn place(&mut self, height: f64, block: Block) {
        if !self.fits(height) {
            self.new_page();
        }
        self.push(height, block);
    }

    /// Place a block at the cursor without checking the remaining space
    fn push(&mut self, height: f64, block: Block) {
        let y = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.blocks.push(PlacedBlock { y, height, block });
        }
        self.y += height;
    }
}

/// Place a table header and its rows
///
/// The header never ends a page on its own: it moves with the first row,
/// and is repeated above the first row of every continuation page. A row
/// taller than the space below a fresh header overruns the bottom margin.
fn place_table(cursor: &mut PageCursor<'_>, rows: &[SectionRow], geometry: &PageGeometry) {
    let header_height = geometry.row_height(1);
    let mut rows = rows.iter();

    let Some(first) = rows.next() else {
        cursor.place(header_height, Block::TableHeader);
        return;
    };
    let height = geometry.row_height(first.line_count());
    if !cursor.fits(header_height + height) {
        cursor.new_page();
    }
    cursor.push(header_height, Block::TableHeader);
    cursor.push(height, Block::TableRow { row: first.clone() });

    for row in rows {
        let height = geometry.row_height(row.line_count());
        if !cursor.fits(height) {
            cursor.new_page();
            cursor.push(header_height, Block::TableHeader);
        }
        cursor.push(height, Block::TableRow { row: row.clone() });
    }
}

/// Lay sections out on pages
pub fn layout(sections: &[ReportSection], mode: ReportMode, geometry: &PageGeometry) -> ReportDocument {
    let mut cursor = PageCursor::new(geometry);
    let mut section_pages = Vec::with_capacity(sections.len());

    for (index, section) in sections.iter().enumerate() {
        // Only per-record documents carry more than one section
        if index > 0 {
            cursor.new_page();
        }

        cursor.place(
            geometry.title_height,
            Block::Title {
                text: section.title.clone(),
            },
        );
        section_pages.push(cursor.page_index());

        if let Some(metadata) = &section.metadata {
            cursor.place(
                geometry.title_height,
                Block::Metadata {
                    text: metadata.clone(),
                },
            );
        }

        if section.placeholder {
            cursor.place(
                geometry.title_height,
                Block::Placeholder {
                    text: mode.placeholder_text().to_string(),
                },
            );
        } else {
            place_table(&mut cursor, &section.rows, geometry);
        }

        cursor.place(
            geometry.summary_block_height,
            Block::SummaryCode {
                label: SUMMARY_LABEL.to_string(),
                code: section.summary_code.clone(),
            },
        );
    }

    ReportDocument {
        title: mode.document_title().to_string(),
        mode,
        pages: cursor.pages,
        section_pages,
    }
}

/// Compose and lay out in one step
pub fn compose_document(
    observations: &[Observation],
    mode: ReportMode,
    config: &AnalysisConfig,
    geometry: &PageGeometry,
) -> ReportDocument {
    layout(&compose(observations, mode, config), mode, geometry)
}

/// Render a document as plain text, pages separated by form feeds
pub fn render_text(document: &ReportDocument) -> String {
    let total = document.pages.len();
    let mut out = String::new();

    out.push_str(&document.title);
    out.push('\n');
    out.push_str(&"=".repeat(document.title.chars().count()));
    out.push_str("\n\n");

    for (index, page) in document.pages.iter().enumerate() {
        if index > 0 {
            out.push('\u{000C}');
            out.push('\n');
        }
        for placed in &page.blocks {
            render_block(&mut out, &placed.block);
        }
        out.push_str(&format!("\n-- Page {} of {} --\n", index + 1, total));
    }

    out
}

fn render_block(out: &mut String, block: &Block) {
    match block {
        Block::Title { text } => {
            out.push_str(text);
            out.push('\n');
        }
        Block::Metadata { text } | Block::Placeholder { text } => {
            out.push_str(text);
            out.push_str("\n\n");
        }
        Block::TableHeader => {
            out.push_str(&table_line("Disease", "Value", "Status", "Treatment Suggestions"));
            out.push_str(&"-".repeat(72));
            out.push('\n');
        }
        Block::TableRow { row } => {
            let status = if row.is_dominant { DOMINANT_FLAG } else { "" };
            let mut lines = row.recommendation.iter();
            let first = lines.next().map(String::as_str).unwrap_or("");
            out.push_str(&table_line(&row.category, &row.percentage_text(), status, first));
            for line in lines {
                out.push_str(&table_line("", "", "", line));
            }
        }
        Block::SummaryCode { label, code } => {
            out.push('\n');
            out.push_str(label);
            out.push('\n');
            for chunk in code.as_bytes().chunks(SUMMARY_WRAP) {
                out.push_str("  ");
                out.push_str(&String::from_utf8_lossy(chunk));
                out.push('\n');
            }
            out.push('\n');
        }
    }
}

fn table_line(category: &str, value: &str, status: &str, suggestion: &str) -> String {
    format!("{:<24} {:>9}  {:<8} {}", category, value, status, suggestion)
        .trim_end()
        .to_string()
        + "\n"
}
