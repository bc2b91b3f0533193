//! Plain-text summary table written to `index.txt`.

use crate::item::Item;
use crate::titlepath::{self, ELLIPSIS};

/// Excerpt shown for snippets that have none.
pub const NO_EXCERPT: &str = "<no excerpt available>";

/// Column headers of the summary table.
pub const HEADERS: [&str; 4] = ["ID", "Excerpt", "Path", "Keywords"];

/// Space between columns.
const COLUMN_GAP: &str = "  ";

const LINE_BREAKS: [char; 2] = ['\n', '\r'];

/// Every row of the table is one line, so cell text must not break.
fn single_line(text: &str) -> String {
    text.replace(LINE_BREAKS, " ")
}

/// Bounds applied to the title path column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexLayout {
    /// Maximum characters of a rendered title path.
    pub title_width: usize,
    /// Trailing characters kept when a title path is truncated.
    pub title_tail: usize,
}

impl Default for IndexLayout {
    fn default() -> Self {
        Self {
            title_width: titlepath::DEFAULT_WIDTH,
            title_tail: titlepath::DEFAULT_TAIL,
        }
    }
}

/// One line of the summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    /// Cache key.
    pub key: String,
    /// Snippet excerpt, or [`NO_EXCERPT`].
    pub excerpt: String,
    /// Truncated title path.
    pub path: String,
    /// Comma-separated keyword terms.
    pub keywords: String,
}

impl SummaryRow {
    /// Builds the row describing `item` stored under `key`.
    pub fn new(key: &str, item: &Item, layout: IndexLayout) -> Self {
        let titles: Vec<String> = item.titlepath.iter().map(|t| single_line(t)).collect();
        let keywords: Vec<String> = item.keyword_terms().map(single_line).collect();
        Self {
            key: key.to_string(),
            excerpt: item
                .snippet
                .excerpt()
                .map(|e| e.replace(LINE_BREAKS, ""))
                .unwrap_or_else(|| NO_EXCERPT.to_string()),
            path: titlepath::join(&titles, layout.title_width, layout.title_tail, ELLIPSIS),
            keywords: keywords.join(","),
        }
    }

    fn cells(&self) -> [&str; 4] {
        [
            self.key.as_str(),
            self.excerpt.as_str(),
            self.path.as_str(),
            self.keywords.as_str(),
        ]
    }
}

/// Renders `rows` as a left-aligned table under [`HEADERS`].
pub fn render(rows: &[SummaryRow]) -> String {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, HEADERS, &widths);
    for row in rows {
        push_line(&mut out, row.cells(), &widths);
    }
    out
}

fn push_line(out: &mut String, cells: [&str; 4], widths: &[usize; 4]) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str(COLUMN_GAP);
        }
        line.push_str(cell);
        let pad = width - cell.chars().count();
        line.extend(std::iter::repeat(' ').take(pad));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
