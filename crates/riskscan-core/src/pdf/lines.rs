//! Reading-order line reconstruction from positioned text runs.
//!
//! PDFs store glyphs where they are drawn, not in reading order. Runs are
//! ordered top-to-bottom, grouped into lines by a vertical tolerance band, and
//! each line is read left-to-right.

use std::cmp::Ordering;
use std::ops::Deref;

use serde::Serialize;

use super::TextRun;

/// Reconstructed document text, one entry per visual line, pages in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lines {
    lines: Vec<String>,
    page_starts: Vec<usize>,
}

impl Lines {
    /// Concatenate per-page lines.
    pub fn from_pages(pages: Vec<Vec<String>>) -> Self {
        let mut lines = Vec::new();
        let mut page_starts = Vec::with_capacity(pages.len());
        for page in pages {
            page_starts.push(lines.len());
            lines.extend(page);
        }
        Self { lines, page_starts }
    }

    /// Split flat text into trimmed, whitespace-collapsed, non-empty lines.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = text
            .lines()
            .map(collapse_whitespace)
            .filter(|l| !l.is_empty())
            .collect();
        Self {
            lines,
            page_starts: vec![0],
        }
    }

    /// Index of the first line of each page.
    pub fn page_starts(&self) -> &[usize] {
        &self.page_starts
    }

    /// The leading `n` lines.
    pub fn header(&self, n: usize) -> &[String] {
        &self.lines[..n.min(self.lines.len())]
    }
}

impl Deref for Lines {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.lines
    }
}

/// Collapse internal whitespace runs to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rebuild the lines of one page.
pub fn reconstruct_page(runs: &[TextRun], y_tolerance: f32) -> Vec<String> {
    let mut runs: Vec<&TextRun> = runs.iter().filter(|r| !r.text.trim().is_empty()).collect();

    runs.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut groups: Vec<Vec<&TextRun>> = Vec::new();
    let mut anchor = f32::NAN;

    for run in runs {
        // NaN anchor never joins, so the first run always opens a group
        if (run.y - anchor).abs() <= y_tolerance {
            if let Some(group) = groups.last_mut() {
                group.push(run);
                continue;
            }
        }
        anchor = run.y;
        groups.push(vec![run]);
    }

    groups
        .into_iter()
        .map(|mut group| {
            group.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
            let joined: Vec<&str> = group.iter().map(|r| r.text.as_str()).collect();
            collapse_whitespace(&joined.join(" "))
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Rebuild lines for every page and concatenate them in page order.
pub fn reconstruct(pages: &[Vec<TextRun>], y_tolerance: f32) -> Lines {
    Lines::from_pages(
        pages
            .iter()
            .map(|runs| reconstruct_page(runs, y_tolerance))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_groups_within_tolerance() {
        let runs = vec![
            TextRun::new(300.0, 700.0, "120"),
            TextRun::new(72.0, 701.5, "Visa"),
            TextRun::new(72.0, 680.0, "Mastercard"),
            TextRun::new(300.0, 679.0, "80"),
        ];

        assert_eq!(reconstruct_page(&runs, 3.0), vec!["Visa 120", "Mastercard 80"]);
    }

    #[test]
    fn test_drops_whitespace_runs_and_collapses() {
        let runs = vec![
            TextRun::new(10.0, 500.0, "Total   Sales"),
            TextRun::new(50.0, 500.0, "   "),
            TextRun::new(90.0, 500.0, " 200 "),
        ];

        assert_eq!(reconstruct_page(&runs, 3.0), vec!["Total Sales 200"]);
    }

    #[test]
    fn test_band_is_anchored_on_first_run() {
        // 700 -> 697.5 joins, 695 is 5 units from the anchor and starts a new line
        let runs = vec![
            TextRun::new(10.0, 700.0, "a"),
            TextRun::new(20.0, 697.5, "b"),
            TextRun::new(30.0, 695.0, "c"),
        ];

        assert_eq!(reconstruct_page(&runs, 3.0), vec!["a b", "c"]);
    }

    #[test]
    fn test_pages_concatenate_in_order() {
        let pages = vec![
            vec![TextRun::new(10.0, 700.0, "page one")],
            vec![],
            vec![TextRun::new(10.0, 700.0, "page three")],
        ];

        let lines = reconstruct(&pages, 3.0);
        assert_eq!(&lines[..], &["page one".to_string(), "page three".to_string()]);
        assert_eq!(lines.page_starts(), &[0, 1, 1]);
    }

    #[test]
    fn test_empty_runs_yield_no_lines() {
        let lines = reconstruct(&[Vec::new()], 3.0);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_from_text() {
        let lines = Lines::from_text("  Fraud   Count \n\n 12 \n");
        assert_eq!(&lines[..], &["Fraud Count".to_string(), "12".to_string()]);
    }
}
