//! Renderer-independent report layout

use serde::{Deserialize, Serialize};

/// Running title printed at the top of every page
pub const REPORT_TITLE: &str = "Migration Audit Report";

/// A bordered table with a caption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,

    /// Relative column widths; equal when absent
    pub weights: Option<Vec<usize>>,
}

impl TableBlock {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            weights: None,
        }
    }

    pub fn with_row(mut self, row: Vec<String>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn with_weights(mut self, weights: Vec<usize>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Explicit weights when they fit the columns, otherwise equal shares
    pub fn column_weights(&self) -> Vec<usize> {
        match &self.weights {
            Some(w) if w.len() == self.column_count() && w.iter().all(|x| *x > 0) => w.clone(),
            _ => vec![1; self.column_count()],
        }
    }

    /// Cell text; missing cells are empty
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// One element of the report, in reading order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    Bullets(Vec<String>),
    Table(TableBlock),
}

/// Linear report document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    /// Running page header
    pub title: String,
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn heading(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Heading(text.into()));
    }

    pub fn paragraph(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph(text.into()));
    }

    pub fn bullets(&mut self, items: Vec<String>) {
        self.blocks.push(Block::Bullets(items));
    }

    pub fn table(&mut self, table: TableBlock) {
        self.blocks.push(Block::Table(table));
    }

    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Heading(h) => Some(h.as_str()),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Every paragraph and bullet item
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().flat_map(|b| match b {
            Block::Paragraph(p) => vec![p.as_str()],
            Block::Bullets(items) => items.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_default_to_equal() {
        let table = TableBlock::new("t", &["a", "b", "c"]);
        assert_eq!(table.column_weights(), vec![1, 1, 1]);

        let weighted = table.clone().with_weights(vec![2, 1, 1]);
        assert_eq!(weighted.column_weights(), vec![2, 1, 1]);

        let wrong_len = table.with_weights(vec![2, 1]);
        assert_eq!(wrong_len.column_weights(), vec![1, 1, 1]);
    }

    #[test]
    fn test_missing_cells_are_empty() {
        let table = TableBlock::new("t", &["a", "b"]).with_row(vec!["x".to_string()]);
        assert_eq!(table.cell(0, 0), "x");
        assert_eq!(table.cell(0, 1), "");
        assert_eq!(table.cell(5, 0), "");
    }

    #[test]
    fn test_document_accessors() {
        let mut doc = ReportDocument::new(REPORT_TITLE);
        doc.heading("Summary");
        doc.paragraph("hello");
        doc.bullets(vec!["one".to_string(), "two".to_string()]);
        doc.table(TableBlock::new("t", &["a"]));

        assert_eq!(doc.headings().collect::<Vec<_>>(), vec!["Summary"]);
        assert_eq!(doc.texts().collect::<Vec<_>>(), vec!["hello", "one", "two"]);
        assert_eq!(doc.tables().count(), 1);
    }
}
