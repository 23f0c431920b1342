//! PDF rendering via genpdf
//!
//! Every page carries the report title as a bold centered header and a
//! centered "Page N" footer. Tables are drawn with full cell borders.

use crate::document::{Block, ReportDocument, TableBlock};
use crate::error::ReportError;
use genpdf::elements::{Break, FrameCellDecorator, LinearLayout, Paragraph, TableLayout, UnorderedList};
use genpdf::render::Area;
use genpdf::style::Style;
use genpdf::{Alignment, Context, Document, Element as _, Mm, PageDecorator, Position, SimplePageDecorator};
use migaudit_core::ReportSettings;
use std::path::PathBuf;

const MARGIN_MM: i32 = 10;
const FOOTER_HEIGHT_MM: i32 = 8;
const BODY_FONT_SIZE: u8 = 10;
const HEADING_FONT_SIZE: u8 = 14;
const TABLE_TITLE_FONT_SIZE: u8 = 12;

/// Page decorator adding the running header and the page-number footer
struct AuditPageDecorator {
    inner: SimplePageDecorator,
    page: usize,
}

impl AuditPageDecorator {
    fn new(title: String) -> Self {
        let mut inner = SimplePageDecorator::new();
        inner.set_margins(MARGIN_MM);
        inner.set_header(move |_page| {
            let mut layout = LinearLayout::vertical();
            layout.push(
                Paragraph::new(title.clone())
                    .aligned(Alignment::Center)
                    .styled(Style::new().bold()),
            );
            layout.push(Break::new(1));
            layout
        });
        Self { inner, page: 0 }
    }
}

impl PageDecorator for AuditPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        area: Area<'a>,
        style: Style,
    ) -> Result<Area<'a>, genpdf::error::Error> {
        self.page += 1;
        let mut area = self.inner.decorate_page(context, area, style)?;

        let footer_height = Mm::from(FOOTER_HEIGHT_MM);
        let body_height = area.size().height - footer_height;

        let mut footer_area = area.clone();
        footer_area.add_offset(Position::new(0, body_height));
        let mut footer = Paragraph::new(format!("Page {}", self.page)).aligned(Alignment::Center);
        footer.render(context, footer_area, style)?;

        area.set_height(body_height);
        Ok(area)
    }
}

/// Lays out a report document as PDF
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    font_dir: PathBuf,
    font_family: String,
}

impl PdfRenderer {
    pub fn new(font_dir: impl Into<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            font_dir: font_dir.into(),
            font_family: font_family.into(),
        }
    }

    pub fn from_settings(settings: &ReportSettings) -> Self {
        Self::new(settings.font_dir.clone(), settings.font_family.clone())
    }

    fn load_fonts(&self) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, ReportError> {
        genpdf::fonts::from_files(&self.font_dir, &self.font_family, None).map_err(|e| {
            ReportError::FontError(format!(
                "cannot load font family {} from {}: {}",
                self.font_family,
                self.font_dir.display(),
                e
            ))
        })
    }

    /// Render the document to PDF bytes
    pub fn render(&self, report: &ReportDocument) -> Result<Vec<u8>, ReportError> {
        let fonts = self.load_fonts()?;

        let mut doc = Document::new(fonts);
        doc.set_title(report.title.clone());
        doc.set_font_size(BODY_FONT_SIZE);
        doc.set_page_decorator(AuditPageDecorator::new(report.title.clone()));

        for block in &report.blocks {
            match block {
                Block::Heading(text) => {
                    doc.push(Break::new(1));
                    doc.push(Paragraph::new(text.clone()).styled(Style::new().bold().with_font_size(HEADING_FONT_SIZE)));
                    doc.push(Break::new(0.5));
                }
                Block::Paragraph(text) => {
                    doc.push(Paragraph::new(text.clone()));
                    doc.push(Break::new(0.5));
                }
                Block::Bullets(items) => {
                    let mut list = UnorderedList::new();
                    for item in items {
                        list.push(Paragraph::new(item.clone()));
                    }
                    doc.push(list);
                    doc.push(Break::new(0.5));
                }
                Block::Table(table) => {
                    doc.push(
                        Paragraph::new(table.title.clone())
                            .styled(Style::new().bold().with_font_size(TABLE_TITLE_FONT_SIZE)),
                    );
                    doc.push(Break::new(0.5));
                    doc.push(table_layout(table)?);
                    doc.push(Break::new(1));
                }
            }
        }

        let mut bytes = Vec::new();
        doc.render(&mut bytes)
            .map_err(|e| ReportError::RenderError(e.to_string()))?;

        tracing::debug!(size = bytes.len(), "Rendered PDF report");
        Ok(bytes)
    }
}

fn table_layout(table: &TableBlock) -> Result<TableLayout, ReportError> {
    let mut layout = TableLayout::new(table.column_weights());
    layout.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let mut header = layout.row();
    for title in &table.headers {
        header.push_element(
            Paragraph::new(title.clone())
                .styled(Style::new().bold())
                .padded(1),
        );
    }
    header
        .push()
        .map_err(|e| ReportError::RenderError(format!("table {}: {}", table.title, e)))?;

    for row in 0..table.rows.len() {
        let mut cells = layout.row();
        for column in 0..table.column_count() {
            cells.push_element(Paragraph::new(table.cell(row, column).to_string()).padded(1));
        }
        cells
            .push()
            .map_err(|e| ReportError::RenderError(format!("table {}: {}", table.title, e)))?;
    }

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fonts_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PdfRenderer::new(dir.path(), "NoSuchFont");

        let err = renderer.render(&ReportDocument::new("Audit")).unwrap_err();
        assert!(matches!(err, ReportError::FontError(_)));
        assert!(err.to_string().contains("NoSuchFont"));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let table = TableBlock::new("t", &["a", "b"])
            .with_row(vec!["1".to_string()])
            .with_row(vec!["1".to_string(), "2".to_string(), "3".to_string()]);
        assert!(table_layout(&table).is_ok());
    }
}
