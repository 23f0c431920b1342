//! Audit report generation
//!
//! An [`AuditResult`](migaudit_engine::AuditResult) is first turned into a
//! linear [`ReportDocument`] of headings, paragraphs, bullet lists and
//! tables. Renderers then lay that document out as PDF or Markdown, or the
//! raw result is exported as JSON. Every run writes a new, uniquely named
//! file.

pub mod error;
pub mod document;
pub mod builder;
pub mod markdown;
pub mod pdf;
pub mod output;

pub use builder::ReportBuilder;
pub use document::{Block, ReportDocument, TableBlock, REPORT_TITLE};
pub use error::ReportError;
pub use markdown::render_markdown;
pub use output::{persist, render_json, report_file_name, ReportFormat, ReportWriter};
pub use pdf::PdfRenderer;
