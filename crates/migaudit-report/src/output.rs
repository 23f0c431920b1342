use crate::builder::ReportBuilder;
use crate::error::ReportError;
use crate::markdown::render_markdown;
use crate::pdf::PdfRenderer;
use chrono::{NaiveDate, NaiveDateTime};
use migaudit_core::{sanitize_table_name, ReportSettings};
use migaudit_engine::AuditResult;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Output format of a written report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

/// `audit_report_<table>_<analysis date>-<generation timestamp>.<ext>`
pub fn report_file_name(
    table_input: &str,
    analysis_date: NaiveDate,
    generated_at: NaiveDateTime,
    format: ReportFormat,
) -> String {
    format!(
        "audit_report_{}_{}-{}.{}",
        sanitize_table_name(table_input),
        analysis_date.format("%Y-%m-%d"),
        generated_at.format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}

/// Serialize the raw audit result
pub fn render_json(result: &AuditResult) -> Result<String, ReportError> {
    serde_json::to_string_pretty(result).map_err(|e| ReportError::SerializeError(e.to_string()))
}

/// Write `bytes` to a new file in `dir`, never overwriting an existing one
pub fn persist(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir)
        .map_err(|e| ReportError::IoError(format!("cannot create {}: {}", dir.display(), e)))?;

    let path = dir.join(file_name);
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => ReportError::AlreadyExists(path.display().to_string()),
            _ => ReportError::IoError(format!("cannot create {}: {}", path.display(), e)),
        })?;

    write_or_remove(file, &path, bytes)?;

    tracing::info!(path = %path.display(), size = bytes.len(), "Report written");
    Ok(path)
}

/// Write `bytes` into the freshly created `path`, deleting it again on failure
fn write_or_remove<W: Write>(mut file: W, path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    match file.write_all(bytes).and_then(|_| file.flush()) {
        Ok(()) => Ok(()),
        Err(e) => {
            drop(file);
            if let Err(remove) = fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %remove, "Cannot remove partial report");
            }
            Err(ReportError::IoError(format!("cannot write {}: {}", path.display(), e)))
        }
    }
}

/// Builds, renders and saves reports
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
    builder: ReportBuilder,
    pdf: PdfRenderer,
}

impl ReportWriter {
    pub fn new(settings: &ReportSettings) -> Self {
        Self {
            output_dir: settings.output_dir.clone(),
            builder: ReportBuilder::new(),
            pdf: PdfRenderer::from_settings(settings),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render `result` and save it; the file is only created once rendering succeeded
    pub fn write(&self, result: &AuditResult, format: ReportFormat) -> Result<PathBuf, ReportError> {
        let bytes = match format {
            ReportFormat::Pdf => self.pdf.render(&self.builder.build(result))?,
            ReportFormat::Markdown => render_markdown(&self.builder.build(result)).into_bytes(),
            ReportFormat::Json => render_json(result)?.into_bytes(),
        };

        let name = report_file_name(&result.table, result.analysis_date, result.generated_at, format);
        persist(&self.output_dir, &name, &bytes)
    }
}
