use crate::document::{Block, ReportDocument, TableBlock};

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn push_table(md: &mut String, table: &TableBlock) {
    md.push_str(&format!("**{}**\n\n", table.title));

    let columns = table.column_count();
    let headers: Vec<String> = table.headers.iter().map(|h| escape_cell(h)).collect();
    md.push_str(&format!("| {} |\n", headers.join(" | ")));
    md.push_str(&format!("|{}\n", " --- |".repeat(columns)));

    for row in 0..table.rows.len() {
        let cells: Vec<String> = (0..columns).map(|c| escape_cell(table.cell(row, c))).collect();
        md.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    md.push('\n');
}

/// Render a report document as GitHub-flavored Markdown
pub fn render_markdown(doc: &ReportDocument) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", doc.title));

    for block in &doc.blocks {
        match block {
            Block::Heading(text) => md.push_str(&format!("## {}\n\n", text)),
            Block::Paragraph(text) => md.push_str(&format!("{}\n\n", text)),
            Block::Bullets(items) => {
                for item in items {
                    md.push_str(&format!("- {}\n", item));
                }
                md.push('\n');
            }
            Block::Table(table) => push_table(&mut md, table),
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_blocks() {
        let mut doc = ReportDocument::new("Audit");
        doc.heading("Summary");
        doc.paragraph("All good.");
        doc.bullets(vec!["a".to_string(), "b".to_string()]);

        assert_eq!(render_markdown(&doc), "# Audit\n\n## Summary\n\nAll good.\n\n- a\n- b\n\n");
    }

    #[test]
    fn test_render_table_pads_and_escapes() {
        let mut doc = ReportDocument::new("Audit");
        doc.table(
            TableBlock::new("Counts", &["date", "count"])
                .with_row(vec!["2024-10-05".to_string(), "3".to_string()])
                .with_row(vec!["a|b".to_string()]),
        );

        let md = render_markdown(&doc);
        assert!(md.contains("**Counts**\n\n| date | count |\n| --- | --- |\n"));
        assert!(md.contains("| 2024-10-05 | 3 |\n"));
        assert!(md.contains("| a\\|b |  |\n"));
    }
}
