/// Minimal PDF 1.4 writer
///
/// Produces a text-only, A4, multi-page document using the standard
/// Helvetica fonts (no embedding needed). Text outside printable ASCII is
/// replaced with `?`.

use std::io::Write;

use super::{ExportError, ProjectReport};

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 50;
const LINE_HEIGHT: u32 = 15;
const BODY_SIZE: u32 = 10;
const HEADING_SIZE: u32 = 14;
const TITLE_SIZE: u32 = 20;

/// Characters per line before wrapping at body size
const WRAP_WIDTH: usize = 95;

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Title(String),
    Heading(String),
    Text(String),
    Blank,
}

impl Line {
    fn height(&self) -> u32 {
        match self {
            Line::Title(_) => LINE_HEIGHT * 2,
            Line::Heading(_) => LINE_HEIGHT + 5,
            Line::Text(_) | Line::Blank => LINE_HEIGHT,
        }
    }
}

/// Lays out lines top to bottom, starting a new page when one fills up
#[derive(Debug, Default)]
struct PdfDocument {
    pages: Vec<Vec<(u32, Line)>>,
    cursor: u32,
}

impl PdfDocument {
    fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, line: Line) {
        let height = line.height();
        if self.pages.is_empty() || self.cursor < MARGIN + height {
            self.pages.push(Vec::new());
            self.cursor = PAGE_HEIGHT - MARGIN;
        }
        self.cursor -= height;
        if let Some(page) = self.pages.last_mut() {
            page.push((self.cursor, line));
        }
    }

    fn title(&mut self, text: &str) {
        self.push(Line::Title(text.to_string()));
    }

    fn heading(&mut self, text: &str) {
        self.push(Line::Blank);
        self.push(Line::Heading(text.to_string()));
    }

    fn text(&mut self, text: &str) {
        for chunk in wrap(text, WRAP_WIDTH) {
            self.push(Line::Text(chunk));
        }
    }

    fn content_stream(lines: &[(u32, Line)]) -> String {
        let mut stream = String::new();
        for (y, line) in lines {
            let (font, size, text) = match line {
                Line::Title(t) => ("F2", TITLE_SIZE, t),
                Line::Heading(t) => ("F2", HEADING_SIZE, t),
                Line::Text(t) => ("F1", BODY_SIZE, t),
                Line::Blank => continue,
            };
            stream.push_str(&format!(
                "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
                font,
                size,
                MARGIN,
                y,
                escape(text)
            ));
        }
        stream
    }

    /// Serializes the document with a cross-reference table
    fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }

        // 1 catalog, 2 page tree, 3-4 fonts, then a page + content pair per page
        let page_count = self.pages.len();
        let page_ids: Vec<usize> = (0..page_count).map(|i| 5 + i * 2).collect();

        let mut objects: Vec<String> = Vec::with_capacity(4 + page_count * 2);
        objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
        objects.push(format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            page_ids.iter().map(|id| format!("{} 0 R", id)).collect::<Vec<_>>().join(" "),
            page_count
        ));
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string());
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>".to_string());

        for (page, id) in self.pages.iter().zip(&page_ids) {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH,
                PAGE_HEIGHT,
                id + 1
            ));
            let stream = Self::content_stream(page);
            objects.push(format!("<< /Length {} >>\nstream\n{}endstream", stream.len(), stream));
        }

        let pdf_err = |e: std::io::Error| ExportError::Pdf(e.to_string());

        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (index, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            write!(out, "{} 0 obj\n{}\nendobj\n", index + 1, body).map_err(pdf_err)?;
        }

        let xref_offset = out.len();
        write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).map_err(pdf_err)?;
        for offset in &offsets {
            write!(out, "{:010} 00000 n \n", offset).map_err(pdf_err)?;
        }
        write!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .map_err(pdf_err)?;

        Ok(out)
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

/// Word-wraps `text` to at most `width` characters per line
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(split);
        }
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Renders the project report as a PDF
pub fn render(report: &ProjectReport) -> Result<Vec<u8>, ExportError> {
    let project = &report.project;
    let mut doc = PdfDocument::new();

    doc.title(&format!("Project Report: {}", project.name));
    doc.text(&format!("Client: {}", project.client_name));
    doc.text(&format!("Status: {}", project.status.as_str()));
    doc.text(&format!("Budget: {:.2}", project.budget));
    doc.text(&format!("Schedule: {}", report.schedule()));
    doc.text(&format!("Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M UTC")));
    if let Some(description) = &project.description {
        doc.push(Line::Blank);
        doc.text(description);
    }

    doc.heading("Summary");
    doc.text(&format!(
        "{} work items, {}% complete, {} approvals pending",
        report.work_items.len(),
        report.completion_percent(),
        report.pending_approvals()
    ));
    for (status, count) in report.work_item_counts() {
        doc.text(&format!("  {}: {}", status.as_str(), count));
    }

    doc.heading("Work Items");
    if report.work_items.is_empty() {
        doc.text("No work items.");
    }
    for item in &report.work_items {
        let due = item.due_date.map(|d| format!(", due {}", d)).unwrap_or_default();
        doc.text(&format!(
            "[{}] P{} {}{}",
            item.status.as_str(),
            item.priority,
            item.title,
            due
        ));
    }

    doc.heading("Approvals");
    if report.approvals.is_empty() {
        doc.text("No approvals.");
    }
    for approval in &report.approvals {
        let decided = approval
            .decided_by
            .as_deref()
            .map(|by| format!(" by {}", by))
            .unwrap_or_default();
        doc.text(&format!(
            "{} {}: {}{}",
            approval.subject_type,
            approval.subject_id,
            approval.status.as_str(),
            decided
        ));
        if let Some(comment) = &approval.comment {
            doc.text(&format!("  \"{}\"", comment));
        }
    }

    doc.finish()
}
