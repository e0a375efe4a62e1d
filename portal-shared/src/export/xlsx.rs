/// XLSX workbook export
///
/// Three sheets: `Summary` (key/value pairs), `Work Items` and `Approvals`
/// (one row per document, header row frozen).

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::{ExportError, ProjectReport};

fn header_row(sheet: &mut Worksheet, headers: &[(&str, f64)], bold: &Format) -> Result<(), XlsxError> {
    for (col, (title, width)) in headers.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, bold)?;
        sheet.set_column_width(col, *width)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn summary_sheet(sheet: &mut Worksheet, report: &ProjectReport, bold: &Format) -> Result<(), XlsxError> {
    let project = &report.project;
    sheet.set_name("Summary")?;
    sheet.set_column_width(0, 22)?;
    sheet.set_column_width(1, 48)?;

    let text_rows = [
        ("Project", project.name.clone()),
        ("Project ID", project.id.clone()),
        ("Client", project.client_name.clone()),
        ("Status", project.status.as_str().to_string()),
        ("Schedule", report.schedule()),
        ("Generated", report.generated_at.to_rfc3339()),
    ];

    let mut row = 0u32;
    for (label, value) in text_rows {
        sheet.write_string_with_format(row, 0, label, bold)?;
        sheet.write_string(row, 1, value)?;
        row += 1;
    }

    let number_rows = [
        ("Budget", project.budget),
        ("Work items", report.work_items.len() as f64),
        ("Completion %", report.completion_percent() as f64),
        ("Pending approvals", report.pending_approvals() as f64),
    ];
    for (label, value) in number_rows {
        sheet.write_string_with_format(row, 0, label, bold)?;
        sheet.write_number(row, 1, value)?;
        row += 1;
    }

    for (status, count) in report.work_item_counts() {
        sheet.write_string_with_format(row, 0, format!("Items {}", status.as_str()), bold)?;
        sheet.write_number(row, 1, count as f64)?;
        row += 1;
    }

    Ok(())
}

fn work_items_sheet(sheet: &mut Worksheet, report: &ProjectReport, bold: &Format) -> Result<(), XlsxError> {
    sheet.set_name("Work Items")?;
    header_row(
        sheet,
        &[
            ("ID", 20.0),
            ("Title", 40.0),
            ("Status", 14.0),
            ("Priority", 10.0),
            ("Assignee", 20.0),
            ("Due date", 12.0),
        ],
        bold,
    )?;

    for (index, item) in report.work_items.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_string(row, 0, &item.id)?;
        sheet.write_string(row, 1, &item.title)?;
        sheet.write_string(row, 2, item.status.as_str())?;
        sheet.write_number(row, 3, item.priority)?;
        sheet.write_string(row, 4, item.assignee_id.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 5, item.due_date.map(|d| d.to_string()).unwrap_or_default())?;
    }

    Ok(())
}

fn approvals_sheet(sheet: &mut Worksheet, report: &ProjectReport, bold: &Format) -> Result<(), XlsxError> {
    sheet.set_name("Approvals")?;
    header_row(
        sheet,
        &[
            ("ID", 20.0),
            ("Subject type", 14.0),
            ("Subject ID", 20.0),
            ("Status", 12.0),
            ("Requested by", 18.0),
            ("Decided by", 18.0),
            ("Decided at", 22.0),
            ("Comment", 40.0),
        ],
        bold,
    )?;

    for (index, approval) in report.approvals.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_string(row, 0, &approval.id)?;
        sheet.write_string(row, 1, &approval.subject_type)?;
        sheet.write_string(row, 2, &approval.subject_id)?;
        sheet.write_string(row, 3, approval.status.as_str())?;
        sheet.write_string(row, 4, &approval.requested_by)?;
        sheet.write_string(row, 5, approval.decided_by.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 6, approval.decided_at.map(|d| d.to_rfc3339()).unwrap_or_default())?;
        sheet.write_string(row, 7, approval.comment.as_deref().unwrap_or(""))?;
    }

    Ok(())
}

/// Renders the project report as an XLSX workbook
pub fn render(report: &ProjectReport) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    summary_sheet(workbook.add_worksheet(), report, &bold)?;
    work_items_sheet(workbook.add_worksheet(), report, &bold)?;
    approvals_sheet(workbook.add_worksheet(), report, &bold)?;

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::report::fixtures;

    #[test]
    fn test_render_is_zip() {
        let bytes = render(&fixtures::report()).unwrap();
        // XLSX is a zip container
        assert!(bytes.starts_with(b"PK\x03\x04"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn test_render_empty_project() {
        let mut report = fixtures::report();
        report.work_items.clear();
        report.approvals.clear();
        assert!(render(&report).is_ok());
    }
}
