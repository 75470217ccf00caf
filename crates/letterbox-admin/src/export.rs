//! CSV and XLSX export of the filtered inbox.

use chrono::NaiveDate;
use clap::ValueEnum;
use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use letterbox_common::AdminItem;
use letterbox_common::paths::format_timestamp;

/// Fixed export columns
pub const COLUMNS: [&str; 6] = ["createdAt", "name", "email", "message", "id", "seen"];

/// Worksheet name used for XLSX exports
pub const SHEET_NAME: &str = "contacts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    /// `contacts-<YYYY-MM-DD>.<ext>`
    pub fn default_file_name(self, today: NaiveDate) -> String {
        format!("contacts-{}.{}", today.format("%Y-%m-%d"), self.extension())
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export")]
    Empty,

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
}

/// One output row in `COLUMNS` order
fn row(item: &AdminItem) -> [String; 6] {
    let data = item.data.as_ref();
    let created_at = data
        .and_then(|d| d.created_at.clone())
        .unwrap_or_else(|| format_timestamp(item.uploaded_at));
    [
        created_at,
        data.map(|d| d.name.clone()).unwrap_or_default(),
        data.map(|d| d.email.clone()).unwrap_or_default(),
        data.map(|d| d.message.clone()).unwrap_or_default(),
        item.pathname.clone(),
        if item.seen { "yes" } else { "no" }.to_string(),
    ]
}

/// Quote a field containing `"`, `,`, CR, or LF; inner quotes are doubled
fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render items as CSV: header, rows, trailing newline
pub fn to_csv(items: &[AdminItem]) -> Result<String, ExportError> {
    if items.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(COLUMNS.join(","));
    for item in items {
        let fields: Vec<String> = row(item).iter().map(|f| csv_field(f)).collect();
        lines.push(fields.join(","));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// Render items as an XLSX workbook with a single `contacts` sheet
pub fn to_xlsx(items: &[AdminItem]) -> Result<Vec<u8>, ExportError> {
    if items.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (index, item) in items.iter().enumerate() {
        let line = index as u32 + 1;
        for (col, value) in row(item).iter().enumerate() {
            sheet.write_string(line, col as u16, value.as_str())?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Render items in the requested format
pub fn render(format: ExportFormat, items: &[AdminItem]) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => to_csv(items).map(String::into_bytes),
        ExportFormat::Xlsx => to_xlsx(items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use letterbox_common::ContactData;
    use tokio_test::{assert_err, assert_ok};

    fn item(name: &str, message: &str, seen: bool) -> AdminItem {
        AdminItem {
            pathname: format!("contacts/{}.json", name.to_lowercase()),
            uploaded_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            size: 10,
            seen,
            data: Some(ContactData {
                name: name.to_string(),
                email: "x@example.com".to_string(),
                message: message.to_string(),
                created_at: Some("2026-03-01T11:00:00.000Z".to_string()),
            }),
        }
    }

    #[test]
    fn test_csv_header_and_rows() {
        let csv = to_csv(&[item("Ona", "Hello", true), item("Rita", "Hi there", false)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "createdAt,name,email,message,id,seen");
        assert_eq!(
            lines[1],
            "2026-03-01T11:00:00.000Z,Ona,x@example.com,Hello,contacts/ona.json,yes"
        );
        assert!(lines[2].ends_with(",no"));
        assert!(csv.ends_with("no\n"));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(csv_field("cr\rhere"), "\"cr\rhere\"");

        let csv = to_csv(&[item("Ona", "Hello, \"world\"", false)]).unwrap();
        assert!(csv.contains(",\"Hello, \"\"world\"\"\","));
    }

    #[test]
    fn test_missing_data_uses_upload_time() {
        let mut broken = item("Ona", "", false);
        broken.data = None;
        let csv = to_csv(&[broken]).unwrap();
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "2026-03-01T12:00:00.000Z,,,,contacts/ona.json,no"
        );
    }

    #[test]
    fn test_empty_set_is_an_error() {
        assert!(matches!(assert_err!(to_csv(&[])), ExportError::Empty));
        assert!(matches!(assert_err!(to_xlsx(&[])), ExportError::Empty));
        assert_eq!(ExportError::Empty.to_string(), "nothing to export");
    }

    #[test]
    fn test_xlsx_is_a_zip_container() {
        let bytes = assert_ok!(render(ExportFormat::Xlsx, &[item("Ona", "Hello", true)]));
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_default_file_name() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(ExportFormat::Csv.default_file_name(today), "contacts-2026-10-18.csv");
        assert_eq!(ExportFormat::Xlsx.default_file_name(today), "contacts-2026-10-18.xlsx");
    }
}
