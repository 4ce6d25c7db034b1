//! Export generation: CSV and XLSX renditions of a lookup result
//!
//! Both formats carry a summary table of the scalar fields followed by the
//! revenue-history table. The XLSX container is written by hand as minimal
//! OOXML parts (a .xlsx file is a ZIP of XML); inline strings keep the
//! writer free of a shared-strings table.

use crate::error::{AppError, Result};
use crate::service::format::fmt_number;
use crate::service::lookup::{self, LookupResult};
use crate::state::AppState;
use std::io::{Cursor, Write};
use std::str::FromStr;
use zip::write::SimpleFileOptions;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(AppError::ExportFormat(format!(
                "Unsupported export format '{}'; use csv or xlsx",
                other
            ))),
        }
    }
}

/// A generated file attachment
#[derive(Debug)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Produce an export for `symbol`. Reuses the snapshot from the last lookup
/// of that symbol when one exists so the file matches what the user saw;
/// otherwise performs a fresh lookup with the same error taxonomy.
pub async fn export(
    state: &AppState,
    raw_symbol: &str,
    format: Option<&str>,
) -> Result<ExportFile> {
    let format = match format {
        Some(s) => s.parse::<ExportFormat>()?,
        None => ExportFormat::Xlsx,
    };

    let symbol = raw_symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("Symbol required".to_string()));
    }

    let result = match state.snapshots.get(&symbol) {
        Some(snapshot) => snapshot.value().clone(),
        None => lookup::lookup(state, &symbol).await?,
    };

    let bytes = match format {
        ExportFormat::Csv => write_csv(&result)?,
        ExportFormat::Xlsx => write_xlsx(&result)?,
    };

    Ok(ExportFile {
        filename: format!("{}_report.{}", symbol, format.extension()),
        content_type: format.content_type(),
        bytes,
    })
}

// ============================================================================
// Summary table
// ============================================================================

enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

struct SummaryRow {
    metric: &'static str,
    value: CellValue,
    display: String,
}

fn text_row(metric: &'static str, value: Option<&str>) -> SummaryRow {
    SummaryRow {
        metric,
        value: value
            .map(|s| CellValue::Text(s.to_string()))
            .unwrap_or(CellValue::Empty),
        display: value.unwrap_or("N/A").to_string(),
    }
}

fn number_row(metric: &'static str, value: Option<f64>) -> SummaryRow {
    SummaryRow {
        metric,
        value: value.map(CellValue::Number).unwrap_or(CellValue::Empty),
        display: fmt_number(value),
    }
}

fn summary_rows(result: &LookupResult) -> Vec<SummaryRow> {
    vec![
        text_row("Symbol", Some(&result.symbol)),
        text_row("Company", result.company_name.as_deref()),
        number_row("Market Cap", result.market_cap),
        number_row("P/E Ratio", result.pe_ratio),
        text_row("Sector", result.sector.as_deref()),
        text_row(
            "Latest Annual Report Link",
            result.latest_annual_report_link.as_deref(),
        ),
        number_row("Net Income (Latest)", result.net_income),
        number_row("Revenue (Latest)", result.revenue),
    ]
}

/// Plain decimal rendering for the Value column (no magnitude suffix)
fn plain_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 9e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

// ============================================================================
// CSV
// ============================================================================

fn write_csv(result: &LookupResult) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["Metric", "Value", "Display"])
        .map_err(csv_error)?;
    for row in summary_rows(result) {
        let value = match row.value {
            CellValue::Text(s) => s,
            CellValue::Number(v) => plain_number(v),
            CellValue::Empty => String::new(),
        };
        writer
            .write_record([row.metric, value.as_str(), row.display.as_str()])
            .map_err(csv_error)?;
    }
    let mut bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV buffer error: {}", e)))?;

    // Blank line between the summary and revenue-history sections
    bytes.push(b'\n');

    let mut writer = csv::Writer::from_writer(bytes);
    writer.write_record(["year", "revenue"]).map_err(csv_error)?;
    for point in &result.revenue_history {
        let revenue = point.revenue.map(plain_number).unwrap_or_default();
        writer
            .write_record([point.year.to_string(), revenue])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV buffer error: {}", e)))
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::Internal(format!("CSV write error: {}", e))
}

// ============================================================================
// XLSX
// ============================================================================

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Summary" sheetId="1" r:id="rId1"/><sheet name="RevenueHistory" sheetId="2" r:id="rId2"/></sheets></workbook>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/></Relationships>"#;

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn str_cell(s: &str) -> String {
    format!("<c t=\"inlineStr\"><is><t>{}</t></is></c>", xml_escape(s))
}

fn num_cell(v: f64) -> String {
    format!("<c><v>{}</v></c>", plain_number(v))
}

fn cell(value: &CellValue) -> String {
    match value {
        CellValue::Text(s) => str_cell(s),
        CellValue::Number(v) => num_cell(*v),
        CellValue::Empty => "<c/>".to_string(),
    }
}

fn worksheet(rows: &[String]) -> String {
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, cells)| format!("<row r=\"{}\">{}</row>", i + 1, cells))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
         <sheetData>{}</sheetData></worksheet>",
        body
    )
}

fn write_xlsx(result: &LookupResult) -> Result<Vec<u8>> {
    let mut summary: Vec<String> = vec![format!(
        "{}{}{}",
        str_cell("Metric"),
        str_cell("Value"),
        str_cell("Display")
    )];
    for row in summary_rows(result) {
        summary.push(format!(
            "{}{}{}",
            str_cell(row.metric),
            cell(&row.value),
            str_cell(&row.display)
        ));
    }

    let mut history: Vec<String> =
        vec![format!("{}{}", str_cell("year"), str_cell("revenue"))];
    for point in &result.revenue_history {
        let revenue = point
            .revenue
            .map(num_cell)
            .unwrap_or_else(|| "<c/>".to_string());
        history.push(format!("{}{}", num_cell(point.year as f64), revenue));
    }

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let parts: [(&str, String); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", ROOT_RELS_XML.to_string()),
        ("xl/workbook.xml", WORKBOOK_XML.to_string()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
        ("xl/worksheets/sheet1.xml", worksheet(&summary)),
        ("xl/worksheets/sheet2.xml", worksheet(&history)),
    ];

    for (name, content) in parts {
        zip.start_file(name, options).map_err(zip_error)?;
        zip.write_all(content.as_bytes())?;
    }

    let cursor = zip.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}

fn zip_error(e: zip::result::ZipError) -> AppError {
    AppError::Internal(format!("XLSX container error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::fetcher::{CompanyInfo, FetchError, MetadataFetcher, RevenuePoint};
    use crate::state::AppState;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct MockFetcher {
        response: fn(&str) -> std::result::Result<CompanyInfo, FetchError>,
    }

    #[async_trait]
    impl MetadataFetcher for MockFetcher {
        async fn fetch(&self, symbol: &str) -> std::result::Result<CompanyInfo, FetchError> {
            (self.response)(symbol)
        }
    }

    fn state_with(response: fn(&str) -> std::result::Result<CompanyInfo, FetchError>) -> AppState {
        AppState::with_fetcher(Arc::new(MockFetcher { response }), AppConfig::default()).unwrap()
    }

    fn sample_result() -> LookupResult {
        LookupResult {
            symbol: "AAPL".to_string(),
            company_name: Some("Apple Inc.".to_string()),
            sector: Some("Technology".to_string()),
            market_cap: Some(3e12),
            pe_ratio: Some(28.5),
            revenue: Some(365e9),
            net_income: Some(94e9),
            latest_annual_report_link: Some("https://www.apple.com".to_string()),
            revenue_history: vec![
                RevenuePoint {
                    year: 2020,
                    revenue: Some(274e9),
                },
                RevenuePoint {
                    year: 2021,
                    revenue: None,
                },
            ],
            raw_info: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!(" Csv ".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);

        let err = "pdf".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, AppError::ExportFormat(_)));
    }

    #[test]
    fn test_csv_layout() {
        let bytes = write_csv(&sample_result()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("Metric,Value,Display\n"));
        assert!(text.contains("Symbol,AAPL,AAPL"));
        assert!(text.contains("Market Cap,3000000000000,3.00T"));
        assert!(text.contains("P/E Ratio,28.5,28.50"));
        // Blank line separates the two sections
        assert!(text.contains("\n\nyear,revenue\n"));
        assert!(text.contains("2020,274000000000"));
        // Null revenue renders as an empty field
        assert!(text.contains("2021,\n"));
    }

    #[test]
    fn test_csv_absent_fields() {
        let mut result = sample_result();
        result.market_cap = None;
        result.sector = None;

        let text = String::from_utf8(write_csv(&result).unwrap()).unwrap();
        assert!(text.contains("Market Cap,,N/A"));
        assert!(text.contains("Sector,,N/A"));
    }

    #[test]
    fn test_xlsx_container_shape() {
        let bytes = write_xlsx(&sample_result()).unwrap();

        // ZIP local file header magic
        assert_eq!(&bytes[..4], b"PK\x03\x04");

        // Stored filenames appear verbatim in the archive
        let haystack = bytes.as_slice();
        for needle in [
            b"[Content_Types].xml".as_slice(),
            b"xl/workbook.xml".as_slice(),
            b"xl/worksheets/sheet1.xml".as_slice(),
            b"xl/worksheets/sheet2.xml".as_slice(),
        ] {
            assert!(
                haystack.windows(needle.len()).any(|w| w == needle),
                "missing part {:?}",
                String::from_utf8_lossy(needle)
            );
        }
    }

    #[test]
    fn test_worksheet_cells() {
        let sheet = worksheet(&[format!("{}{}", str_cell("a<b"), num_cell(42.0))]);
        assert!(sheet.contains("<t>a&lt;b</t>"));
        assert!(sheet.contains("<c><v>42</v></c>"));
        assert!(sheet.contains("<row r=\"1\">"));
    }

    #[tokio::test]
    async fn test_export_prefers_snapshot() {
        // Fetcher always fails; a pre-seeded snapshot must be enough
        let state = state_with(|_| Err(FetchError::Upstream("should not be called".to_string())));
        state
            .snapshots
            .insert("AAPL".to_string(), sample_result());

        let file = export(&state, "aapl", Some("csv")).await.unwrap();
        assert_eq!(file.filename, "AAPL_report.csv");
        assert_eq!(file.content_type, "text/csv");
        assert!(!file.bytes.is_empty());
    }

    #[tokio::test]
    async fn test_export_fetches_when_no_snapshot() {
        let state = state_with(|_| {
            Ok(CompanyInfo {
                name: Some("Apple Inc.".to_string()),
                sector: Some("Technology".to_string()),
                market_cap: Some(3e12),
                ..CompanyInfo::default()
            })
        });

        let file = export(&state, "AAPL", None).await.unwrap();
        // Default format is xlsx
        assert_eq!(file.filename, "AAPL_report.xlsx");
        assert_eq!(&file.bytes[..4], b"PK\x03\x04");

        // The fallback fetch is a full lookup, so it logs a search
        assert_eq!(state.db.recent_searches(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_export_unknown_symbol_is_not_found() {
        let state = state_with(|_| Err(FetchError::NotFound));
        let err = export(&state, "ZZZZ", Some("csv")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_export_bad_format_rejected_before_fetch() {
        let state = state_with(|_| Err(FetchError::Upstream("should not be called".to_string())));
        let err = export(&state, "AAPL", Some("docx")).await.unwrap_err();
        assert!(matches!(err, AppError::ExportFormat(_)));
    }
}
