//! Published-spreadsheet CSV extraction.
//!
//! The community sheet is fetched through its CSV export endpoint. The
//! parser below covers the subset of CSV the export emits: quoted fields,
//! doubled quotes inside them, and CRLF record separators.

use async_trait::async_trait;

use crate::adapter::SourceAdapter;
use crate::error::{AppError, Result};
use crate::models::{RawRecord, RowFilter, SourceConfig, SourceId};

/// Extracts records from a CSV export, keeping only rows that pass the
/// configured filter.
pub struct SheetAdapter {
    source: SourceId,
    url: String,
    columns: Vec<String>,
    filter: Option<RowFilter>,
}

impl SheetAdapter {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            source: config.id,
            url: config.url.clone(),
            columns: config.columns.clone(),
            filter: config.filter.clone(),
        })
    }

    /// Extract raw records from CSV text, in row order.
    pub fn extract(&self, csv: &str) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();

        for row in parse_csv(csv) {
            if let Some(filter) = &self.filter {
                if row.get(filter.column).map(String::as_str) != Some(filter.equals.as_str()) {
                    continue;
                }
            }
            if row.len() < self.columns.len() {
                continue;
            }

            let mut record = RawRecord::new();
            for (field, cell) in self.columns.iter().zip(&row) {
                if !field.is_empty() {
                    record.set(field, cell.clone());
                }
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(AppError::fetch(self.source.name(), "zero records retrieved"));
        }

        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for SheetAdapter {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<RawRecord>> {
        let response = client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::fetch(
                self.source.name(),
                format!("{} returned {}", self.url, response.status()),
            ));
        }
        let text = response.text().await?;
        self.extract(&text)
    }
}

/// Minimal CSV record parser: quotes, escaped quotes, CR/LF row endings.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdapterKind;

    fn sheet_config() -> SourceConfig {
        SourceConfig {
            id: SourceId::CommunitySheet,
            url: "https://example.org/sheet.csv".into(),
            adapter: AdapterKind::Sheet,
            row_selector: String::new(),
            header_selector: String::new(),
            expected_headers: vec![],
            columns: vec![
                "location".into(),
                "suburb".into(),
                "date_time".into(),
                "".into(),
                "".into(),
            ],
            filter: Some(RowFilter {
                column: 4,
                equals: "Business".into(),
            }),
            notify_on_update: false,
        }
    }

    const CSV: &str = "\
Location,Suburb,Date and Time,Notes,Type\r\n\
Cafe X,Perth,10:00 1/1/2024,,Business\r\n\
\"Smith, Jones and Co\",Perth,11:00 1/1/2024,\"said \"\"closed\"\"\",Business\r\n\
Private home,Scarborough,12:00 1/1/2024,,Residence\r\n";

    #[test]
    fn test_filter_keeps_matching_rows_only() {
        let adapter = SheetAdapter::from_config(&sheet_config()).unwrap();
        let records = adapter.extract(CSV).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("location"), "Cafe X");
        assert_eq!(records[1].get("suburb"), "Perth");
    }

    #[test]
    fn test_quoted_fields_with_commas_and_quotes() {
        let adapter = SheetAdapter::from_config(&sheet_config()).unwrap();
        let records = adapter.extract(CSV).unwrap();
        assert_eq!(records[1].get("location"), "Smith, Jones and Co");
    }

    #[test]
    fn test_unmapped_columns_are_dropped() {
        let adapter = SheetAdapter::from_config(&sheet_config()).unwrap();
        let records = adapter.extract(CSV).unwrap();
        assert_eq!(records[0].get("date_time"), "10:00 1/1/2024");
        // the Notes and Type columns feed no field
        assert!(!records[0].get("location").contains("Business"));
    }

    #[test]
    fn test_no_matching_rows_is_a_fetch_error() {
        let adapter = SheetAdapter::from_config(&sheet_config()).unwrap();
        let header_only = "Location,Suburb,Date and Time,Notes,Type\n";
        assert!(matches!(
            adapter.extract(header_only),
            Err(AppError::Fetch { .. })
        ));
    }

    #[test]
    fn test_parse_csv_handles_final_unterminated_row() {
        let rows = parse_csv("a,b\nc,d");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_parse_csv_skips_blank_lines() {
        let rows = parse_csv("a,b\n\nc,d\n");
        assert_eq!(rows.len(), 2);
    }
}
