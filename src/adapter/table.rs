//! Selector-driven HTML table extraction.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::adapter::SourceAdapter;
use crate::error::{AppError, Result};
use crate::models::{RawRecord, SourceConfig, SourceId};

/// Extracts records from an HTML table using configured CSS selectors.
pub struct TableAdapter {
    source: SourceId,
    url: String,
    row_selector: Selector,
    header_selector: Option<Selector>,
    expected_headers: Vec<String>,
    columns: Vec<String>,
}

impl TableAdapter {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let header_selector = if config.expected_headers.is_empty() {
            None
        } else {
            Some(parse_selector(&config.header_selector)?)
        };

        Ok(Self {
            source: config.id,
            url: config.url.clone(),
            row_selector: parse_selector(&config.row_selector)?,
            header_selector,
            expected_headers: config.expected_headers.clone(),
            columns: config.columns.clone(),
        })
    }

    /// Extract raw records from a fetched page.
    ///
    /// Split out from the HTTP fetch so page structure handling is testable
    /// against fixture markup.
    pub fn extract(&self, html: &str) -> Result<Vec<RawRecord>> {
        let document = Html::parse_document(html);
        self.verify_headers(&document)?;

        let cell_selector = Selector::parse("td, th").expect("static selector");
        let mut records = Vec::new();

        for row in document.select(&self.row_selector) {
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|cell| cell_text(&cell))
                .collect();
            if cells.len() < self.columns.len() {
                log::warn!(
                    "{}: skipping row with {} cells, expected {}",
                    self.source,
                    cells.len(),
                    self.columns.len()
                );
                continue;
            }

            let mut record = RawRecord::new();
            for (field, cell) in self.columns.iter().zip(cells) {
                if !field.is_empty() {
                    record.set(field, cell);
                }
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(AppError::fetch(
                self.source.name(),
                "no table rows extracted",
            ));
        }

        Ok(records)
    }

    fn verify_headers(&self, document: &Html) -> Result<()> {
        let Some(selector) = &self.header_selector else {
            return Ok(());
        };

        let found: Vec<String> = document
            .select(selector)
            .map(|cell| squash_whitespace(&cell_text(&cell)))
            .collect();
        let expected: Vec<String> = self
            .expected_headers
            .iter()
            .map(|h| squash_whitespace(h))
            .collect();

        if found != expected {
            return Err(AppError::schema_mismatch(
                self.source.name(),
                format!("expected headers {expected:?}, found {found:?}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SourceAdapter for TableAdapter {
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
        let html = response.text().await?;
        self.extract(&html)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| AppError::config(format!("invalid selector '{selector}': {e}")))
}

// Text nodes are rejoined with line breaks so <br>-separated address lines
// survive into normalization.
fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<Vec<_>>().join("\n")
}

fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
