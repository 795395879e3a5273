//! Source adapters.
//!
//! Every external site hands the core an ordered list of raw records; how a
//! site's markup is torn apart stays behind the [`SourceAdapter`] trait.
//! Extraction is configuration-driven: a CSS row selector plus a column to
//! field mapping, with expected header texts verified on every fetch so a
//! silently rearranged page fails loudly instead of feeding the delta engine
//! garbage.

mod sheet;
mod table;

use async_trait::async_trait;

pub use sheet::SheetAdapter;
pub use table::TableAdapter;

use crate::error::Result;
use crate::models::{AdapterKind, Config, RawRecord, SourceId};

/// One external origin of exposure data.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which schema this adapter feeds.
    fn source(&self) -> SourceId;

    /// Fetch and extract the current batch, in page order.
    ///
    /// Guarantees every record carries the schema's expected field set, or
    /// fails with a schema mismatch rather than returning malformed data.
    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<RawRecord>>;
}

/// Build the configured adapters, in config order.
pub fn build_adapters(config: &Config) -> Result<Vec<Box<dyn SourceAdapter>>> {
    config
        .sources
        .iter()
        .map(|source| -> Result<Box<dyn SourceAdapter>> {
            match source.adapter {
                AdapterKind::Table => Ok(Box::new(TableAdapter::from_config(source)?)),
                AdapterKind::Sheet => Ok(Box::new(SheetAdapter::from_config(source)?)),
            }
        })
        .collect()
}
