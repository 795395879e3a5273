// src/models/mod.rs

//! Domain models for the exposure watcher.

mod config;
mod record;
mod report;
mod source;

pub use config::{
    AdapterKind, AdminConfig, AdminEmailConfig, AnnounceConfig, ChannelsConfig, Config,
    EmailConfig, FetchConfig, RowFilter, RunConfig, SourceConfig, WebhookTarget,
};
pub use record::{Classification, ClassifiedRecord, ExposureRecord, RawRecord};
pub use report::{ChannelOutcome, RunReport, SourceStats};
pub use source::{FieldSpec, SourceId, SourceSchema};
