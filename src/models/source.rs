//! Source identifiers and their fixed record schemas.
//!
//! Each tracked source publishes a different table layout. The schema for a
//! source is static: the ordered field list drives rendering, the key subset
//! drives deduplication, and the mutable subset drives update detection.

use serde::{Deserialize, Serialize};

/// One tracked exposure-site source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// WA Health exposure location table
    WaHealth,
    /// Crowd-sourced community spreadsheet
    #[serde(rename = "sheet")]
    CommunitySheet,
    /// Edith Cowan University notice page
    Ecu,
    /// University of Western Australia notice page
    Uwa,
    /// Murdoch University notice page
    Murdoch,
    /// Curtin University notice page
    Curtin,
}

impl SourceId {
    /// All sources, in report order.
    pub const ALL: [SourceId; 6] = [
        SourceId::WaHealth,
        SourceId::CommunitySheet,
        SourceId::Ecu,
        SourceId::Uwa,
        SourceId::Murdoch,
        SourceId::Curtin,
    ];

    /// Short identifier used in config files and log lines.
    pub fn name(&self) -> &'static str {
        match self {
            SourceId::WaHealth => "wahealth",
            SourceId::CommunitySheet => "sheet",
            SourceId::Ecu => "ecu",
            SourceId::Uwa => "uwa",
            SourceId::Murdoch => "murdoch",
            SourceId::Curtin => "curtin",
        }
    }

    /// The fixed schema for this source.
    pub fn schema(&self) -> &'static SourceSchema {
        match self {
            SourceId::WaHealth => &WAHEALTH,
            SourceId::CommunitySheet => &SHEET,
            SourceId::Ecu => &ECU,
            SourceId::Uwa => &UWA,
            SourceId::Murdoch => &MURDOCH,
            SourceId::Curtin => &CURTIN,
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single field of a source schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Internal field name, also the history table column name
    pub name: &'static str,
    /// Human-readable label used in rendered alerts
    pub label: &'static str,
}

/// Fixed layout of one source's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSchema {
    /// History table for this source
    pub table: &'static str,
    /// Section heading in the rendered report
    pub title: &'static str,
    /// All fields, in canonical render order
    pub fields: &'static [FieldSpec],
    /// Subset of field names that identifies a real-world exposure event
    pub key_fields: &'static [&'static str],
    /// Non-key fields tracked for update detection
    pub mutable_fields: &'static [&'static str],
}

impl SourceSchema {
    /// Look up a field spec by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether this schema tracks any mutable fields.
    pub fn tracks_updates(&self) -> bool {
        !self.mutable_fields.is_empty()
    }
}

// The advisory free-text fields of the WA Health table are revised in place
// by the publisher, so they are tracked as mutable rather than keyed.
static WAHEALTH: SourceSchema = SourceSchema {
    table: "wahealth_exposures",
    title: "WA Health Exposure Sites",
    fields: &[
        FieldSpec { name: "date_time", label: "Date and Time" },
        FieldSpec { name: "suburb", label: "Suburb" },
        FieldSpec { name: "location", label: "Location" },
        FieldSpec { name: "updated", label: "Updated" },
        FieldSpec { name: "advice", label: "Advice" },
    ],
    key_fields: &["date_time", "suburb", "location"],
    mutable_fields: &["updated", "advice"],
};

static SHEET: SourceSchema = SourceSchema {
    table: "sheet_exposures",
    title: "Unofficial Civilian Compiled Exposure Sites",
    fields: &[
        FieldSpec { name: "date_time", label: "Date and Time" },
        FieldSpec { name: "suburb", label: "Suburb" },
        FieldSpec { name: "location", label: "Location" },
    ],
    key_fields: &["date_time", "suburb", "location"],
    mutable_fields: &[],
};

static ECU: SourceSchema = SourceSchema {
    table: "ecu_exposures",
    title: "Edith Cowan University Exposure Sites",
    fields: &[
        FieldSpec { name: "date", label: "Date" },
        FieldSpec { name: "time", label: "Time" },
        FieldSpec { name: "campus", label: "Campus" },
        FieldSpec { name: "building", label: "Building" },
        FieldSpec { name: "room", label: "Room" },
    ],
    key_fields: &["date", "time", "campus", "building", "room"],
    mutable_fields: &[],
};

static UWA: SourceSchema = SourceSchema {
    table: "uwa_exposures",
    title: "University of Western Australia Exposure Sites",
    fields: &[
        FieldSpec { name: "date", label: "Date" },
        FieldSpec { name: "time", label: "Time" },
        FieldSpec { name: "location", label: "Location" },
    ],
    key_fields: &["date", "time", "location"],
    mutable_fields: &[],
};

static MURDOCH: SourceSchema = SourceSchema {
    table: "murdoch_exposures",
    title: "Murdoch University Exposure Sites",
    fields: &[
        FieldSpec { name: "date", label: "Date" },
        FieldSpec { name: "time", label: "Time" },
        FieldSpec { name: "campus", label: "Campus" },
        FieldSpec { name: "location", label: "Location" },
    ],
    key_fields: &["date", "time", "campus", "location"],
    mutable_fields: &[],
};

static CURTIN: SourceSchema = SourceSchema {
    table: "curtin_exposures",
    title: "Curtin University Exposure Sites",
    fields: &[
        FieldSpec { name: "date", label: "Date" },
        FieldSpec { name: "time", label: "Time" },
        FieldSpec { name: "campus", label: "Campus" },
        FieldSpec { name: "location", label: "Location" },
        FieldSpec { name: "contact_type", label: "Contact Type" },
    ],
    key_fields: &["date", "time", "campus", "location", "contact_type"],
    mutable_fields: &[],
};
