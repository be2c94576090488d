use std::fmt;

use serde::Serialize;

/// A run of text placed on the page, in PDF user space (y grows upwards).
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

impl Fragment {
    #[must_use]
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
        }
    }

    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.x + self.width.max(0.0) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageFragments {
    pub page_number: u32,
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowKind {
    Main,
    Object,
    VydelHeader,
    Species,
    SingleTrees,
    TotalCategory,
    TotalQuarter,
    TotalSpeciesHeader,
    TotalSpeciesRow,
    Note,
    #[default]
    Text,
}

impl RowKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::Object => "OBJECT",
            Self::VydelHeader => "VYDEL_HEADER",
            Self::Species => "SPECIES",
            Self::SingleTrees => "SINGLE_TREES",
            Self::TotalCategory => "TOTAL_CATEGORY",
            Self::TotalQuarter => "TOTAL_QUARTER",
            Self::TotalSpeciesHeader => "TOTAL_SPECIES_HEADER",
            Self::TotalSpeciesRow => "TOTAL_SPECIES_ROW",
            Self::Note => "NOTE",
            Self::Text => "TEXT",
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output column names, in write order.
pub const RECORD_COLUMNS: [&str; 32] = [
    "quarter",
    "row_no",
    "category",
    "vydel",
    "kind",
    "page",
    "area",
    "description",
    "layer",
    "layer_height",
    "species",
    "age",
    "height",
    "diameter",
    "age_class",
    "age_group",
    "site_class",
    "forest_type",
    "site_conditions",
    "stocking",
    "volume_per_ha",
    "total_volume",
    "species_volume",
    "merch_class",
    "dead_standing",
    "sparse_stand",
    "single_trees",
    "litter_total",
    "litter_liquid",
    "operations",
    "note",
    "raw",
];

/// One reconstructed row of the inventory table.
///
/// Field order matches [`RECORD_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Record {
    pub quarter: Option<u32>,
    pub row_no: u32,
    pub category: Option<String>,
    pub vydel: Option<u32>,
    pub kind: RowKind,
    pub page: u32,
    pub area: Option<f64>,
    pub description: Option<String>,
    pub layer: Option<u32>,
    pub layer_height: Option<u32>,
    pub species: Option<String>,
    pub age: Option<u32>,
    pub height: Option<u32>,
    pub diameter: Option<u32>,
    pub age_class: Option<u32>,
    pub age_group: Option<u32>,
    pub site_class: Option<String>,
    pub forest_type: Option<String>,
    pub site_conditions: Option<String>,
    pub stocking: Option<f64>,
    pub volume_per_ha: Option<f64>,
    pub total_volume: Option<f64>,
    pub species_volume: Option<f64>,
    pub merch_class: Option<u32>,
    pub dead_standing: Option<f64>,
    pub sparse_stand: Option<f64>,
    pub single_trees: Option<f64>,
    pub litter_total: Option<f64>,
    pub litter_liquid: Option<f64>,
    pub operations: Option<String>,
    pub note: Option<String>,
    pub raw: Option<String>,
}
