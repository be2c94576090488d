use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}', expected csv or json")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

/// Geometric thresholds tuned for the inventory report layout, in PDF user
/// space units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Maximum vertical distance between a fragment and the first fragment of
    /// the line it joins.
    pub line_y: f32,
    /// Horizontal gap between fragments that is rendered as a word break.
    pub word_gap: f32,
    /// Fallback anchors closer than this are treated as one column.
    pub anchor_dedupe: f32,
    /// Fragments farther than this from every anchor go to the overflow slot.
    pub max_anchor_distance: f32,
    pub min_ruler_anchors: usize,
    pub min_fallback_anchors: usize,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            line_y: 2.0,
            word_gap: 8.0,
            anchor_dedupe: 1.5,
            max_anchor_distance: 18.0,
            min_ruler_anchors: 18,
            min_fallback_anchors: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub pages: Option<PageSelection>,
    pub delimiter: u8,
    pub format: OutputFormat,
    pub dictionaries: Option<PathBuf>,
    pub tolerances: Tolerances,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            pages: None,
            delimiter: b',',
            format: OutputFormat::Csv,
            dictionaries: None,
            tolerances: Tolerances::default(),
        }
    }
}
