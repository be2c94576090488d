//! Turns classified rows into records and stitches multi-line constructs
//! (subdivision headers, continuations, totals) back together.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::cells::split_line;
use crate::classify::{
    TotalsPayload, classify_row, is_vydel_start, species_total, totals_payload, totals_title,
};
use crate::context::{ParseContext, PendingStand};
use crate::dictionaries::{Canonicalizer, Lookup};
use crate::grid::ColumnGrid;
use crate::header::{extract_category, extract_quarter};
use crate::layout::Line;
use crate::model::{Record, RowKind};
use crate::noise::is_noise;
use crate::options::Tolerances;
use crate::repair::{self, GENERAL, MAIN, SINGLE_TREES, SPECIES, TOTALS};
use crate::row::{Row, col};
use crate::text::{
    COMPOSITION_PATTERN, clamp_text, compact_key, composition_anywhere, composition_token,
    int_in, is_species_code, is_stocking, looks_like_note_text, normalize_broken_words,
    normalize_spaces, parse_int, parse_number, pure_composition, remove_whitespace,
};

static SPECIES_AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([А-ЯЁA-Z]{1,6})\s+((?:\d\s*){1,3})$").expect("hardcoded age regex is valid")
});
static MAIN_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,4}\s+\d+(?:[.,]\d+)?\s+(.+)$").expect("hardcoded main head regex is valid")
});
static SPLIT_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[.,]\d+\s+").expect("hardcoded decimal regex is valid"));
static LAYER_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[1-5]\s+\d{1,2}\b").expect("hardcoded layer regex is valid"));
static LONELY_BLOCKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:подрост|подлесок|единичн|болот|земли|расчистк|итого)")
        .expect("hardcoded lonely blocker regex is valid")
});
static LONELY_SPECIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[А-ЯЁA-Z]{1,6}$").expect("hardcoded species regex is valid")
});
static SHORT_LAYER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^({COMPOSITION_PATTERN})\s+(\d{{1,2}})\s+([А-ЯЁA-Z]{{1,6}})\s+(\d{{1,3}})\s+(\d{{1,2}})\s+(\d{{1,3}})\s+(\d{{1,2}})\s+(\d+(?:[.,]\d+)?)$"
    ))
    .expect("hardcoded short layer regex is valid")
});
static AGE_HEIGHT_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\s+(\d{1,2})$").expect("hardcoded age pair regex is valid")
});

/// Land features that stay `OBJECT` even without metrics.
const REAL_OBJECT_PREFIXES: [&str; 9] = [
    "болот", "дорог", "ручь", "ручей", "реки", "река", "просек", "вырубк", "полян",
];

/// Per-page facts the line handlers need.
#[derive(Debug, Clone, Copy)]
struct PageScope<'g> {
    number: u32,
    grid: Option<&'g ColumnGrid>,
    degraded: bool,
}

pub(crate) struct Assembler<'a> {
    canon: &'a dyn Canonicalizer,
    tolerances: &'a Tolerances,
    ctx: ParseContext,
    records: Vec<Record>,
}

impl<'a> Assembler<'a> {
    pub(crate) fn new(canon: &'a dyn Canonicalizer, tolerances: &'a Tolerances) -> Self {
        Self {
            canon,
            tolerances,
            ctx: ParseContext::default(),
            records: Vec::new(),
        }
    }

    pub(crate) fn record_count(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn finish(self) -> Vec<Record> {
        self.records
    }

    /// Feeds one page. Without a grid every line is read from its text alone.
    pub(crate) fn feed_page(
        &mut self,
        page_number: u32,
        lines: &[Line],
        grid: Option<&ColumnGrid>,
    ) {
        let texts: Vec<String> = lines
            .iter()
            .map(|line| line.text(self.tolerances.word_gap))
            .collect();
        self.read_page_header(&texts);

        let scope = PageScope {
            number: page_number,
            grid,
            degraded: grid.is_none(),
        };
        let mut row_no = 0;
        for (line, text) in lines.iter().zip(&texts) {
            if is_noise(text) {
                continue;
            }
            row_no += 1;
            let text = normalize_broken_words(text);
            self.feed_line(scope, line, text.trim(), row_no);
        }
    }

    /// Quarter and category persist until a later page states new ones.
    fn read_page_header(&mut self, texts: &[String]) {
        if let Some(quarter) = extract_quarter(texts) {
            self.ctx.quarter = Some(quarter);
        }
        if let Some(category) = extract_category(texts) {
            self.ctx.category = Some(self.canon.protection_category(&category));
        }
    }

    fn feed_line(&mut self, page: PageScope<'_>, line: &Line, text: &str, row_no: u32) {
        if self.take_totals(page, line, text, row_no) {
            return;
        }
        if !page.degraded && self.extend_species_age(text) {
            return;
        }
        if !page.degraded
            && let Some(pending) = self.ctx.pending_stand.as_mut()
            && pending.describes_stand()
            && let Some(composition) = pure_composition(text)
        {
            trace!(%composition, "composition captured for pending subdivision");
            pending.composition = Some(composition);
            return;
        }

        let mut row = split_line(line, page.grid, self.tolerances);
        repair::run(GENERAL, &mut row, text);
        let mut kind = classify_row(&row, text, &mut self.ctx);

        if kind == RowKind::Main
            && let Some(description) = main_description(text, &row)
        {
            row.set(col::DESCRIPTION, description);
        }

        if self.absorb_lonely_species(&row, text, page, row_no) {
            return;
        }

        if let Some(pending) = &self.ctx.pending_stand
            && let Some(vydel) = parse_int(row.get(col::VYDEL))
            && pending.vydel != Some(vydel)
        {
            self.ctx.pending_stand = None;
        }

        if kind == RowKind::Object && self.is_subdivision_header(&row) {
            self.push_subdivision_header(&row, text, page, row_no);
            return;
        }

        if matches!(kind, RowKind::Text | RowKind::Object)
            && self.complete_pending_stand(&mut row, text)
        {
            kind = RowKind::Main;
        }
        if kind == RowKind::Text
            && self.ctx.pending_stand.is_none()
            && let Some(vydel) = self.ctx.vydel
        {
            if let Some(composition) = layer_without_id(&row) {
                row.set(col::VYDEL, vydel.to_string());
                row.clear(col::AREA);
                if row.is_empty(col::DESCRIPTION) {
                    row.set(col::DESCRIPTION, composition);
                }
                kind = RowKind::Main;
            } else if let Some(layer) = short_layer_row(text, vydel) {
                row = layer;
                kind = RowKind::Main;
            }
        }

        match kind {
            RowKind::Main => repair::run(MAIN, &mut row, text),
            RowKind::SingleTrees => repair::run(SINGLE_TREES, &mut row, text),
            _ => {}
        }

        if matches!(kind, RowKind::Main | RowKind::Object) {
            self.push_main_or_object(kind, row, text, page, row_no);
            return;
        }

        if self.ctx.vydel.is_none() && !page.degraded {
            trace!(page = page.number, row_no, "line before first subdivision dropped");
            return;
        }

        let continues = is_continuation(row.get(col::DESCRIPTION));
        if kind == RowKind::Text && continues && row.any_filled(col::SPECIES..=col::OPERATIONS) {
            let piece = row.get(col::DESCRIPTION).to_string();
            if self.append_to_main(&piece) {
                let mut species = row.without_identity();
                repair::run(SPECIES, &mut species, text);
                self.push_species(RowKind::Species, &species, page, row_no);
                return;
            }
        }

        match kind {
            RowKind::Note | RowKind::Text => {
                if kind == RowKind::Text
                    && continues
                    && self.append_to_main(row.get(col::DESCRIPTION))
                {
                    return;
                }
                let mut record = self.base_record(kind, page.number, row_no, self.ctx.vydel);
                record.note = non_empty(text);
                record.raw = non_empty(&row.raw_summary());
                self.records.push(record);
            }
            RowKind::Species | RowKind::SingleTrees => {
                if kind == RowKind::Species {
                    repair::run(SPECIES, &mut row, text);
                }
                self.push_species(kind, &row, page, row_no);
            }
            _ => {}
        }
    }

    /// `Е 140` right after a species row with that element fills in its age
    /// when the recorded one is missing or implausibly young; any other such
    /// line is left to normal classification.
    fn extend_species_age(&mut self, text: &str) -> bool {
        let (Some(index), Some(vydel)) = (self.ctx.last_species, self.ctx.vydel) else {
            return false;
        };
        let Some(parts) = SPECIES_AGE.captures(text) else {
            return false;
        };
        let element = self.canon.species(&parts[1]);
        let Some(age) = int_in(&remove_whitespace(&parts[2]), 1, 300) else {
            return false;
        };
        let Some(record) = self.records.get_mut(index) else {
            return false;
        };
        if record.kind != RowKind::Species
            || record.vydel != Some(vydel)
            || record.species.as_deref() != Some(element.as_str())
        {
            return false;
        }

        let replace = match record.age {
            None => true,
            Some(previous) => {
                previous < age
                    && previous <= 30
                    && (record.height.is_some() || record.diameter.is_some())
            }
        };
        if replace {
            record.age = Some(age);
            append_raw(record, &format!("| +age:{age}"));
        }
        replace
    }

    /// Totals titles, their numeric line and per-species totals.
    fn take_totals(&mut self, page: PageScope<'_>, line: &Line, text: &str, row_no: u32) -> bool {
        if let Some(kind) = totals_title(text) {
            let mut record = self.base_record(kind, page.number, row_no, self.ctx.vydel);
            record.description = non_empty(text);
            record.raw = non_empty(text);
            self.records.push(record);
            let index = self.records.len() - 1;
            if kind == RowKind::TotalSpeciesHeader {
                self.ctx.expecting_species_totals = true;
                self.ctx.pending_totals = None;
            } else {
                self.ctx.expecting_species_totals = false;
                self.ctx.pending_totals = Some(index);
            }
            return true;
        }

        if let Some(index) = self.ctx.pending_totals.take() {
            let row = page.grid.map(|grid| {
                let mut row = split_line(line, Some(grid), self.tolerances);
                repair::run(TOTALS, &mut row, text);
                row
            });
            if let Some(payload) = totals_payload(text, row.as_ref())
                && let Some(record) = self.records.get_mut(index)
            {
                fold_totals(record, &payload);
                append_raw(record, &format!("| nums:{text}"));
                return true;
            }
        }

        if self.ctx.expecting_species_totals {
            if let Some((code, volume)) = species_total(text) {
                let mut record =
                    self.base_record(RowKind::TotalSpeciesRow, page.number, row_no, self.ctx.vydel);
                record.species = Some(self.canon.species(&code));
                record.species_volume = volume;
                record.raw = non_empty(text);
                self.records.push(record);
                return true;
            }
            if is_vydel_start(text) {
                self.ctx.expecting_species_totals = false;
            }
        }
        false
    }

    /// A bare species line under a `MAIN` row: an element the formula missed.
    fn absorb_lonely_species(
        &mut self,
        row: &Row,
        text: &str,
        page: PageScope<'_>,
        row_no: u32,
    ) -> bool {
        let (Some(index), Some(vydel)) = (self.ctx.last_main, self.ctx.vydel) else {
            return false;
        };
        if LONELY_BLOCKER.is_match(text)
            || looks_like_note_text(text)
            || is_vydel_start(text)
            || row.any_filled(col::AGE..=col::OPERATIONS)
        {
            return false;
        }
        let letters = text
            .split_whitespace()
            .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
            .collect::<Vec<_>>()
            .join("");
        if !LONELY_SPECIES.is_match(&letters) {
            return false;
        }
        let element = self.canon.species(&letters);

        let Some(main) = self.records.get_mut(index) else {
            return false;
        };
        if main.kind != RowKind::Main || main.vydel != Some(vydel) {
            return false;
        }

        let description = main.description.clone().unwrap_or_default();
        if formula_has_element(&description, &element) {
            append_raw(main, &format!("| skip-el:{element}"));
            return true;
        }
        if !description.is_empty() {
            let separator = if self.ctx.main_extra.is_empty() { "+" } else { "," };
            main.description = Some(clamp_text(&format!("{description}{separator}{element}")));
            self.ctx.main_extra.insert(element.clone());
            append_raw(main, &format!("| +el:{element}"));
        }

        if text.chars().any(|c| c.is_ascii_digit())
            && self.ctx.emitted_lonely.insert((vydel, element.clone()))
        {
            let mut record = self.base_record(RowKind::Species, page.number, row_no, Some(vydel));
            record.species = Some(element);
            record.note = Some("element-only".to_string());
            record.raw = Some(clamp_text(&format!("lonely:{text}")));
            self.records.push(record);
        }
        true
    }

    /// An `OBJECT` whose description is a stand kind rather than a land feature.
    fn is_subdivision_header(&self, row: &Row) -> bool {
        let description = row.get(col::DESCRIPTION);
        !description.is_empty()
            && row.all_empty(col::LAYER..=col::MERCH_CLASS)
            && !self.is_real_object(description)
    }

    fn is_real_object(&self, description: &str) -> bool {
        let lower = description.to_lowercase();
        REAL_OBJECT_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
            || (self.canon.object_kind(description, Lookup::Contained).is_some()
                && self
                    .canon
                    .stand_header_kind(description, Lookup::Exact)
                    .is_none())
    }

    fn push_subdivision_header(&mut self, row: &Row, text: &str, page: PageScope<'_>, row_no: u32) {
        let vydel = parse_int(row.get(col::VYDEL));
        let description = self.lookup_in_row(row, text, |canon, candidate, lookup| {
            canon.stand_header_kind(candidate, lookup)
        });

        let mut record = self.base_record(RowKind::VydelHeader, page.number, row_no, vydel);
        record.area = parse_number(row.get(col::AREA));
        record.description.clone_from(&description);
        if description.is_none() {
            record.note = non_empty(text);
        }
        if !row.is_degraded() {
            record.operations =
                non_empty(row.get(col::OPERATIONS)).map(|ops| self.canon.operation(&ops));
        }
        record.raw = non_empty(&row.raw_summary());
        self.records.push(record);

        self.ctx.pending_stand = Some(PendingStand {
            vydel,
            description: description.unwrap_or_default(),
            composition: None,
        });
        self.ctx.vydel = vydel;
        self.ctx.last_main = None;
        self.ctx.last_species = None;
    }

    /// The metrics line that follows a subdivision header becomes its `MAIN`.
    fn complete_pending_stand(&mut self, row: &mut Row, text: &str) -> bool {
        let Some(pending) = self.ctx.pending_stand.as_ref() else {
            return false;
        };
        if row.all_empty(col::LAYER..=col::MERCH_CLASS) || !is_stocking(row.get(col::STOCKING)) {
            return false;
        }

        let current = row.get(col::DESCRIPTION).to_string();
        let description = if pending.describes_stand() {
            pending
                .composition
                .clone()
                .or_else(|| composition_anywhere(text))
                .or_else(|| composition_token(&current))
                .unwrap_or(current)
        } else {
            normalize_spaces(&format!("{} {current}", pending.description))
        };
        row.set(
            col::VYDEL,
            pending.vydel.map(|vydel| vydel.to_string()).unwrap_or_default(),
        );
        row.clear(col::AREA);
        row.set(col::DESCRIPTION, description);
        self.ctx.pending_stand = None;
        true
    }

    fn push_main_or_object(
        &mut self,
        kind: RowKind,
        mut row: Row,
        text: &str,
        page: PageScope<'_>,
        row_no: u32,
    ) {
        let mut note = None;
        if kind == RowKind::Object {
            match self.lookup_in_row(&row, text, |canon, candidate, lookup| {
                canon.object_kind(candidate, lookup)
            }) {
                Some(description) => row.set(col::DESCRIPTION, description),
                None => {
                    row.clear(col::DESCRIPTION);
                    note = non_empty(text);
                }
            }
        }

        let mut record = self.record_from_row(kind, &row, page.number, row_no);
        if note.is_some() {
            record.note = note;
        }
        let vydel = record.vydel;
        self.records.push(record);
        let index = self.records.len() - 1;
        self.ctx.open_record(vydel, index, kind == RowKind::Main);
    }

    fn push_species(&mut self, kind: RowKind, row: &Row, page: PageScope<'_>, row_no: u32) {
        let mut record = self.record_from_row(kind, row, page.number, row_no);
        record.vydel = self.ctx.vydel;
        record.area = None;
        record.description = None;
        if kind == RowKind::SingleTrees {
            let coefficient = if row.is_degraded() {
                row.get(col::OPERATIONS).split_whitespace().next().unwrap_or_default()
            } else {
                row.get(col::AREA)
            };
            record.description = non_empty(coefficient);
        }

        if let Some(site) = record.site_conditions.clone()
            && let Some(main) = self
                .ctx
                .last_main
                .and_then(|index| self.records.get_mut(index))
            && main.kind == RowKind::Main
            && main.vydel == record.vydel
            && main.site_conditions.is_none()
        {
            main.site_conditions = Some(site);
            record.site_conditions = None;
        }

        self.records.push(record);
        if kind == RowKind::Species {
            self.ctx.last_species = Some(self.records.len() - 1);
        }
    }

    /// Appends a `+ИВ` style fragment to the current `MAIN` formula.
    fn append_to_main(&mut self, piece: &str) -> bool {
        let Some(main) = self
            .ctx
            .last_main
            .and_then(|index| self.records.get_mut(index))
        else {
            return false;
        };
        if main.kind != RowKind::Main || main.vydel != self.ctx.vydel {
            return false;
        }
        let piece = remove_whitespace(piece).to_uppercase();
        let description = main.description.clone().unwrap_or_default();
        main.description = Some(clamp_text(&format!("{description}{piece}")));
        append_raw(main, &format!("| cont:{piece}"));
        true
    }

    /// Tries the description cell, the operations cell, both, then the whole
    /// line exactly, then looks for a contained key.
    fn lookup_in_row(
        &self,
        row: &Row,
        text: &str,
        find: impl Fn(&dyn Canonicalizer, &str, Lookup) -> Option<String>,
    ) -> Option<String> {
        let description = row.get(col::DESCRIPTION);
        let operations = if row.is_degraded() { "" } else { row.get(col::OPERATIONS) };
        let combined = normalize_spaces(&format!("{description} {operations}"));

        [description, operations, combined.as_str(), text]
            .into_iter()
            .filter(|candidate| !candidate.is_empty())
            .find_map(|candidate| find(self.canon, candidate, Lookup::Exact))
            .or_else(|| {
                [combined.as_str(), text]
                    .into_iter()
                    .filter(|candidate| !candidate.is_empty())
                    .find_map(|candidate| find(self.canon, candidate, Lookup::Contained))
            })
    }

    fn base_record(&self, kind: RowKind, page: u32, row_no: u32, vydel: Option<u32>) -> Record {
        Record {
            quarter: self.ctx.quarter,
            row_no,
            category: self.ctx.category.clone(),
            vydel,
            kind,
            page,
            ..Record::default()
        }
    }

    fn record_from_row(&self, kind: RowKind, row: &Row, page: u32, row_no: u32) -> Record {
        let (forest_type, site_conditions) =
            self.canon.forest_type_and_site(row.get(col::FOREST_TYPE));
        let (operations, note) = if row.is_degraded() {
            (None, non_empty(row.get(col::OPERATIONS)))
        } else {
            (
                non_empty(row.get(col::OPERATIONS)).map(|ops| self.canon.operation(&ops)),
                None,
            )
        };
        let mut record = self.base_record(kind, page, row_no, parse_int(row.get(col::VYDEL)));
        record.area = parse_number(row.get(col::AREA));
        record.description = non_empty(row.get(col::DESCRIPTION));
        record.layer = parse_int(row.get(col::LAYER));
        record.layer_height = parse_int(row.get(col::LAYER_HEIGHT));
        record.species = non_empty(row.get(col::SPECIES)).map(|code| self.canon.species(&code));
        record.age = parse_int(row.get(col::AGE));
        record.height = parse_int(row.get(col::HEIGHT));
        record.diameter = parse_int(row.get(col::DIAMETER));
        record.age_class = parse_int(row.get(col::AGE_CLASS));
        record.age_group = parse_int(row.get(col::AGE_GROUP));
        record.site_class = non_empty(row.get(col::SITE_CLASS));
        record.forest_type = forest_type;
        record.site_conditions = site_conditions;
        record.stocking = parse_number(row.get(col::STOCKING));
        record.volume_per_ha = parse_number(row.get(col::VOLUME_PER_HA));
        record.total_volume = parse_number(row.get(col::TOTAL_VOLUME));
        record.species_volume = parse_number(row.get(col::SPECIES_VOLUME));
        record.merch_class = parse_int(row.get(col::MERCH_CLASS));
        record.dead_standing = parse_number(row.get(col::DEAD_STANDING));
        record.sparse_stand = parse_number(row.get(col::SPARSE_STAND));
        record.single_trees = parse_number(row.get(col::SINGLE_TREES));
        record.litter_total = parse_number(row.get(col::LITTER_TOTAL));
        record.litter_liquid = parse_number(row.get(col::LITTER_LIQUID));
        record.operations = operations;
        record.note = note;
        record.raw = non_empty(&row.raw_summary());
        record
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = normalize_spaces(text);
    (!text.is_empty()).then(|| clamp_text(&text))
}

fn append_raw(record: &mut Record, marker: &str) {
    let raw = record.raw.take().unwrap_or_default();
    record.raw = non_empty(&format!("{raw} {marker}"));
}

fn fold_totals(record: &mut Record, payload: &TotalsPayload) {
    record.area = payload.area.or(record.area);
    record.total_volume = payload.total_volume.or(record.total_volume);
    record.species_volume = payload.species_volume.or(record.species_volume);
    record.merch_class = payload.merch_class.or(record.merch_class);
    record.dead_standing = payload.dead_standing.or(record.dead_standing);
    record.sparse_stand = payload.sparse_stand.or(record.sparse_stand);
    record.single_trees = payload.single_trees.or(record.single_trees);
    record.litter_total = payload.litter_total.or(record.litter_total);
    record.litter_liquid = payload.litter_liquid.or(record.litter_liquid);
}

fn is_continuation(text: &str) -> bool {
    text.starts_with('+') || text.starts_with(',')
}

fn formula_has_element(formula: &str, element: &str) -> bool {
    let formula = compact_key(formula);
    let element = compact_key(element);
    !formula.is_empty() && !element.is_empty() && formula.contains(&element)
}

/// Description of a `MAIN` line: everything after subdivision and area up to
/// the layer number and layer height.
fn main_description(text: &str, row: &Row) -> Option<String> {
    let tail = MAIN_HEAD.captures(text)?.get(1)?.as_str();
    let tail = SPLIT_DECIMAL.replace(tail, "");

    let layered = match (parse_int(row.get(col::LAYER)), parse_int(row.get(col::LAYER_HEIGHT))) {
        (Some(layer), Some(height)) => Regex::new(&format!(r"\b{layer}\s+{height}\b"))
            .ok()
            .and_then(|pattern| pattern.find(&tail).map(|found| found.start())),
        _ => None,
    };
    let end = layered
        .or_else(|| LAYER_START.find(&tail).map(|found| found.start()))
        .unwrap_or(tail.len());
    let description = normalize_spaces(&tail[..end]);
    (!description.is_empty()).then_some(description)
}

/// Another storey of the current subdivision, printed without its number.
/// Returns the composition to use as description.
fn layer_without_id(row: &Row) -> Option<String> {
    if !row.is_empty(col::VYDEL) {
        return None;
    }
    let candidate = if row.is_empty(col::AREA) {
        row.get(col::DESCRIPTION)
    } else {
        row.get(col::AREA)
    };
    let compact = remove_whitespace(candidate).to_uppercase();
    let looks_like_composition = compact.chars().any(|c| c.is_ascii_digit())
        && compact.chars().any(char::is_alphabetic);

    let has_element = is_species_code(&remove_whitespace(row.get(col::SPECIES)));
    let mut has_dims = int_in(row.get(col::AGE), 1, 300).is_some()
        || int_in(row.get(col::HEIGHT), 1, 99).is_some()
        || int_in(row.get(col::DIAMETER), 1, 150).is_some();
    if !has_dims {
        has_dims = [col::HEIGHT, col::AGE].into_iter().any(|index| {
            AGE_HEIGHT_PAIR.captures(row.get(index)).is_some_and(|parts| {
                int_in(&parts[1], 0, 300).is_some() || int_in(&parts[2], 0, 99).is_some()
            })
        });
    }

    let is_layer = if is_stocking(row.get(col::STOCKING)) {
        let layer_ok = row.is_empty(col::LAYER) || int_in(row.get(col::LAYER), 1, 5).is_some();
        layer_ok && (has_element || has_dims || looks_like_composition)
    } else {
        looks_like_composition
            && row.any_filled(col::LAYER_HEIGHT..=col::LITTER_LIQUID)
            && (has_element || has_dims)
    };
    is_layer.then(|| if looks_like_composition { compact } else { String::new() })
}

/// `2Е1Б 18 Е 90 20 22 5 180` read straight from the text when the cells
/// are unusable.
fn short_layer_row(text: &str, vydel: u32) -> Option<Row> {
    let parts = SHORT_LAYER.captures(text)?;
    let mut row = Row::default();
    row.set(col::VYDEL, vydel.to_string());
    row.set(col::DESCRIPTION, remove_whitespace(&parts[1]).to_uppercase());
    row.set(col::LAYER, "1");
    row.set(col::LAYER_HEIGHT, &parts[2]);
    row.set(col::SPECIES, parts[3].to_uppercase());
    row.set(col::AGE, &parts[4]);
    row.set(col::HEIGHT, &parts[5]);
    row.set(col::DIAMETER, &parts[6]);
    row.set(col::AGE_CLASS, &parts[7]);
    row.set(col::VOLUME_PER_HA, parts[8].replace(',', "."));
    Some(row)
}
