//! Row kinds, decided in a fixed priority order.
//!
//! Totals titles and their payload lines are recognized from the line text
//! alone; everything else looks at the repaired cells plus the context flags.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::ParseContext;
use crate::model::RowKind;
use crate::row::{Row, col};
use crate::text::{
    compact_key, is_stocking, normalize_broken_words, numbers_in, parse_int, parse_number,
};

static NOTE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:подрост|подлесок|Болота:|Земли линейного протяжения:|Расчистка просек)")
        .expect("hardcoded note marker regex is valid")
});
static SINGLE_TREES_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Единичные деревья").expect("hardcoded single trees regex is valid")
});
static COEFFICIENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d{1,2}[А-ЯЁA-Z]{1,3}$").expect("hardcoded coefficient regex is valid")
});
static AREA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("hardcoded area regex is valid"));
static NUMBER_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:[.,]\d+)?(?:\s+\d+(?:[.,]\d+)?)+$")
        .expect("hardcoded number sequence regex is valid")
});
static SPECIES_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([А-ЯЁA-Z\s]{1,20}?)(?:\s+(\d+(?:[.,]\d+)?))?$")
        .expect("hardcoded species total regex is valid")
});
static SPECIES_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[А-ЯЁA-Z]{1,6}$").expect("hardcoded species regex is valid")
});
static VYDEL_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,4}\s+\d+(?:[.,]\d+)?\b").expect("hardcoded subdivision start regex is valid")
});
static LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-zА-ЯЁа-яё]").expect("hardcoded letter regex is valid"));

const TOTALS_TITLES: [(&str, RowKind); 3] = [
    ("итогопокатегории", RowKind::TotalCategory),
    ("итогопокварталу", RowKind::TotalQuarter),
    ("посоставляющимпородам", RowKind::TotalSpeciesHeader),
];

/// `Итого по категории`, `Итого по кварталу` or `По составляющим породам`,
/// tolerant to words broken by stray gaps.
pub(crate) fn totals_title(text: &str) -> Option<RowKind> {
    let compact = compact_key(&normalize_broken_words(text));
    TOTALS_TITLES
        .iter()
        .find(|(title, _)| compact.starts_with(title))
        .map(|(_, kind)| *kind)
}

/// Values of a totals line, in output units.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct TotalsPayload {
    pub(crate) area: Option<f64>,
    pub(crate) total_volume: Option<f64>,
    pub(crate) species_volume: Option<f64>,
    pub(crate) merch_class: Option<u32>,
    pub(crate) dead_standing: Option<f64>,
    pub(crate) sparse_stand: Option<f64>,
    pub(crate) single_trees: Option<f64>,
    pub(crate) litter_total: Option<f64>,
    pub(crate) litter_liquid: Option<f64>,
}

/// Reads the numeric line that follows a totals title.
///
/// With a grid the placed cells are trusted; without one (or when the cells
/// hold nothing) a bare sequence of numbers is read as area, the largest
/// remaining value as total volume and the smallest as single trees.
pub(crate) fn totals_payload(text: &str, row: Option<&Row>) -> Option<TotalsPayload> {
    let text = text.trim();
    if LETTER.is_match(text) {
        return None;
    }

    if let Some(row) = row
        && !row.is_degraded()
        && row.any_filled(col::TOTAL_VOLUME..=col::LITTER_LIQUID)
    {
        let number = |index| parse_number(row.get(index));
        return Some(TotalsPayload {
            area: number(col::AREA),
            total_volume: number(col::TOTAL_VOLUME),
            species_volume: number(col::SPECIES_VOLUME),
            merch_class: parse_int(row.get(col::MERCH_CLASS)),
            dead_standing: number(col::DEAD_STANDING),
            sparse_stand: number(col::SPARSE_STAND),
            single_trees: number(col::SINGLE_TREES),
            litter_total: number(col::LITTER_TOTAL),
            litter_liquid: number(col::LITTER_LIQUID),
        });
    }

    if !NUMBER_SEQUENCE.is_match(text) {
        return None;
    }
    let numbers = numbers_in(text);
    let (area, rest) = numbers.split_first()?;
    let largest = rest.iter().copied().reduce(f64::max);
    let smallest = rest.iter().copied().reduce(f64::min);
    let single_trees = match (largest, smallest) {
        (Some(largest), Some(smallest)) if rest.len() >= 2 && smallest < largest => Some(smallest),
        _ => None,
    };
    Some(TotalsPayload {
        area: Some(*area),
        total_volume: largest,
        single_trees,
        ..TotalsPayload::default()
    })
}

/// `code [volume]` row of the by-species totals block. The code may be
/// printed with spaces between its letters.
pub(crate) fn species_total(text: &str) -> Option<(String, Option<f64>)> {
    let text = normalize_broken_words(text.trim());
    let parts = SPECIES_TOTAL.captures(&text)?;
    let code: String = parts[1]
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if !SPECIES_CODE.is_match(&code) {
        return None;
    }
    let volume = match parts.get(2) {
        Some(value) => Some(parse_number(value.as_str())?),
        None => None,
    };
    Some((code, volume))
}

/// Line opening a new subdivision: number followed by area.
pub(crate) fn is_vydel_start(text: &str) -> bool {
    VYDEL_START.is_match(text.trim())
}

/// Decides the kind of a repaired row and updates the single-trees flag.
pub(crate) fn classify_row(row: &Row, text: &str, ctx: &mut ParseContext) -> RowKind {
    let text = normalize_broken_words(text.trim());
    let left = (col::VYDEL..=col::SPECIES)
        .map(|index| row.get(index))
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let left = normalize_broken_words(&left);

    if NOTE_MARKER.is_match(&left) || NOTE_MARKER.is_match(&text) {
        ctx.in_single_trees = false;
        return RowKind::Note;
    }

    if SINGLE_TREES_MARKER.is_match(&left) || SINGLE_TREES_MARKER.is_match(&text) {
        ctx.in_single_trees = true;
        return RowKind::Note;
    }

    if ctx.in_single_trees {
        ctx.in_single_trees = false;
        let lower = text.to_lowercase();
        if lower.contains("подрост") || lower.contains("подлесок") {
            return RowKind::Note;
        }
        if single_trees_line(row, &text) {
            return RowKind::SingleTrees;
        }
    }

    if parse_int(row.get(col::VYDEL)).is_some() && AREA.is_match(row.get(col::AREA)) {
        if is_stocking(row.get(col::STOCKING)) {
            return RowKind::Main;
        }
        if !row.is_empty(col::DESCRIPTION) {
            return RowKind::Object;
        }
    }

    if !row.is_degraded()
        && row.all_empty(col::VYDEL..=col::LAYER_HEIGHT)
        && row.any_filled(col::SPECIES..=col::OPERATIONS)
    {
        return RowKind::Species;
    }

    RowKind::Text
}

/// Coefficient such as `2Е` followed by numbers further right.
fn single_trees_line(row: &Row, text: &str) -> bool {
    if row.is_degraded() {
        let mut tokens = text.split_whitespace();
        let coefficient = tokens.next().unwrap_or_default();
        let rest = tokens.collect::<Vec<_>>().join(" ");
        return COEFFICIENT.is_match(coefficient) && rest.chars().any(|ch| ch.is_ascii_digit());
    }
    let right_has_digits = (col::LAYER_HEIGHT..=col::OPERATIONS)
        .any(|index| row.get(index).chars().any(|ch| ch.is_ascii_digit()));
    COEFFICIENT.is_match(row.get(col::AREA)) && right_has_digits
}
