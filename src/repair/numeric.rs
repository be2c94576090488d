use std::sync::LazyLock;

use regex::Regex;

use crate::row::{Row, col};
use crate::text::remove_whitespace;

static SPACED_DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d)\s*[.,]\s*(\d)").expect("hardcoded spaced-decimal regex is valid")
});
static SPACED_INTEGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d(?:\s+\d){1,2}$").expect("hardcoded spaced-integer regex is valid")
});

const DECIMAL_COLUMNS: [usize; 10] = [
    col::AREA,
    col::STOCKING,
    col::VOLUME_PER_HA,
    col::TOTAL_VOLUME,
    col::SPECIES_VOLUME,
    col::DEAD_STANDING,
    col::SPARSE_STAND,
    col::SINGLE_TREES,
    col::LITTER_TOTAL,
    col::LITTER_LIQUID,
];

const INTEGER_COLUMNS: [usize; 17] = [
    col::LAYER,
    col::LAYER_HEIGHT,
    col::AGE,
    col::HEIGHT,
    col::DIAMETER,
    col::AGE_CLASS,
    col::AGE_GROUP,
    col::SITE_CLASS,
    col::VOLUME_PER_HA,
    col::TOTAL_VOLUME,
    col::SPECIES_VOLUME,
    col::MERCH_CLASS,
    col::DEAD_STANDING,
    col::SPARSE_STAND,
    col::SINGLE_TREES,
    col::LITTER_TOTAL,
    col::LITTER_LIQUID,
];

/// `22 . 8` / `0 ,7` become `22.8` / `0.7`.
pub(super) fn join_spaced_decimals(row: &mut Row, _text: &str) {
    for index in DECIMAL_COLUMNS {
        let value = row.get(index);
        if value.is_empty() || !SPACED_DECIMAL.is_match(value) {
            continue;
        }
        let joined = SPACED_DECIMAL.replace_all(value, "$1.$2").into_owned();
        row.set(index, joined);
    }
}

/// Single digits separated by spaces (`1 2 0`) are one broken integer.
pub(super) fn join_spaced_integers(row: &mut Row, _text: &str) {
    for index in INTEGER_COLUMNS {
        let value = row.get(index);
        if SPACED_INTEGER.is_match(value) {
            let joined = remove_whitespace(value);
            row.set(index, joined);
        }
    }
}
