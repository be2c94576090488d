use std::sync::LazyLock;

use regex::Regex;

use crate::row::{Row, col};
use crate::text::{int_in, is_merch_class, normalize_site_class, parse_int};

static SITE_CLASS_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(5[аА]|[1-5])\s+(.+)$").expect("hardcoded regex is valid"));
static STOCKING_AND_VOLUME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0\.\d|1(?:\.0)?)\s+(\d+(?:\.\d+)?)$").expect("hardcoded regex is valid")
});
static SHORT_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})\s+(\d{1,3})$").expect("hardcoded regex is valid"));
static AGE_HEIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})\s+(\d{1,2})$").expect("hardcoded regex is valid"));
static AGE_HEIGHT_DIAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\s+(\d{1,2})(?:\s+(\d{1,3}))?$").expect("hardcoded regex is valid")
});
static DIAMETER_AND_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:[.,]\d+)?)\s+(\d+)$").expect("hardcoded regex is valid")
});
static CODE_WITH_AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([А-ЯЁA-Z]{1,6})\s*(\d{1,3})$").expect("hardcoded regex is valid")
});
static CODE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([А-ЯЁA-Z]{1,6})").expect("hardcoded regex is valid"));
static SPLIT_SUFFIX_AGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^А\s*(\d{1,3})$").expect("hardcoded regex is valid"));
static ANY_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(\d+)$").expect("hardcoded regex is valid"));

/// `5А ЧЕР` in the forest-type cell when the site class cell is empty.
pub(super) fn site_class_from_forest_type(row: &mut Row, _text: &str) {
    if !row.is_empty(col::SITE_CLASS) {
        return;
    }
    let forest_type = row.get(col::FOREST_TYPE).to_string();
    let Some(parts) = SITE_CLASS_PREFIX.captures(&forest_type) else {
        return;
    };
    let Some(class) = normalize_site_class(&parts[1]) else {
        return;
    };
    row.set(col::SITE_CLASS, class);
    row.set(col::FOREST_TYPE, &parts[2]);
}

/// Merchantability class printed one column late, in the dead-standing cell.
pub(super) fn merch_class_from_dead_standing(row: &mut Row, _text: &str) {
    let late = row.get(col::DEAD_STANDING);
    if !is_merch_class(late) {
        return;
    }
    if row.is_empty(col::MERCH_CLASS) {
        let class = late.to_string();
        row.set(col::MERCH_CLASS, class);
        row.clear(col::DEAD_STANDING);
    } else if parse_int(row.get(col::MERCH_CLASS)) == parse_int(late) {
        row.clear(col::DEAD_STANDING);
    }
}

/// `0.5 21` in the volume-per-hectare cell when stocking is empty.
pub(super) fn split_stocking_volume(row: &mut Row, _text: &str) {
    if !row.is_empty(col::STOCKING) {
        return;
    }
    let volume = row.get(col::VOLUME_PER_HA).replace(',', ".");
    if let Some(parts) = STOCKING_AND_VOLUME.captures(&volume) {
        row.set(col::STOCKING, &parts[1]);
        row.set(col::VOLUME_PER_HA, &parts[2]);
    }
}

/// `120 26` in the age cell when height is empty.
pub(super) fn split_age_height(row: &mut Row, _text: &str) {
    if !row.is_empty(col::HEIGHT) {
        return;
    }
    let age = row.get(col::AGE).to_string();
    if let Some(parts) = AGE_HEIGHT.captures(&age) {
        row.set(col::AGE, &parts[1]);
        row.set(col::HEIGHT, &parts[2]);
    }
}

/// Splits `a b` in `source` into `source`/`target` when both halves are in
/// range and `target` is empty.
fn split_pair(row: &mut Row, source: usize, target: usize, first: (u32, u32), second: (u32, u32)) {
    if !row.is_empty(target) {
        return;
    }
    let value = row.get(source).to_string();
    let Some(parts) = SHORT_PAIR.captures(&value) else {
        return;
    };
    let (Some(a), Some(b)) = (
        int_in(&parts[1], first.0, first.1),
        int_in(&parts[2], second.0, second.1),
    ) else {
        return;
    };
    row.set(source, a.to_string());
    row.set(target, b.to_string());
}

/// Adjacent stand metrics glued into one cell: age/height, height/diameter,
/// diameter/age class, age class/age group, age group/site class.
pub(super) fn split_paired_metrics(row: &mut Row, _text: &str) {
    split_pair(row, col::AGE, col::HEIGHT, (1, 300), (1, 99));
    split_pair(row, col::HEIGHT, col::DIAMETER, (1, 99), (1, 150));

    if row.is_empty(col::AGE_CLASS) {
        let diameter = row.get(col::DIAMETER).to_string();
        if let Some(parts) = DIAMETER_AND_CLASS.captures(&diameter) {
            row.set(col::DIAMETER, parts[1].replace(',', "."));
            row.set(col::AGE_CLASS, &parts[2]);
        }
    }

    split_pair(row, col::AGE_CLASS, col::AGE_GROUP, (1, 12), (1, 10));
    split_pair(row, col::AGE_GROUP, col::SITE_CLASS, (1, 10), (1, 5));
}

/// Species code with its age glued on (`ОЛСА50`, `ОЛСА 50`, `ОЛС` + `А 70`).
pub(super) fn split_species_code(row: &mut Row, _text: &str) {
    let code = row.get(col::SPECIES).to_uppercase().replace(char::is_whitespace, "");
    if code.is_empty() {
        return;
    }

    let original = row.get(col::SPECIES).to_string();
    if let Some(parts) = CODE_WITH_AGE.captures(&original) {
        let age = parts[2].to_string();
        row.set(col::SPECIES, parts[1].to_uppercase());
        if row.is_empty(col::AGE) {
            row.set(col::AGE, age);
        }
        return;
    }

    let age = row.get(col::AGE).to_string();
    if code == "ОЛС"
        && let Some(parts) = SPLIT_SUFFIX_AGE.captures(&age)
    {
        let age = parts[1].to_string();
        row.set(col::SPECIES, "ОЛСА");
        row.set(col::AGE, age);
        return;
    }

    if code.chars().any(|ch| ch.is_ascii_digit())
        && let Some(parts) = CODE_PREFIX.captures(&code)
    {
        row.set(col::SPECIES, parts[1].to_uppercase());
        return;
    }
    row.set(col::SPECIES, code);
}

/// `100 24` (or `100 24 28`) in the height cell of a species row without age.
pub(super) fn split_species_age_height(row: &mut Row, _text: &str) {
    if row.is_empty(col::SPECIES) || !row.is_empty(col::AGE) {
        return;
    }
    let height = row.get(col::HEIGHT).to_string();
    let Some(parts) = AGE_HEIGHT_DIAMETER.captures(&height) else {
        return;
    };
    let (Some(age), Some(h)) = (int_in(&parts[1], 1, 300), int_in(&parts[2], 1, 99)) else {
        return;
    };
    row.set(col::AGE, age.to_string());
    row.set(col::HEIGHT, h.to_string());
    if let Some(diameter) = parts.get(3)
        && row.is_empty(col::DIAMETER)
    {
        row.set(col::DIAMETER, diameter.as_str());
    }
}

/// Isolated-tree rows print `age height` in the height cell.
pub(super) fn split_single_trees_age(row: &mut Row, _text: &str) {
    if !row.is_empty(col::AGE) {
        return;
    }
    let height = row.get(col::HEIGHT).to_string();
    if let Some(parts) = ANY_PAIR.captures(&height) {
        row.set(col::AGE, &parts[1]);
        row.set(col::HEIGHT, &parts[2]);
    }
}
