use std::sync::LazyLock;

use regex::Regex;

use crate::row::{Row, col};
use crate::text::{
    compact_key, first_number, format_number, int_in, is_merch_class, number_tokens,
    parse_int, parse_number,
};

static VYDEL_AND_AREA_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,4})\s+(\d+)$").expect("hardcoded regex is valid"));
static FRACTION_AND_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[.,](\d+)(?:\s+(.*))?$").expect("hardcoded regex is valid"));
static INT_WITH_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[.,]$").expect("hardcoded regex is valid"));
static INT_AND_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:\s+(.*))?$").expect("hardcoded regex is valid"));
static FRACTION_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[.,](\d+)$").expect("hardcoded regex is valid"));
static AREA_AND_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:[.,]\d+)?)(?:\s+(.+))?$").expect("hardcoded regex is valid")
});
static PLAIN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("hardcoded regex is valid"));
static FRACTION_AND_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\.\d+)\s+(\d+)$").expect("hardcoded regex is valid"));
static VOLUME_AND_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\.?\s+(\d+)$").expect("hardcoded regex is valid")
});
static VOLUME_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:[.,]\d+)?)\.?\s+(\d+(?:[.,]\d+)?)\.?$").expect("hardcoded regex is valid")
});
static HAS_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-zА-ЯЁа-яё]").expect("hardcoded regex is valid"));

/// Prepends a spilled description tail unless the description already says it.
fn prepend_description(row: &mut Row, tail: &str) {
    let tail = tail.trim();
    if tail.is_empty() {
        return;
    }
    let current = row.get(col::DESCRIPTION).to_string();
    if compact_key(tail) == compact_key(&current) {
        if current.is_empty() {
            row.set(col::DESCRIPTION, tail);
        }
    } else {
        row.set(col::DESCRIPTION, format!("{tail} {current}"));
    }
}

/// Area split over the subdivision/area/description boundaries:
/// `52 0` + `.3 Ручьи`, `0` + `.3 Ручьи`, `0.` + `3 Ручьи`, or a bare `.3`.
pub(super) fn split_vydel_area(row: &mut Row, _text: &str) {
    let vydel = row.get(col::VYDEL).to_string();
    let area = row.get(col::AREA).to_string();
    let description = row.get(col::DESCRIPTION).to_string();

    if let (Some(head), Some(rest)) = (
        VYDEL_AND_AREA_INT.captures(&vydel),
        FRACTION_AND_TAIL.captures(&area),
    ) {
        row.set(col::VYDEL, &head[1]);
        row.set(col::AREA, format!("{}.{}", &head[2], &rest[1]));
        if let Some(tail) = rest.get(2) {
            prepend_description(row, tail.as_str());
        }
        return;
    }

    if int_in(&vydel, 0, 9999).is_none() || vydel.len() > 4 {
        return;
    }

    if parse_int(&area).is_some()
        && let Some(rest) = FRACTION_AND_TAIL.captures(&description)
    {
        row.set(col::AREA, format!("{area}.{}", &rest[1]));
        row.clear(col::DESCRIPTION);
        if let Some(tail) = rest.get(2) {
            prepend_description(row, tail.as_str());
        }
        return;
    }

    if let (Some(int_part), Some(rest)) = (
        INT_WITH_SEPARATOR.captures(&area),
        INT_AND_TAIL.captures(&description),
    ) {
        row.set(col::AREA, format!("{}.{}", &int_part[1], &rest[1]));
        row.clear(col::DESCRIPTION);
        if let Some(tail) = rest.get(2) {
            prepend_description(row, tail.as_str());
        }
        return;
    }

    if let Some(fraction) = FRACTION_ONLY.captures(&area) {
        row.set(col::AREA, format!("0.{}", &fraction[1]));
    }
}

/// `36` + `.6 7Б...` (or `36.` + `6 7Б...`) on a subdivision row.
pub(super) fn merge_area_fraction(row: &mut Row, _text: &str) {
    if parse_int(row.get(col::VYDEL)).is_none() {
        return;
    }
    let area = row.get(col::AREA).to_string();
    let description = row.get(col::DESCRIPTION).to_string();
    if area.is_empty() || description.is_empty() {
        return;
    }

    if parse_int(&area).is_some()
        && let Some(rest) = FRACTION_AND_TAIL.captures(&description)
    {
        row.set(col::AREA, format!("{area}.{}", &rest[1]));
        row.set(col::DESCRIPTION, rest.get(2).map_or("", |m| m.as_str()));
        return;
    }

    if let (Some(int_part), Some(rest)) = (
        INT_WITH_SEPARATOR.captures(&area),
        INT_AND_TAIL.captures(&description),
    ) {
        row.set(col::AREA, format!("{}.{}", &int_part[1], &rest[1]));
        row.set(col::DESCRIPTION, rest.get(2).map_or("", |m| m.as_str()));
    }
}

/// Area cell carrying the start of the description (`22.8 Культуры`).
pub(super) fn split_area_tail(row: &mut Row, _text: &str) {
    if parse_int(row.get(col::VYDEL)).is_none() {
        return;
    }
    let area = row.get(col::AREA).to_string();
    let Some(parts) = AREA_AND_TAIL.captures(&area) else {
        return;
    };
    let Some(tail) = parts.get(2).map(|m| m.as_str().trim()).filter(|t| !t.is_empty()) else {
        return;
    };
    let description = row.get(col::DESCRIPTION);
    let joined = if description.is_empty() {
        tail.to_string()
    } else {
        format!("{tail} {description}")
    };
    row.set(col::DESCRIPTION, joined);
    row.set(col::AREA, parts[1].replace(',', "."));
}

/// Land-feature names long enough to reach the layer-height column.
pub(super) fn merge_object_description(row: &mut Row, _text: &str) {
    let spill = row.get(col::LAYER_HEIGHT);
    if row.is_empty(col::DESCRIPTION) || spill.is_empty() || PLAIN_NUMBER.is_match(spill) {
        return;
    }
    let joined = format!("{} {spill}", row.get(col::DESCRIPTION));
    row.set(col::DESCRIPTION, joined);
    row.clear(col::LAYER_HEIGHT);
}

/// Sorts out species volume and merchantability class, which often share or
/// swap cells.
pub(super) fn volume_and_merch_class(row: &mut Row, _text: &str) {
    let volume = row.get(col::SPECIES_VOLUME).replace(',', ".");
    let class = row.get(col::MERCH_CLASS).replace(',', ".");

    // `167` + `.1 1`
    if parse_int(&volume).is_some()
        && let Some(parts) = FRACTION_AND_CLASS.captures(&class)
        && is_merch_class(&parts[2])
    {
        row.set(col::SPECIES_VOLUME, format!("{volume}{}", &parts[1]));
        row.set(col::MERCH_CLASS, &parts[2]);
        return;
    }

    // class cell holds `volume class`
    if let Some(parts) = VOLUME_AND_CLASS.captures(&class)
        && parse_number(&parts[1]).is_some_and(|v| v > 4.0)
        && is_merch_class(&parts[2])
    {
        if volume.is_empty() || is_merch_class(&volume) {
            row.set(col::SPECIES_VOLUME, &parts[1]);
        }
        row.set(col::MERCH_CLASS, &parts[2]);
        return;
    }

    // volume cell holds `volume class`
    if let Some(parts) = VOLUME_AND_CLASS.captures(&volume)
        && parse_number(&parts[1]).is_some_and(|v| v > 4.0)
        && is_merch_class(&parts[2])
    {
        row.set(col::SPECIES_VOLUME, &parts[1]);
        if !is_merch_class(&class) {
            row.set(col::MERCH_CLASS, &parts[2]);
        }
        return;
    }

    let class_volume = first_number(&class);

    // swapped
    if is_merch_class(&volume)
        && let Some(z) = class_volume.filter(|z| *z > 4.0)
    {
        row.set(col::SPECIES_VOLUME, format_number(z));
        row.set(col::MERCH_CLASS, volume);
        return;
    }

    // volume landed one column late
    if volume.is_empty()
        && !is_merch_class(&class)
        && let Some(z) = class_volume.filter(|z| *z > 4.0)
    {
        row.set(col::SPECIES_VOLUME, format_number(z));
        row.clear(col::MERCH_CLASS);
        return;
    }

    if !class.is_empty() && !is_merch_class(&class) {
        row.clear(col::MERCH_CLASS);
    }
}

/// Liquid litter is numeric; text or percentages there belong to operations.
pub(super) fn operations_from_litter(row: &mut Row, _text: &str) {
    let litter = row.get(col::LITTER_LIQUID).to_string();
    if litter.is_empty() {
        return;
    }
    let numeric = first_number(&litter).is_some()
        && !HAS_LETTER.is_match(&litter)
        && !litter.contains('%');
    if numeric {
        return;
    }
    let operations = row.get(col::OPERATIONS);
    let joined = if operations.is_empty() {
        litter.clone()
    } else {
        format!("{operations} {litter}")
    };
    row.set(col::OPERATIONS, joined);
    row.clear(col::LITTER_LIQUID);
}

/// Volume cells holding several numbers: `total species [class]` in the
/// species volume cell, or `total species` in the total volume cell.
pub(super) fn split_volume_triple(row: &mut Row, _text: &str) {
    let numbers = number_tokens(row.get(col::SPECIES_VOLUME));
    if numbers.len() >= 2 {
        if row.is_empty(col::TOTAL_VOLUME) {
            row.set(col::TOTAL_VOLUME, &numbers[0]);
        }
        row.set(col::SPECIES_VOLUME, &numbers[1]);
        if let Some(class) = numbers.get(2)
            && row.is_empty(col::MERCH_CLASS)
        {
            row.set(col::MERCH_CLASS, class);
        }
    }

    let total = row.get(col::TOTAL_VOLUME).to_string();
    if let Some(parts) = VOLUME_PAIR.captures(&total) {
        row.set(col::TOTAL_VOLUME, parts[1].replace(',', "."));
        if row.is_empty(col::SPECIES_VOLUME) {
            row.set(col::SPECIES_VOLUME, parts[2].replace(',', "."));
        }
    }
}

/// Species rows without age where age and height landed in the height and
/// diameter cells.
pub(super) fn realign_species_age(row: &mut Row, _text: &str) {
    if !row.is_empty(col::AGE) {
        return;
    }
    let height = row.get(col::HEIGHT);
    let diameter = row.get(col::DIAMETER);
    if height.len() > 3 || diameter.len() > 2 {
        return;
    }
    let (Some(age), Some(h)) = (int_in(height, 1, 300), int_in(diameter, 1, 99)) else {
        return;
    };
    row.set(col::AGE, age.to_string());
    row.set(col::HEIGHT, h.to_string());
    row.clear(col::DIAMETER);
}
