use crate::row::{Row, col};
use crate::text::{
    format_number, int_in, is_merch_class, is_stocking, normalize_site_class, number_tokens,
    parse_number,
};

const INTEGER_RANGES: [(usize, u32, u32); 6] = [
    (col::LAYER, 1, 5),
    (col::LAYER_HEIGHT, 1, 99),
    (col::AGE, 1, 300),
    (col::HEIGHT, 1, 99),
    (col::AGE_CLASS, 1, 12),
    (col::AGE_GROUP, 1, 10),
];

/// A volume that drifted into the merchantability column.
fn looks_like_volume(text: &str) -> bool {
    parse_number(text).is_some_and(|value| value > 9.0)
}

/// Blanks every ranged stand metric that is out of range.
///
/// The diameter is first looked up in the next two columns, where it lands
/// when the age class bleeds left. Merchantability values that read as a
/// volume are left for [`reconcile_volumes`].
pub(super) fn validate_ranges(row: &mut Row, _text: &str) {
    for (index, min, max) in INTEGER_RANGES {
        if !row.is_empty(index) && int_in(row.get(index), min, max).is_none() {
            row.clear(index);
        }
    }

    let diameter = row.get(col::DIAMETER);
    if !diameter.is_empty() && int_in(diameter, 1, 150).is_none() {
        let candidate = [col::AGE_CLASS, col::AGE_GROUP]
            .into_iter()
            .find_map(|index| int_in(row.get(index), 1, 150));
        match candidate {
            Some(value) => row.set(col::DIAMETER, value.to_string()),
            None => row.clear(col::DIAMETER),
        }
    }

    if !row.is_empty(col::SITE_CLASS) {
        match normalize_site_class(row.get(col::SITE_CLASS)) {
            Some(class) => row.set(col::SITE_CLASS, class),
            None => row.clear(col::SITE_CLASS),
        }
    }

    if !row.is_empty(col::STOCKING) && !is_stocking(row.get(col::STOCKING)) {
        row.clear(col::STOCKING);
    }

    let class = row.get(col::MERCH_CLASS);
    if !class.is_empty() && !is_merch_class(class) && !looks_like_volume(class) {
        row.clear(col::MERCH_CLASS);
    }
}

/// Settles total and species volume when the printed values drifted right.
pub(super) fn reconcile_volumes(row: &mut Row, _text: &str) {
    if row.is_empty(col::TOTAL_VOLUME) {
        let numbers = number_tokens(row.get(col::SPECIES_VOLUME));
        if numbers.len() >= 2 {
            row.set(col::TOTAL_VOLUME, &numbers[0]);
            row.set(col::SPECIES_VOLUME, &numbers[1]);
            if let Some(class) = numbers.get(2)
                && row.is_empty(col::MERCH_CLASS)
            {
                row.set(col::MERCH_CLASS, class);
            }
        }
    }

    let total = parse_number(row.get(col::TOTAL_VOLUME));
    let species = parse_number(row.get(col::SPECIES_VOLUME));
    let late = parse_number(row.get(col::MERCH_CLASS)).filter(|value| *value > 9.0);
    if let (Some(total), Some(species), Some(late)) = (total, species, late)
        && (total - species).abs() < 1e-9
    {
        row.set(col::SPECIES_VOLUME, format_number(late));
    }

    let class = row.get(col::MERCH_CLASS);
    if !class.is_empty() && !is_merch_class(class) {
        row.clear(col::MERCH_CLASS);
    }
}
