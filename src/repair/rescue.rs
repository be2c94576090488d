//! Repairs that read the flattened line text instead of the cells.

use std::sync::LazyLock;

use regex::Regex;

use crate::row::{Row, col};
use crate::text::{
    format_number, int_in, is_species_code, normalize_broken_words, normalize_site_class,
    numbers_in, parse_int, parse_number,
};

static HEADER_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,4})\s+(\d+(?:[.,]\d+)?)\s+(.+)$").expect("hardcoded regex is valid")
});
static LEADING_FRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([.,]\d+)\s+(.+)$").expect("hardcoded regex is valid"));
static SPECIES_THREE_NUMBERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[А-ЯЁA-Z]{1,6}\s+(\d{1,3})\s+(\d{1,2})\s+(\d{1,3})\b")
        .expect("hardcoded regex is valid")
});
static SPECIES_TWO_NUMBERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[А-ЯЁA-Z]{1,6}\s+(\d{1,3})\s+(\d{1,3})\b").expect("hardcoded regex is valid")
});
static METRIC_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:5[аА]|\d{1,3})$").expect("hardcoded regex is valid"));

/// Subdivision header (`6 22.8 Культуры лесные`) whose description was cut
/// across columns: the description is rebuilt from the line text.
pub(super) fn restore_header_tail(row: &mut Row, text: &str) {
    if row.any_filled(col::LAYER..=col::MERCH_CLASS) {
        return;
    }
    let text = normalize_broken_words(text);
    let Some(parts) = HEADER_TAIL.captures(text.trim()) else {
        return;
    };
    let mut area = parts[2].replace(',', ".");
    let mut tail = parts[3].trim().to_string();

    // `52 0 .3 Ручьи`: the fraction printed apart belongs to the area
    if !area.contains('.')
        && let Some(split) = LEADING_FRACTION.captures(&tail)
    {
        area = format!("{area}{}", split[1].replace(',', "."));
        tail = split[2].trim().to_string();
    }

    if row.is_degraded() {
        row.clear(col::OPERATIONS);
    } else {
        let operations = row.get(col::OPERATIONS);
        if !operations.is_empty()
            && tail.len() > operations.len()
            && let Some(head) = tail.strip_suffix(operations)
        {
            tail = head.trim_end().to_string();
        }
    }

    if row.is_empty(col::VYDEL) {
        row.set(col::VYDEL, &parts[1]);
    }
    if row.is_empty(col::AREA) {
        row.set(col::AREA, area);
    }
    row.set(col::DESCRIPTION, tail);
}

fn unusable(row: &Row, index: usize) -> bool {
    parse_number(row.get(index)).is_none()
}

fn fill_if_empty(row: &mut Row, index: usize, value: impl ToString) {
    if row.is_empty(index) {
        row.set(index, value.to_string());
    }
}

/// Finds `layer height species age height diameter ...` in the line text and
/// fills the stand metrics the cells lost.
///
/// Only empty cells are filled, except a diameter that merely repeats the
/// age group or site class.
pub(super) fn rescue_stand_metrics(row: &mut Row, text: &str) {
    let text = normalize_broken_words(text);
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 6 {
        return;
    }

    for start in 0..=tokens.len() - 6 {
        let (Some(layer), Some(layer_height)) = (
            int_in(tokens[start], 1, 5),
            int_in(tokens[start + 1], 1, 99),
        ) else {
            continue;
        };
        let species = tokens[start + 2];
        if !is_species_code(species) {
            continue;
        }

        let metrics: Vec<&str> = tokens[start + 3..]
            .iter()
            .take_while(|token| METRIC_TOKEN.is_match(token))
            .take(6)
            .copied()
            .collect();
        if metrics.len() < 4 {
            continue;
        }

        fill_if_empty(row, col::LAYER, layer);
        fill_if_empty(row, col::LAYER_HEIGHT, layer_height);
        fill_if_empty(row, col::SPECIES, species.to_uppercase());

        if let Some(age) = int_in(metrics[0], 1, 300) {
            fill_if_empty(row, col::AGE, age);
        }
        if let Some(height) = int_in(metrics[1], 1, 99) {
            fill_if_empty(row, col::HEIGHT, height);
        }
        if let Some(diameter) = int_in(metrics[2], 1, 150) {
            let current = parse_int(row.get(col::DIAMETER));
            let group = parse_int(row.get(col::AGE_GROUP));
            let site = normalize_site_class(row.get(col::SITE_CLASS))
                .and_then(|class| parse_int(&class));
            let suspicious =
                current.is_none() || current == group || (site.is_some() && current == site);
            if suspicious {
                row.set(col::DIAMETER, diameter.to_string());
            }
        }
        if let Some(age_class) = int_in(metrics[3], 1, 12) {
            fill_if_empty(row, col::AGE_CLASS, age_class);
        }
        if let Some(age_group) = metrics.get(4).and_then(|token| int_in(token, 1, 10)) {
            fill_if_empty(row, col::AGE_GROUP, age_group);
        }
        if let Some(site) = metrics.get(5).and_then(|token| normalize_site_class(token)) {
            fill_if_empty(row, col::SITE_CLASS, site);
        }
        return;
    }
}

/// Species rows printed as `ОС 90 26 40` or `ОС 26 40`: two numbers read as
/// height and diameter first, age and height otherwise.
pub(super) fn rescue_species_metrics(row: &mut Row, text: &str) {
    if row.is_empty(col::SPECIES) {
        return;
    }
    let text = normalize_broken_words(text).replace(',', ".");
    let text = text.trim();

    if let Some(parts) = SPECIES_THREE_NUMBERS.captures(text)
        && let (Some(age), Some(height), Some(diameter)) = (
            int_in(&parts[1], 1, 300),
            int_in(&parts[2], 1, 99),
            int_in(&parts[3], 1, 150),
        )
    {
        fill_if_empty(row, col::AGE, age);
        fill_if_empty(row, col::HEIGHT, height);
        fill_if_empty(row, col::DIAMETER, diameter);
        return;
    }

    let Some(parts) = SPECIES_TWO_NUMBERS.captures(text) else {
        return;
    };
    let (Some(first), Some(second)) = (parse_int(&parts[1]), parse_int(&parts[2])) else {
        return;
    };
    if (1..=99).contains(&first) && (1..=150).contains(&second) {
        fill_if_empty(row, col::HEIGHT, first);
        fill_if_empty(row, col::DIAMETER, second);
    } else if (1..=300).contains(&first) && (1..=99).contains(&second) {
        fill_if_empty(row, col::AGE, first);
        fill_if_empty(row, col::HEIGHT, second);
    }
}

/// Takes total and species volume from the last two volume-sized numbers of
/// the line when the cells hold nothing usable.
pub(super) fn rescue_volumes(row: &mut Row, text: &str) {
    let numbers = numbers_in(text);
    if numbers.is_empty() {
        return;
    }
    let volumes: Vec<f64> = numbers.iter().copied().filter(|n| *n > 9.0).collect();

    match volumes.as_slice() {
        [.., total, species] => {
            if unusable(row, col::TOTAL_VOLUME) {
                row.set(col::TOTAL_VOLUME, format_number(*total));
            }
            if unusable(row, col::SPECIES_VOLUME) {
                row.set(col::SPECIES_VOLUME, format_number(*species));
            }
        }
        [total] => {
            if unusable(row, col::TOTAL_VOLUME) {
                row.set(col::TOTAL_VOLUME, format_number(*total));
            }
        }
        [] => {}
    }

    if row.is_empty(col::MERCH_CLASS)
        && let [.., a, b, c] = numbers.as_slice()
        && *a > 9.0
        && *b > 9.0
        && c.fract().abs() < f64::EPSILON
        && (1.0..=4.0).contains(c)
    {
        row.set(col::MERCH_CLASS, format_number(*c));
    }
}

#[cfg(test)]
mod tests {
    use super::{rescue_species_metrics, rescue_stand_metrics, rescue_volumes, restore_header_tail};
    use crate::row::{Row, col};

    #[test]
    fn header_tail_rebuilds_description() {
        let mut row = Row::from_cells(&[
            (col::VYDEL, "6"),
            (col::AREA, "22.8"),
            (col::DESCRIPTION, "Культуры"),
        ]);
        restore_header_tail(&mut row, "6 22.8 Культуры лесные");
        assert_eq!(row.get(col::DESCRIPTION), "Культуры лесные");
    }

    #[test]
    fn header_tail_keeps_detached_area_fraction_out_of_description() {
        let mut row = Row::from_cells(&[
            (col::VYDEL, "52"),
            (col::AREA, "0.3"),
            (col::DESCRIPTION, "Ручьи"),
        ]);
        restore_header_tail(&mut row, "52 0 .3 Ручьи");
        assert_eq!(row.get(col::AREA), "0.3");
        assert_eq!(row.get(col::DESCRIPTION), "Ручьи");

        let mut row = Row::degraded("6 22 ,8 Культуры лесные");
        restore_header_tail(&mut row, "6 22 ,8 Культуры лесные");
        assert_eq!(row.get(col::AREA), "22.8");
        assert_eq!(row.get(col::DESCRIPTION), "Культуры лесные");
    }

    #[test]
    fn header_tail_leaves_operations_out() {
        let mut row = Row::from_cells(&[
            (col::VYDEL, "3"),
            (col::AREA, "1.2"),
            (col::DESCRIPTION, "Культуры"),
            (col::OPERATIONS, "Рубка ухода"),
        ]);
        restore_header_tail(&mut row, "3 1.2 Культуры лесные Рубка ухода");
        assert_eq!(row.get(col::DESCRIPTION), "Культуры лесные");
        assert_eq!(row.get(col::OPERATIONS), "Рубка ухода");
    }

    #[test]
    fn degraded_header_moves_out_of_operations() {
        let mut row = Row::degraded("6 22,8 Культуры лесные");
        restore_header_tail(&mut row, "6 22,8 Культуры лесные");
        assert_eq!(row.get(col::VYDEL), "6");
        assert_eq!(row.get(col::AREA), "22.8");
        assert_eq!(row.get(col::DESCRIPTION), "Культуры лесные");
        assert!(row.is_empty(col::OPERATIONS));
    }

    #[test]
    fn stand_metrics_recovered_from_text() {
        let mut row = Row::from_cells(&[
            (col::VYDEL, "14"),
            (col::DIAMETER, "4"),
            (col::AGE_GROUP, "4"),
        ]);
        rescue_stand_metrics(&mut row, "14 3.0 2Е 1 18 Е 90 20 22 5 4 2 ЧЕР С2");
        assert_eq!(row.get(col::LAYER), "1");
        assert_eq!(row.get(col::LAYER_HEIGHT), "18");
        assert_eq!(row.get(col::SPECIES), "Е");
        assert_eq!(row.get(col::AGE), "90");
        assert_eq!(row.get(col::HEIGHT), "20");
        assert_eq!(row.get(col::DIAMETER), "22");
        assert_eq!(row.get(col::AGE_CLASS), "5");
        assert_eq!(row.get(col::SITE_CLASS), "2");
    }

    #[test]
    fn stand_metrics_skip_anchor_without_enough_metrics() {
        let mut row = Row::from_cells(&[(col::VYDEL, "8")]);
        rescue_stand_metrics(&mut row, "8 2 1 Е ЧЕР 1 18 Б 70 21 24 4 3 2");
        assert_eq!(row.get(col::LAYER), "1");
        assert_eq!(row.get(col::LAYER_HEIGHT), "18");
        assert_eq!(row.get(col::SPECIES), "Б");
        assert_eq!(row.get(col::AGE), "70");
        assert_eq!(row.get(col::HEIGHT), "21");
        assert_eq!(row.get(col::DIAMETER), "24");
    }

    #[test]
    fn volumes_filled_only_when_missing() {
        let mut row = Row::from_cells(&[(col::TOTAL_VOLUME, "464.3")]);
        rescue_volumes(&mut row, "0.7 21 464.3 325 2");
        assert_eq!(row.get(col::TOTAL_VOLUME), "464.3");
        assert_eq!(row.get(col::SPECIES_VOLUME), "325");
        assert_eq!(row.get(col::MERCH_CLASS), "2");
    }

    #[test]
    fn species_numbers_read_as_height_and_diameter() {
        let mut row = Row::from_cells(&[(col::SPECIES, "ОС")]);
        rescue_species_metrics(&mut row, "ОС 26 40");
        assert!(row.is_empty(col::AGE));
        assert_eq!(row.get(col::HEIGHT), "26");
        assert_eq!(row.get(col::DIAMETER), "40");

        let mut row = Row::from_cells(&[(col::SPECIES, "Е"), (col::AGE, "90")]);
        rescue_species_metrics(&mut row, "Е 140 24 28 1");
        assert_eq!(row.get(col::AGE), "90");
        assert_eq!(row.get(col::HEIGHT), "24");
        assert_eq!(row.get(col::DIAMETER), "28");
    }
}
