//! Ordered row fixups.
//!
//! Every step is a pure rewrite of `(row, line text)` that recognizes one
//! corruption pattern and is a no-op when applied a second time. Cascades are
//! plain slices so their order is visible in one place and steps can be
//! tested in isolation.

mod bleed;
mod numeric;
mod ranges;
mod rescue;
mod shift;

use tracing::trace;

use crate::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepKind {
    /// Rejoins digits split across fragments inside one cell.
    Numeric,
    /// Moves values that spilled over a column boundary.
    Bleed,
    /// Splits a two-value cell into an empty neighbour.
    Shift,
    /// Clears values outside their valid range.
    Range,
    /// Recovers values from the flattened line text.
    Rescue,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RepairStep {
    pub(crate) name: &'static str,
    pub(crate) kind: StepKind,
    apply: fn(&mut Row, &str),
}

impl RepairStep {
    const fn new(name: &'static str, kind: StepKind, apply: fn(&mut Row, &str)) -> Self {
        Self { name, kind, apply }
    }

    pub(crate) fn apply(&self, row: &mut Row, text: &str) {
        (self.apply)(row, text);
    }
}

const JOIN_SPACED_DECIMALS: RepairStep =
    RepairStep::new("join_spaced_decimals", StepKind::Numeric, numeric::join_spaced_decimals);
const JOIN_SPACED_INTEGERS: RepairStep =
    RepairStep::new("join_spaced_integers", StepKind::Numeric, numeric::join_spaced_integers);
const SPLIT_VYDEL_AREA: RepairStep =
    RepairStep::new("split_vydel_area", StepKind::Bleed, bleed::split_vydel_area);
const MERGE_AREA_FRACTION: RepairStep =
    RepairStep::new("merge_area_fraction", StepKind::Bleed, bleed::merge_area_fraction);
const SPLIT_AREA_TAIL: RepairStep =
    RepairStep::new("split_area_tail", StepKind::Bleed, bleed::split_area_tail);
const MERGE_OBJECT_DESCRIPTION: RepairStep = RepairStep::new(
    "merge_object_description",
    StepKind::Bleed,
    bleed::merge_object_description,
);
const SITE_CLASS_FROM_FOREST_TYPE: RepairStep = RepairStep::new(
    "site_class_from_forest_type",
    StepKind::Shift,
    shift::site_class_from_forest_type,
);
const VOLUME_AND_MERCH_CLASS: RepairStep = RepairStep::new(
    "volume_and_merch_class",
    StepKind::Bleed,
    bleed::volume_and_merch_class,
);
const MERCH_CLASS_FROM_DEAD_STANDING: RepairStep = RepairStep::new(
    "merch_class_from_dead_standing",
    StepKind::Bleed,
    shift::merch_class_from_dead_standing,
);
const OPERATIONS_FROM_LITTER: RepairStep =
    RepairStep::new("operations_from_litter", StepKind::Bleed, bleed::operations_from_litter);
const SPLIT_STOCKING_VOLUME: RepairStep =
    RepairStep::new("split_stocking_volume", StepKind::Shift, shift::split_stocking_volume);
const SPLIT_AGE_HEIGHT: RepairStep =
    RepairStep::new("split_age_height", StepKind::Shift, shift::split_age_height);
const RESTORE_HEADER_TAIL: RepairStep =
    RepairStep::new("restore_header_tail", StepKind::Rescue, rescue::restore_header_tail);
const SPLIT_PAIRED_METRICS: RepairStep =
    RepairStep::new("split_paired_metrics", StepKind::Shift, shift::split_paired_metrics);
const SPLIT_VOLUME_TRIPLE: RepairStep =
    RepairStep::new("split_volume_triple", StepKind::Bleed, bleed::split_volume_triple);
const VALIDATE_RANGES: RepairStep =
    RepairStep::new("validate_ranges", StepKind::Range, ranges::validate_ranges);
const RECONCILE_VOLUMES: RepairStep =
    RepairStep::new("reconcile_volumes", StepKind::Range, ranges::reconcile_volumes);
const RESCUE_STAND_METRICS: RepairStep =
    RepairStep::new("rescue_stand_metrics", StepKind::Rescue, rescue::rescue_stand_metrics);
const RESCUE_VOLUMES: RepairStep =
    RepairStep::new("rescue_volumes", StepKind::Rescue, rescue::rescue_volumes);
const RESCUE_SPECIES_METRICS: RepairStep = RepairStep::new(
    "rescue_species_metrics",
    StepKind::Rescue,
    rescue::rescue_species_metrics,
);
const SPLIT_SPECIES_CODE: RepairStep =
    RepairStep::new("split_species_code", StepKind::Shift, shift::split_species_code);
const SPLIT_SPECIES_AGE_HEIGHT: RepairStep = RepairStep::new(
    "split_species_age_height",
    StepKind::Shift,
    shift::split_species_age_height,
);
const REALIGN_SPECIES_AGE: RepairStep =
    RepairStep::new("realign_species_age", StepKind::Bleed, bleed::realign_species_age);
const SPLIT_SINGLE_TREES_AGE: RepairStep = RepairStep::new(
    "split_single_trees_age",
    StepKind::Shift,
    shift::split_single_trees_age,
);

/// Applied to every row right after cell splitting.
pub(crate) const GENERAL: &[RepairStep] = &[
    JOIN_SPACED_DECIMALS,
    JOIN_SPACED_INTEGERS,
    SPLIT_VYDEL_AREA,
    MERGE_AREA_FRACTION,
    SPLIT_AREA_TAIL,
    MERGE_OBJECT_DESCRIPTION,
    SITE_CLASS_FROM_FOREST_TYPE,
    VOLUME_AND_MERCH_CLASS,
    MERCH_CLASS_FROM_DEAD_STANDING,
    OPERATIONS_FROM_LITTER,
    SPLIT_STOCKING_VOLUME,
    SPLIT_AGE_HEIGHT,
    RESTORE_HEADER_TAIL,
];

/// Applied once a row is known to be a stand (layer) row.
pub(crate) const MAIN: &[RepairStep] = &[
    SPLIT_PAIRED_METRICS,
    SPLIT_VOLUME_TRIPLE,
    VOLUME_AND_MERCH_CLASS,
    VALIDATE_RANGES,
    RECONCILE_VOLUMES,
    RESCUE_STAND_METRICS,
    VALIDATE_RANGES,
    RESCUE_VOLUMES,
    MERCH_CLASS_FROM_DEAD_STANDING,
    OPERATIONS_FROM_LITTER,
    SPLIT_STOCKING_VOLUME,
    SPLIT_AGE_HEIGHT,
    VALIDATE_RANGES,
];

/// Applied to secondary species rows.
pub(crate) const SPECIES: &[RepairStep] = &[
    VOLUME_AND_MERCH_CLASS,
    MERCH_CLASS_FROM_DEAD_STANDING,
    OPERATIONS_FROM_LITTER,
    SPLIT_SPECIES_CODE,
    SPLIT_SPECIES_AGE_HEIGHT,
    JOIN_SPACED_INTEGERS,
    REALIGN_SPECIES_AGE,
    SPLIT_STOCKING_VOLUME,
    SPLIT_AGE_HEIGHT,
    RESCUE_SPECIES_METRICS,
    VALIDATE_RANGES,
];

/// Numeric payload of a totals line.
pub(crate) const TOTALS: &[RepairStep] = &[
    JOIN_SPACED_DECIMALS,
    JOIN_SPACED_INTEGERS,
    VOLUME_AND_MERCH_CLASS,
    MERCH_CLASS_FROM_DEAD_STANDING,
];

/// Applied to isolated-tree rows.
pub(crate) const SINGLE_TREES: &[RepairStep] = &[SPLIT_SINGLE_TREES_AGE, VALIDATE_RANGES];

pub(crate) fn run(steps: &[RepairStep], row: &mut Row, text: &str) {
    for step in steps {
        let before = if tracing::enabled!(tracing::Level::TRACE) {
            Some(row.clone())
        } else {
            None
        };
        step.apply(row, text);
        if before.is_some_and(|before| before != *row) {
            trace!(
                step = step.name,
                kind = ?step.kind,
                row = %row.raw_summary(),
                "repair step changed row"
            );
        }
    }
}

#[cfg(test)]
pub(crate) fn all_steps() -> Vec<RepairStep> {
    let mut steps = Vec::new();
    for cascade in [GENERAL, MAIN, SPECIES, SINGLE_TREES] {
        for step in cascade {
            if !steps.iter().any(|known: &RepairStep| known.name == step.name) {
                steps.push(*step);
            }
        }
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::{GENERAL, MAIN, SPECIES, StepKind, all_steps, run};
    use crate::row::{CELL_COUNT, Row, col};
    use crate::text::{int_in, is_merch_class, is_stocking, normalize_site_class, parse_number};

    /// Rows exercising every step's trigger pattern at least once.
    fn corpus() -> Vec<(Row, &'static str)> {
        vec![
            (
                Row::from_cells(&[(1, "52 0"), (2, ".3 Ручьи")]),
                "52 0 .3 Ручьи",
            ),
            (
                Row::from_cells(&[(1, "12"), (2, "0"), (3, ".3 Болото")]),
                "12 0 .3 Болото",
            ),
            (
                Row::from_cells(&[(1, "12"), (2, "0."), (3, "3 Болото")]),
                "12 0. 3 Болото",
            ),
            (Row::from_cells(&[(1, "12"), (2, ".3"), (3, "Ручьи")]), "12 .3 Ручьи"),
            (
                Row::from_cells(&[(1, "7"), (2, "36"), (3, ".6 7Б3Е")]),
                "7 36 .6 7Б3Е",
            ),
            (
                Row::from_cells(&[(1, "6"), (2, "22.8 Культуры"), (3, "лесные")]),
                "6 22.8 Культуры лесные",
            ),
            (
                Row::from_cells(&[(1, "3"), (2, "1.2"), (3, "Дороги"), (5, "лесные")]),
                "3 1.2 Дороги лесные",
            ),
            (
                Row::from_cells(&[
                    (4, "1"),
                    (5, "2 2"),
                    (6, "ОЛСА50"),
                    (8, "100 24"),
                    (12, ""),
                    (13, "5а ЧЕР С2"),
                    (14, ""),
                    (15, "0.5 21"),
                    (17, "167"),
                    (18, ".1 1"),
                    (19, "2"),
                    (23, "10%"),
                ]),
                "1 22 ОЛСА50 100 24 5а ЧЕР С2 0.5 21 167 .1 1 2 10%",
            ),
            (
                Row::from_cells(&[
                    (1, "9"),
                    (2, "4.5"),
                    (3, "7Б1ОС2Е"),
                    (4, "1"),
                    (5, "22"),
                    (6, "Б"),
                    (7, "80 17"),
                    (9, "24 6"),
                    (11, "3 2"),
                    (14, "0 , 7"),
                    (16, "464.3 325"),
                    (17, "1041. 2"),
                    (18, "3"),
                ]),
                "9 4.5 7Б1ОС2Е 1 22 Б 80 17 24 6 3 2 0.7 464.3 325 1041. 2 3",
            ),
            (
                Row::from_cells(&[
                    (6, "Е"),
                    (8, "120"),
                    (9, "26"),
                    (16, "3"),
                    (17, "3"),
                    (18, "45"),
                ]),
                "Е 120 26 3 3 45",
            ),
            (
                Row::from_cells(&[
                    (1, "14"),
                    (2, "3.0"),
                    (3, "2Е"),
                    (4, "7"),
                    (7, "400"),
                    (9, "abc"),
                ]),
                "14 3.0 2Е 1 18 Е 90 20 22 5 4 2 ЧЕР С2",
            ),
        ]
    }

    #[test]
    fn every_step_is_idempotent() {
        for step in all_steps() {
            for (row, text) in corpus() {
                let mut once = row.clone();
                step.apply(&mut once, text);
                let mut twice = once.clone();
                step.apply(&mut twice, text);
                assert_eq!(once, twice, "step {} is not idempotent on {row:?}", step.name);
            }
        }
    }

    fn typed_value(row: &Row, index: usize) -> Option<String> {
        let value = row.get(index);
        let valid = match index {
            col::LAYER => int_in(value, 1, 5).is_some(),
            col::LAYER_HEIGHT | col::HEIGHT => int_in(value, 1, 99).is_some(),
            col::AGE => int_in(value, 1, 300).is_some(),
            col::DIAMETER => int_in(value, 1, 150).is_some(),
            col::AGE_CLASS => int_in(value, 1, 12).is_some(),
            col::AGE_GROUP => int_in(value, 1, 10).is_some(),
            col::SITE_CLASS => normalize_site_class(value).is_some(),
            col::STOCKING => is_stocking(value),
            col::MERCH_CLASS => is_merch_class(value),
            col::VYDEL | col::DESCRIPTION | col::SPECIES | col::FOREST_TYPE | col::OPERATIONS => {
                return None;
            }
            _ => parse_number(value).is_some(),
        };
        valid.then(|| value.to_string())
    }

    #[test]
    fn shift_steps_only_fill_empty_fields() {
        for step in all_steps().into_iter().filter(|s| s.kind == StepKind::Shift) {
            for (row, text) in corpus() {
                let mut after = row.clone();
                step.apply(&mut after, text);
                for index in 1..CELL_COUNT {
                    if let Some(before) = typed_value(&row, index) {
                        assert_eq!(
                            typed_value(&after, index).as_deref(),
                            Some(before.as_str()),
                            "step {} overwrote column {index}",
                            step.name
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn typed_cascades_leave_ranged_fields_valid_or_empty() {
        for cascade in [MAIN, SPECIES] {
            for (row, text) in corpus() {
                let mut row = row;
                run(GENERAL, &mut row, text);
                run(cascade, &mut row, text);
                for index in [
                    col::LAYER,
                    col::LAYER_HEIGHT,
                    col::AGE,
                    col::HEIGHT,
                    col::DIAMETER,
                    col::AGE_CLASS,
                    col::AGE_GROUP,
                    col::SITE_CLASS,
                    col::STOCKING,
                    col::MERCH_CLASS,
                ] {
                    assert!(
                        row.is_empty(index) || typed_value(&row, index).is_some(),
                        "column {index} holds out-of-range '{}'",
                        row.get(index)
                    );
                }
            }
        }
    }

    #[test]
    fn general_cascade_repairs_split_area_and_volumes() {
        let (mut row, text) = corpus().swap_remove(0);
        run(GENERAL, &mut row, text);
        assert_eq!(row.get(col::VYDEL), "52");
        assert_eq!(row.get(col::AREA), "0.3");
        assert_eq!(row.get(col::DESCRIPTION), "Ручьи");

        let (mut row, text) = corpus().swap_remove(7);
        run(GENERAL, &mut row, text);
        assert_eq!(row.get(col::LAYER_HEIGHT), "22");
        assert_eq!(row.get(col::SITE_CLASS), "5А");
        assert_eq!(row.get(col::FOREST_TYPE), "ЧЕР С2");
        assert_eq!(row.get(col::STOCKING), "0.5");
        assert_eq!(row.get(col::VOLUME_PER_HA), "21");
        assert_eq!(row.get(col::SPECIES_VOLUME), "167.1");
        assert_eq!(row.get(col::MERCH_CLASS), "1");
        assert_eq!(row.get(col::DEAD_STANDING), "2");
        assert_eq!(row.get(col::OPERATIONS), "10%");
        assert!(row.is_empty(col::LITTER_LIQUID));
    }
}
