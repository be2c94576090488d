use std::ops::RangeInclusive;

use crate::text::{clamp_text, normalize_spaces};

pub(crate) const CELL_COUNT: usize = 25;

/// Logical column positions of the inventory table. Slot 0 holds fragments
/// that could not be placed on the grid.
pub(crate) mod col {
    pub(crate) const OVERFLOW: usize = 0;
    pub(crate) const VYDEL: usize = 1;
    pub(crate) const AREA: usize = 2;
    pub(crate) const DESCRIPTION: usize = 3;
    pub(crate) const LAYER: usize = 4;
    pub(crate) const LAYER_HEIGHT: usize = 5;
    pub(crate) const SPECIES: usize = 6;
    pub(crate) const AGE: usize = 7;
    pub(crate) const HEIGHT: usize = 8;
    pub(crate) const DIAMETER: usize = 9;
    pub(crate) const AGE_CLASS: usize = 10;
    pub(crate) const AGE_GROUP: usize = 11;
    pub(crate) const SITE_CLASS: usize = 12;
    pub(crate) const FOREST_TYPE: usize = 13;
    pub(crate) const STOCKING: usize = 14;
    pub(crate) const VOLUME_PER_HA: usize = 15;
    pub(crate) const TOTAL_VOLUME: usize = 16;
    pub(crate) const SPECIES_VOLUME: usize = 17;
    pub(crate) const MERCH_CLASS: usize = 18;
    pub(crate) const DEAD_STANDING: usize = 19;
    pub(crate) const SPARSE_STAND: usize = 20;
    pub(crate) const SINGLE_TREES: usize = 21;
    pub(crate) const LITTER_TOTAL: usize = 22;
    pub(crate) const LITTER_LIQUID: usize = 23;
    pub(crate) const OPERATIONS: usize = 24;
}

/// Scratch cells of one physical line while it is being repaired.
///
/// `degraded` marks rows produced without a column grid, where the whole line
/// text sits in the operations slot and only text-based rules apply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Row {
    cells: [String; CELL_COUNT],
    degraded: bool,
}

impl Row {
    pub(crate) fn degraded(text: &str) -> Self {
        let mut row = Self {
            degraded: true,
            ..Self::default()
        };
        row.set(col::OPERATIONS, text);
        row
    }

    #[cfg(test)]
    pub(crate) fn from_cells(cells: &[(usize, &str)]) -> Self {
        let mut row = Self::default();
        for (index, value) in cells {
            row.set(*index, *value);
        }
        row
    }

    pub(crate) fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub(crate) fn get(&self, index: usize) -> &str {
        self.cells[index].trim()
    }

    pub(crate) fn set(&mut self, index: usize, value: impl AsRef<str>) {
        self.cells[index] = normalize_spaces(value.as_ref());
    }

    pub(crate) fn clear(&mut self, index: usize) {
        self.cells[index].clear();
    }

    pub(crate) fn is_empty(&self, index: usize) -> bool {
        self.get(index).is_empty()
    }

    /// Appends a piece separated by a single space.
    pub(crate) fn push(&mut self, index: usize, piece: &str) {
        let piece = piece.trim();
        if piece.is_empty() {
            return;
        }
        if self.is_empty(index) {
            self.set(index, piece);
        } else {
            let joined = format!("{} {piece}", self.get(index));
            self.set(index, joined);
        }
    }

    pub(crate) fn any_filled(&self, range: RangeInclusive<usize>) -> bool {
        range.into_iter().any(|index| !self.is_empty(index))
    }

    pub(crate) fn all_empty(&self, range: RangeInclusive<usize>) -> bool {
        !self.any_filled(range)
    }

    /// Blanks the identifying columns so the metrics can be re-read as a species row.
    pub(crate) fn without_identity(&self) -> Self {
        let mut row = self.clone();
        for index in col::VYDEL..=col::LAYER_HEIGHT {
            row.clear(index);
        }
        row
    }

    /// Diagnostic dump of the populated logical cells, `index:value | ...`.
    pub(crate) fn raw_summary(&self) -> String {
        let joined = (1..CELL_COUNT)
            .filter(|&index| !self.is_empty(index))
            .map(|index| format!("{index}:{}", self.get(index)))
            .collect::<Vec<_>>()
            .join(" | ");
        clamp_text(&joined)
    }
}
