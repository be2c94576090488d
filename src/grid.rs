use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::layout::Line;
use crate::options::Tolerances;

pub(crate) const COLUMN_COUNT: usize = 24;

static RULER_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b24\b").expect("hardcoded ruler regex is valid"));
static RULER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}\b").expect("hardcoded ruler number regex is valid"));
static METRICS_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\s+\d+(?:\.\d+)?\s+").expect("hardcoded metrics-row regex is valid")
});
static STOCKING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0\.\d\b").expect("hardcoded stocking regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GridStrategy {
    Ruler,
    MetricsRow,
}

/// Horizontal anchor of each detected column on one page, ordered by column.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ColumnGrid {
    anchors: Vec<(usize, f32)>,
    pub(crate) strategy: GridStrategy,
}

impl ColumnGrid {
    fn new(mut anchors: Vec<(usize, f32)>, strategy: GridStrategy) -> Option<Self> {
        anchors.sort_by_key(|(column, _)| *column);
        let monotonic = anchors.windows(2).all(|pair| pair[0].1 <= pair[1].1);
        if !monotonic {
            return None;
        }
        Some(Self { anchors, strategy })
    }

    pub(crate) fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Closest column to `x` and its distance.
    pub(crate) fn nearest(&self, x: f32) -> Option<(usize, f32)> {
        self.anchors
            .iter()
            .map(|(column, anchor)| (*column, (x - anchor).abs()))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
    }

    #[cfg(test)]
    pub(crate) fn from_anchors(anchors: &[f32]) -> Self {
        Self {
            anchors: anchors
                .iter()
                .enumerate()
                .map(|(index, x)| (index + 1, *x))
                .collect(),
            strategy: GridStrategy::Ruler,
        }
    }
}

/// Finds the column grid of a page; `None` sends the page to overflow routing.
pub(crate) fn detect_grid(lines: &[Line], tolerances: &Tolerances) -> Option<ColumnGrid> {
    let grid = detect_from_ruler(lines, tolerances)
        .or_else(|| detect_from_metrics_row(lines, tolerances));
    match &grid {
        Some(grid) => debug!(
            strategy = ?grid.strategy,
            anchors = grid.len(),
            "column grid detected"
        ),
        None => debug!("no column grid on page"),
    }
    grid
}

#[allow(clippy::cast_precision_loss)]
fn ruler_anchors(line: &Line) -> Vec<(usize, f32)> {
    let mut anchors: Vec<(usize, f32)> = Vec::new();
    for fragment in &line.fragments {
        let length = fragment.text.chars().count().max(1) as f32;
        for found in RULER_NUMBER.find_iter(&fragment.text) {
            let Ok(column) = found.as_str().parse::<usize>() else {
                continue;
            };
            if !(1..=COLUMN_COUNT).contains(&column)
                || anchors.iter().any(|(existing, _)| *existing == column)
            {
                continue;
            }
            let offset = fragment.text[..found.start()].chars().count() as f32;
            anchors.push((column, fragment.x + fragment.width * (offset / length)));
        }
    }
    anchors
}

fn detect_from_ruler(lines: &[Line], tolerances: &Tolerances) -> Option<ColumnGrid> {
    lines
        .iter()
        .filter(|line| RULER_MARK.is_match(&line.text(tolerances.word_gap)))
        .map(ruler_anchors)
        .filter(|anchors| anchors.len() >= tolerances.min_ruler_anchors)
        .filter_map(|anchors| ColumnGrid::new(anchors, GridStrategy::Ruler))
        .max_by_key(ColumnGrid::len)
}

fn detect_from_metrics_row(lines: &[Line], tolerances: &Tolerances) -> Option<ColumnGrid> {
    let line = lines.iter().find(|line| {
        let text = line.text(tolerances.word_gap);
        METRICS_START.is_match(&text) && STOCKING_TOKEN.is_match(&text)
    })?;

    let mut xs = line
        .fragments
        .iter()
        .filter(|fragment| fragment.text.trim() != ":")
        .map(|fragment| fragment.x)
        .collect::<Vec<_>>();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut deduped: Vec<f32> = Vec::new();
    for x in xs {
        if deduped
            .last()
            .is_none_or(|last| (x - last).abs() > tolerances.anchor_dedupe)
        {
            deduped.push(x);
        }
    }
    if deduped.len() < tolerances.min_fallback_anchors {
        return None;
    }

    let anchors = deduped
        .into_iter()
        .take(COLUMN_COUNT)
        .enumerate()
        .map(|(index, x)| (index + 1, x))
        .collect();
    ColumnGrid::new(anchors, GridStrategy::MetricsRow)
}

#[cfg(test)]
mod tests {
    use super::{GridStrategy, detect_grid};
    use crate::layout::group_into_lines;
    use crate::model::Fragment;
    use crate::options::Tolerances;

    fn column_x(column: usize) -> f32 {
        f32::from(u16::try_from(column).expect("small column")) * 30.0
    }

    #[test]
    fn ruler_line_yields_monotonic_grid() {
        let mut fragments = (1..=24)
            .map(|column| Fragment::new(column.to_string(), column_x(column), 700.0, 8.0))
            .collect::<Vec<_>>();
        fragments.push(Fragment::new("1 120 0.7", 30.0, 650.0, 40.0));
        let lines = group_into_lines(&fragments, &Tolerances::default());

        let grid = detect_grid(&lines, &Tolerances::default()).expect("grid should be found");
        assert_eq!(grid.strategy, GridStrategy::Ruler);
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.nearest(column_x(7) + 3.0).map(|(c, _)| c), Some(7));
    }

    #[test]
    fn ruler_numbers_are_interpolated_inside_one_fragment() {
        let text = (1..=24).map(|c| c.to_string()).collect::<Vec<_>>().join(" ");
        let width = 600.0;
        let fragments = vec![Fragment::new(text, 0.0, 700.0, width)];
        let lines = group_into_lines(&fragments, &Tolerances::default());
        let grid = detect_grid(&lines, &Tolerances::default()).expect("grid should be found");
        assert_eq!(grid.len(), 24);
        let (first, _) = grid.nearest(0.0).expect("anchor");
        assert_eq!(first, 1);
    }

    #[test]
    fn too_few_ruler_numbers_fall_back_to_metrics_row() {
        let mut fragments = vec![Fragment::new("1 2 3 24", 10.0, 700.0, 40.0)];
        let metrics = ["12", "4.5", "7Б3Е", "1", "22", "Б", "60", "22", "24", "6", "3", "0.7"];
        for (index, text) in metrics.iter().enumerate() {
            let x = column_x(index + 1);
            fragments.push(Fragment::new(*text, x, 600.0, 10.0));
        }
        let lines = group_into_lines(&fragments, &Tolerances::default());
        let grid = detect_grid(&lines, &Tolerances::default()).expect("fallback grid");
        assert_eq!(grid.strategy, GridStrategy::MetricsRow);
        assert_eq!(grid.len(), metrics.len());
    }

    #[test]
    fn plain_text_page_has_no_grid() {
        let fragments = vec![
            Fragment::new("Итого по кварталу", 10.0, 700.0, 90.0),
            Fragment::new("120.5 3400 12", 10.0, 680.0, 60.0),
        ];
        let lines = group_into_lines(&fragments, &Tolerances::default());
        assert!(detect_grid(&lines, &Tolerances::default()).is_none());
    }
}
