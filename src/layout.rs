use std::cmp::Ordering;

use crate::model::Fragment;
use crate::options::Tolerances;
use crate::text::normalize_spaces;

/// Fragments sharing one visual baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Line {
    pub(crate) y: f32,
    pub(crate) fragments: Vec<Fragment>,
}

impl Line {
    /// Flattened text with a space wherever consecutive fragments are far apart.
    pub(crate) fn text(&self, word_gap: f32) -> String {
        let mut out = String::new();
        let mut previous_x: Option<f32> = None;
        for fragment in &self.fragments {
            if previous_x.is_some_and(|x| fragment.x - x > word_gap) {
                out.push(' ');
            }
            out.push_str(&fragment.text);
            previous_x = Some(fragment.x);
        }
        normalize_spaces(&out)
    }
}

/// Clusters fragments into lines, top of the page first.
pub(crate) fn group_into_lines(fragments: &[Fragment], tolerances: &Tolerances) -> Vec<Line> {
    let mut sorted = fragments
        .iter()
        .filter(|fragment| !fragment.text.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<Line> = Vec::new();
    for fragment in sorted {
        match lines
            .iter_mut()
            .find(|line| (line.y - fragment.y).abs() <= tolerances.line_y)
        {
            Some(line) => line.fragments.push(fragment),
            None => lines.push(Line {
                y: fragment.y,
                fragments: vec![fragment],
            }),
        }
    }

    for line in &mut lines {
        line.fragments
            .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::group_into_lines;
    use crate::model::Fragment;
    use crate::options::Tolerances;

    #[test]
    fn groups_by_baseline_within_tolerance() {
        let fragments = vec![
            Fragment::new("b", 40.0, 699.0, 5.0),
            Fragment::new("a", 10.0, 700.0, 5.0),
            Fragment::new("c", 10.0, 680.0, 5.0),
            Fragment::new("  ", 10.0, 660.0, 5.0),
        ];
        let lines = group_into_lines(&fragments, &Tolerances::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(8.0), "a b");
        assert_eq!(lines[1].text(8.0), "c");
    }

    #[test]
    fn close_fragments_are_glued_without_space() {
        let fragments = vec![
            Fragment::new("Итог", 10.0, 500.0, 20.0),
            Fragment::new("о", 15.0, 500.0, 5.0),
            Fragment::new("по", 40.0, 500.0, 10.0),
        ];
        let lines = group_into_lines(&fragments, &Tolerances::default());
        assert_eq!(lines[0].text(8.0), "Итого по");
    }
}
