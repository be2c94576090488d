use crate::grid::ColumnGrid;
use crate::layout::Line;
use crate::options::Tolerances;
use crate::row::{Row, col};
use crate::text::{looks_like_note_text, starts_with_short_composition};

/// Places every fragment of the line into the column nearest to its center.
///
/// Without a grid the whole line becomes a degraded row.
pub(crate) fn split_line(line: &Line, grid: Option<&ColumnGrid>, tolerances: &Tolerances) -> Row {
    let Some(grid) = grid else {
        return Row::degraded(&line.text(tolerances.word_gap));
    };

    let mut row = Row::default();
    for fragment in &line.fragments {
        let piece = fragment.text.trim();
        if piece.is_empty() || piece == ":" {
            continue;
        }
        match grid.nearest(fragment.center_x()) {
            Some((column, distance)) if distance <= tolerances.max_anchor_distance => {
                row.push(column, piece);
            }
            _ => row.push(col::OVERFLOW, piece),
        }
    }

    resolve_overflow(&mut row);
    row
}

/// Moves unplaced text either into the description (a composition tail) or
/// into the trailing operations column.
fn resolve_overflow(row: &mut Row) {
    let overflow = row.get(col::OVERFLOW).to_string();
    if overflow.is_empty() {
        return;
    }
    if starts_with_short_composition(&overflow) && !looks_like_note_text(&overflow) {
        row.push(col::DESCRIPTION, &overflow);
    } else {
        row.push(col::OPERATIONS, &overflow);
    }
    row.clear(col::OVERFLOW);
}
