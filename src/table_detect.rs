//! Ruled-table detection from painted line segments.
//!
//! Ruling edges are snapped onto shared coordinates and the distinct x and y
//! positions span a grid. Grid cells without a separating edge are merged into
//! the cell above or to the left. Words are then dropped into cells by their
//! top-left corner.

use crate::model::{ExtractedTable, Word};

/// Distance under which two parallel edges count as the same ruling.
const SNAP_TOLERANCE: f32 = 3.0;
/// Slack allowed when checking whether an edge spans or meets another.
const JOIN_TOLERANCE: f32 = 3.0;
/// Shorter segments are glyph decorations rather than rulings.
const MIN_EDGE_LENGTH: f32 = 5.0;
const LINE_TOLERANCE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Orientation {
    Horizontal,
    Vertical,
}

/// An axis-aligned ruling in page coordinates. `position` is the y of a
/// horizontal edge or the x of a vertical one; `start..end` is its extent
/// along the other axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Edge {
    pub orientation: Orientation,
    pub position: f32,
    pub start: f32,
    pub end: f32,
}

impl Edge {
    /// Keeps horizontal and vertical segments; diagonals are not rulings.
    pub(crate) fn from_segment(from: (f32, f32), to: (f32, f32)) -> Option<Self> {
        let (dx, dy) = ((to.0 - from.0).abs(), (to.1 - from.1).abs());
        if dy < 1.0 && dx >= MIN_EDGE_LENGTH {
            Some(Self {
                orientation: Orientation::Horizontal,
                position: (from.1 + to.1) / 2.0,
                start: from.0.min(to.0),
                end: from.0.max(to.0),
            })
        } else if dx < 1.0 && dy >= MIN_EDGE_LENGTH {
            Some(Self {
                orientation: Orientation::Vertical,
                position: (from.0 + to.0) / 2.0,
                start: from.1.min(to.1),
                end: from.1.max(to.1),
            })
        } else {
            None
        }
    }

    fn crosses(&self, other: &Self) -> bool {
        self.orientation != other.orientation
            && other.position >= self.start - JOIN_TOLERANCE
            && other.position <= self.end + JOIN_TOLERANCE
            && self.position >= other.start - JOIN_TOLERANCE
            && self.position <= other.end + JOIN_TOLERANCE
    }

    fn covers(&self, position: f32, from: f32, to: f32) -> bool {
        (self.position - position).abs() <= SNAP_TOLERANCE
            && self.start <= from + JOIN_TOLERANCE
            && self.end >= to - JOIN_TOLERANCE
    }
}

/// Snaps near-equal positions together, then joins collinear segments that
/// touch or overlap.
fn normalize_edges(mut edges: Vec<Edge>) -> Vec<Edge> {
    edges.sort_by(|a, b| a.position.total_cmp(&b.position));

    let mut groups: Vec<Vec<Edge>> = Vec::new();
    for edge in edges {
        match groups.last_mut() {
            Some(group) if edge.position - group[0].position <= SNAP_TOLERANCE => {
                group.push(edge);
            }
            _ => groups.push(vec![edge]),
        }
    }

    let mut out = Vec::new();
    for mut group in groups {
        #[allow(clippy::cast_precision_loss)]
        let position = group.iter().map(|edge| edge.position).sum::<f32>() / group.len() as f32;
        group.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut merged: Vec<Edge> = Vec::new();
        for edge in group {
            match merged.last_mut() {
                Some(last) if edge.start <= last.end + JOIN_TOLERANCE => {
                    last.end = last.end.max(edge.end);
                }
                _ => merged.push(Edge { position, ..edge }),
            }
        }
        out.extend(merged);
    }
    out
}

fn distinct_positions(edges: &[Edge]) -> Vec<f32> {
    let mut positions: Vec<f32> = Vec::new();
    for edge in edges {
        if positions
            .last()
            .is_none_or(|last| (edge.position - last).abs() > SNAP_TOLERANCE)
        {
            positions.push(edge.position);
        }
    }
    positions
}

/// Index of the band `bounds[i]..bounds[i + 1]` holding `value`.
fn band(bounds: &[f32], value: f32) -> Option<usize> {
    bounds
        .windows(2)
        .position(|pair| value >= pair[0] - 1.0 && value < pair[1])
}

fn cell_text(words: &mut [&Word]) -> String {
    words.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<(f32, Vec<&str>)> = Vec::new();
    for word in words.iter() {
        match lines.last_mut() {
            Some((top, line)) if (word.top - *top).abs() <= LINE_TOLERANCE => {
                line.push(word.text.as_str());
            }
            _ => lines.push((word.top, vec![word.text.as_str()])),
        }
    }

    lines
        .into_iter()
        .map(|(_, line)| line.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds at most one table per page from the ruling edges; pages without a
/// grid of at least one cell yield nothing.
pub(crate) fn detect_tables(edges: &[Edge], words: &[Word]) -> Vec<ExtractedTable> {
    let (horizontal, vertical): (Vec<Edge>, Vec<Edge>) = edges
        .iter()
        .copied()
        .partition(|edge| edge.orientation == Orientation::Horizontal);
    let horizontal = normalize_edges(horizontal);
    let vertical = normalize_edges(vertical);

    // Underlines and boxes around headers touch fewer than two rulings.
    let keep = |edge: &Edge, others: &[Edge]| {
        others.iter().filter(|other| edge.crosses(other)).count() >= 2
    };
    let grid_horizontal = horizontal
        .iter()
        .filter(|&edge| keep(edge, &vertical))
        .copied()
        .collect::<Vec<_>>();
    let grid_vertical = vertical
        .iter()
        .filter(|&edge| keep(edge, &horizontal))
        .copied()
        .collect::<Vec<_>>();

    let ys = distinct_positions(&grid_horizontal);
    let xs = distinct_positions(&grid_vertical);
    if ys.len() < 2 || xs.len() < 2 {
        return Vec::new();
    }

    let row_count = ys.len() - 1;
    let column_count = xs.len() - 1;
    let has_top_rule = |row: usize, column: usize| {
        grid_horizontal
            .iter()
            .any(|edge| edge.covers(ys[row], xs[column], xs[column + 1]))
    };
    let has_left_rule = |row: usize, column: usize| {
        grid_vertical
            .iter()
            .any(|edge| edge.covers(xs[column], ys[row], ys[row + 1]))
    };

    let mut owner = vec![vec![(0_usize, 0_usize); column_count]; row_count];
    for row in 0..row_count {
        for column in 0..column_count {
            owner[row][column] = if row > 0 && !has_top_rule(row, column) {
                owner[row - 1][column]
            } else if column > 0 && !has_left_rule(row, column) {
                owner[row][column - 1]
            } else {
                (row, column)
            };
        }
    }

    let mut buckets: Vec<Vec<Vec<&Word>>> = vec![vec![Vec::new(); column_count]; row_count];
    for word in words {
        let (Some(row), Some(column)) = (band(&ys, word.top), band(&xs, word.x0)) else {
            continue;
        };
        let (owner_row, owner_column) = owner[row][column];
        buckets[owner_row][owner_column].push(word);
    }

    let rows = buckets
        .iter_mut()
        .map(|row| row.iter_mut().map(|cell| cell_text(cell)).collect())
        .collect();
    vec![ExtractedTable { rows }]
}
