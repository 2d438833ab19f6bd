//! Timetable reconstruction from word positions alone.
//!
//! Table detection is unreliable for exports where lessons spanning several
//! periods erase the ruling between rows. Instead, the weekday headers give one
//! x anchor per column and the period labels one y anchor per row; every other
//! word is assigned to the nearest anchors within the configured tolerances.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cell::lesson_from_lines;
use crate::class_name::find_class_in_words;
use crate::model::{Schedule, Word};
use crate::options::LayoutConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
struct DayAnchor {
    day_index: usize,
    x: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PeriodAnchor {
    period: u32,
    y: f32,
}

/// One anchor per weekday, ordered left to right. When a day name occurs more
/// than once the top-most occurrence is the column header.
fn day_anchors(words: &[Word], layout: &LayoutConfig) -> Vec<DayAnchor> {
    let mut found: BTreeMap<usize, &Word> = BTreeMap::new();
    for word in words {
        let Some(day_index) = layout.day_index(&word.text) else {
            continue;
        };
        found
            .entry(day_index)
            .and_modify(|current| {
                if word.top < current.top {
                    *current = word;
                }
            })
            .or_insert(word);
    }

    let mut anchors = found
        .into_iter()
        .map(|(day_index, word)| DayAnchor {
            day_index,
            x: word.x0,
        })
        .collect::<Vec<_>>();
    anchors.sort_by(|a, b| a.x.total_cmp(&b.x));
    anchors
}

/// One anchor per period label, ordered top to bottom. Labels sit in the
/// left-most column, so repeated numbers further right are ignored.
fn period_anchors(words: &[Word], layout: &LayoutConfig) -> Vec<PeriodAnchor> {
    let mut found: BTreeMap<u32, &Word> = BTreeMap::new();
    for word in words {
        let Some(period) = layout.period_number(&word.text) else {
            continue;
        };
        found
            .entry(period)
            .and_modify(|current| {
                if word.x0 < current.x0 {
                    *current = word;
                }
            })
            .or_insert(word);
    }

    let mut anchors = found
        .into_iter()
        .map(|(period, word)| PeriodAnchor { period, y: word.top })
        .collect::<Vec<_>>();
    anchors.sort_by(|a, b| a.y.total_cmp(&b.y));
    anchors
}

/// Index of the anchor with the smallest distance. `None` distances are out
/// of range; ties keep the earlier anchor.
fn nearest<T>(anchors: &[T], distance: impl Fn(&T) -> Option<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, anchor) in anchors.iter().enumerate() {
        let Some(candidate) = distance(anchor) else {
            continue;
        };
        if best.is_none_or(|(_, current)| candidate < current) {
            best = Some((index, candidate));
        }
    }
    best.map(|(index, _)| index)
}

fn row_for(word: &Word, periods: &[PeriodAnchor], layout: &LayoutConfig) -> Option<usize> {
    if word.top <= layout.header_y_threshold {
        return None;
    }
    nearest(periods, |anchor| {
        let distance = (word.top - anchor.y).abs();
        (distance < layout.vertical_tolerance).then_some(distance)
    })
}

fn column_for(word: &Word, days: &[DayAnchor], layout: &LayoutConfig) -> Option<usize> {
    nearest(days, |anchor| {
        let distance = (word.x0 - anchor.x).abs();
        (distance < layout.horizontal_tolerance
            && word.x0 > anchor.x - layout.column_bleed_tolerance)
            .then_some(distance)
    })
}

/// Rebuilds a class schedule from the words of one page.
///
/// Returns `None` when the page carries no class header, which is expected
/// for cover pages. The result depends only on `words` and `layout`.
#[must_use]
pub fn parse_position_schedule(words: &[Word], layout: &LayoutConfig) -> Option<Schedule> {
    let header = find_class_in_words(words)?;
    let days = day_anchors(words, layout);
    let periods = period_anchors(words, layout);
    debug!(
        class = %header.name,
        days = days.len(),
        periods = periods.len(),
        "anchors located"
    );

    let mut cells: BTreeMap<(usize, usize), Vec<&Word>> = BTreeMap::new();
    for word in words {
        if layout.is_noise_token(word.text.trim()) {
            continue;
        }
        let Some(row) = row_for(word, &periods, layout) else {
            continue;
        };
        let Some(column) = column_for(word, &days, layout) else {
            continue;
        };
        cells.entry((row, column)).or_default().push(word);
    }

    let mut lessons = Vec::new();
    for ((row, column), mut cell) in cells {
        cell.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));
        let lines = cell
            .iter()
            .map(|word| word.text.trim().to_string())
            .collect::<Vec<_>>();
        let period = periods[row].period;
        let day_index = days[column].day_index;
        if let Some(lesson) = lesson_from_lines(period, day_index, &lines, layout) {
            lessons.push(lesson);
        }
    }

    Some(Schedule {
        class_name: header.name,
        class_teachers: header.teachers,
        lessons,
    })
}
