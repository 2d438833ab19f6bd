use crate::model::Lesson;
use crate::options::LayoutConfig;

/// Splits raw cell text into trimmed, non-empty lines.
pub(crate) fn cell_lines(cell: &str) -> Vec<String> {
    cell.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Maps cell lines onto subject, teacher and room. Cells with too few lines
/// are free periods or merged fragments; placeholder subjects are dropped.
pub(crate) fn lesson_from_lines(
    period: u32,
    day_index: usize,
    lines: &[String],
    layout: &LayoutConfig,
) -> Option<Lesson> {
    if lines.len() < layout.min_cell_lines.max(1) {
        return None;
    }

    let subject = lines.first().map(String::as_str).unwrap_or_default();
    if layout.is_placeholder_subject(subject) {
        return None;
    }

    let day_name = layout.day_names.get(day_index)?.clone();
    let line = |index: usize| lines.get(index).cloned().unwrap_or_default();

    Some(Lesson {
        period,
        day_index,
        day_name,
        subject: subject.to_string(),
        teacher: line(1),
        room: line(2),
    })
}
