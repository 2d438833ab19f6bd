use crate::cell::{cell_lines, lesson_from_lines};
use crate::class_name::find_class_in_text;
use crate::model::{ExtractedTable, Schedule};
use crate::options::LayoutConfig;

/// Reads a timetable from a ruled table: column 0 holds the period label and
/// the following columns hold one weekday each, in canonical order.
///
/// Returns `None` when the page text has no class header (cover pages and
/// legends).
#[must_use]
pub fn parse_table_schedule(
    text: &str,
    table: &ExtractedTable,
    layout: &LayoutConfig,
) -> Option<Schedule> {
    let header = find_class_in_text(text)?;
    let day_count = layout.day_names.len();

    let mut lessons = Vec::new();
    for row in &table.rows {
        if row.len() < day_count + 1 {
            continue;
        }
        let Some(period) = row[0].trim().parse::<u32>().ok() else {
            continue;
        };
        if !(1..=layout.max_period).contains(&period) {
            continue;
        }

        for (day_index, cell) in row[1..=day_count].iter().enumerate() {
            let lines = cell_lines(cell);
            if let Some(lesson) = lesson_from_lines(period, day_index, &lines, layout) {
                lessons.push(lesson);
            }
        }
    }

    Some(Schedule {
        class_name: header.name,
        class_teachers: header.teachers,
        lessons,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::parse_table_schedule;
    use crate::model::{ExtractedTable, Lesson};
    use crate::options::LayoutConfig;

    const TEXT: &str = "Lessing-Gymnasium Karlsruhe\n8.1.2026 13:47\n5a\nMontag Dienstag";

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(ToString::to_string).collect()
    }

    fn table() -> ExtractedTable {
        ExtractedTable {
            rows: vec![
                row(&["", "Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag"]),
                row(&["1", "D\nKern\nR12", "", "M\nLang\nR3", ".\nx\ny", "Sp\nOtt"]),
                row(&["Pause", "", "", "", "", ""]),
                row(&["2", "", "E\nFox\nR7", "", "", ""]),
                row(&["14", "Mu\nBach\nR1", "", "", "", ""]),
                row(&["3", "Ku"]),
            ],
        }
    }

    #[test]
    fn parses_numeric_rows_and_full_cells() {
        let layout = LayoutConfig::default();
        let schedule = parse_table_schedule(TEXT, &table(), &layout).expect("schedule");

        assert_eq!(schedule.class_name, "5a");
        assert_eq!(
            schedule.lessons,
            vec![
                Lesson {
                    period: 1,
                    day_index: 0,
                    day_name: "Montag".to_string(),
                    subject: "D".to_string(),
                    teacher: "Kern".to_string(),
                    room: "R12".to_string(),
                },
                Lesson {
                    period: 1,
                    day_index: 2,
                    day_name: "Mittwoch".to_string(),
                    subject: "M".to_string(),
                    teacher: "Lang".to_string(),
                    room: "R3".to_string(),
                },
                Lesson {
                    period: 2,
                    day_index: 1,
                    day_name: "Dienstag".to_string(),
                    subject: "E".to_string(),
                    teacher: "Fox".to_string(),
                    room: "R7".to_string(),
                },
            ]
        );
    }

    #[test]
    fn missing_class_header_yields_no_schedule() {
        let layout = LayoutConfig::default();
        assert!(parse_table_schedule("Inhaltsverzeichnis", &table(), &layout).is_none());
    }

    #[test]
    fn empty_table_yields_empty_schedule() {
        let layout = LayoutConfig::default();
        let schedule = parse_table_schedule(TEXT, &ExtractedTable::default(), &layout)
            .expect("schedule");
        assert!(schedule.lessons.is_empty());
    }
}
