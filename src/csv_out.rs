use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ExtractError;
use crate::model::ScheduleMap;

const HEADERS: [&str; 7] = [
    "class",
    "period",
    "day_index",
    "day_name",
    "subject",
    "teacher",
    "room",
];

fn write_lessons<W: std::io::Write>(
    writer: &mut Writer<W>,
    schedules: &ScheduleMap,
) -> Result<(), ExtractError> {
    writer.write_record(HEADERS)?;
    for schedule in schedules.values() {
        for lesson in &schedule.lessons {
            let period = lesson.period.to_string();
            let day_index = lesson.day_index.to_string();
            writer.write_record([
                schedule.class_name.as_str(),
                period.as_str(),
                day_index.as_str(),
                lesson.day_name.as_str(),
                lesson.subject.as_str(),
                lesson.teacher.as_str(),
                lesson.room.as_str(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// One row per lesson, for spreadsheet users.
pub(crate) fn write_csv(path: &Path, schedules: &ScheduleMap) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    write_lessons(&mut writer, schedules)
}

pub(crate) fn write_csv_to_string(schedules: &ScheduleMap) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    write_lessons(&mut writer, schedules)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
