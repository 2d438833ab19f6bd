use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ExtractError;
use crate::model::ScheduleMap;

/// Pretty-printed JSON; `serde_json` leaves non-ASCII characters unescaped.
pub(crate) fn write_json(path: &Path, schedules: &ScheduleMap) -> Result<(), ExtractError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, schedules)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_json_to_string(schedules: &ScheduleMap) -> Result<String, ExtractError> {
    Ok(serde_json::to_string_pretty(schedules)?)
}
