mod cell;
mod class_name;
mod cross_check;
mod csv_out;
mod error;
mod inspect;
mod json_out;
mod layout_parse;
mod model;
mod options;
mod pdf_reader;
mod table_detect;
mod table_parse;
mod warning;

use std::path::Path;

use tracing::{info, warn};

use crate::csv_out::{write_csv, write_csv_to_string};
use crate::json_out::{write_json, write_json_to_string};
use crate::warning::WarningCode;

pub use cross_check::{CrossCheck, LessonKey, cross_check};
pub use error::ExtractError;
pub use inspect::{LiteralHit, dump_table, dump_words, find_literal};
pub use layout_parse::parse_position_schedule;
pub use model::{ExtractedTable, Lesson, PageContent, Schedule, ScheduleMap, Word};
pub use options::{
    ExtractOptions, LayoutConfig, OutputFormat, PageSelection, ParserMode, RunConfig,
};
pub use pdf_reader::{read_pdf_pages, read_pdf_pages_from_bytes};
pub use table_parse::parse_table_schedule;
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub page_count: usize,
    pub schedule_count: usize,
    pub lesson_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

fn parse_page(
    page: &PageContent,
    mode: ParserMode,
    layout: &LayoutConfig,
) -> Result<Schedule, ExtractWarning> {
    let skipped = |code: WarningCode, message: &str| {
        ExtractWarning::new(code, message).with_page(page.page_number)
    };

    match mode {
        ParserMode::Position => {
            if page.words.is_empty() {
                return Err(skipped(
                    WarningCode::NoWords,
                    "no positioned words could be extracted",
                ));
            }
            parse_position_schedule(&page.words, layout)
                .ok_or_else(|| skipped(WarningCode::NoClassName, "no class name found"))
        }
        ParserMode::Table => {
            let Some(table) = page.tables.first() else {
                return Err(skipped(WarningCode::NoTable, "no table found"));
            };
            parse_table_schedule(&page.text, table, layout)
                .ok_or_else(|| skipped(WarningCode::NoClassName, "no class name found"))
        }
    }
}

/// Parses every page independently and collects the schedules by class name.
/// Pages that yield nothing are recorded as warnings and skipped.
#[must_use]
pub fn extract_schedules(
    pages: &[PageContent],
    options: &ExtractOptions,
) -> (ScheduleMap, ExtractionReport) {
    let mut schedules = ScheduleMap::new();
    let mut warnings = Vec::new();

    for page in pages {
        if let Some(selection) = &options.pages
            && !selection.contains(page.page_number)
        {
            continue;
        }

        let schedule = match parse_page(page, options.mode, &options.layout) {
            Ok(schedule) => schedule,
            Err(warning) => {
                warn!(page = page.page_number, "{}", warning.message);
                warnings.push(warning);
                continue;
            }
        };

        if schedule.lessons.is_empty() {
            warn!(
                page = page.page_number,
                class = %schedule.class_name,
                "class has no lessons"
            );
            warnings.push(
                ExtractWarning::new(WarningCode::EmptySchedule, "class has no lessons")
                    .with_page(page.page_number)
                    .with_class_name(&schedule.class_name),
            );
            continue;
        }

        info!(
            page = page.page_number,
            class = %schedule.class_name,
            lessons = schedule.lessons.len(),
            "schedule extracted"
        );
        if schedules.contains_key(&schedule.class_name) {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::DuplicateClass,
                    "class appears on more than one page; keeping the later page",
                )
                .with_page(page.page_number)
                .with_class_name(&schedule.class_name),
            );
        }
        schedules.insert(schedule.class_name.clone(), schedule);
    }

    let report = ExtractionReport {
        page_count: pages
            .iter()
            .filter(|page| {
                options
                    .pages
                    .as_ref()
                    .is_none_or(|selection| selection.contains(page.page_number))
            })
            .count(),
        schedule_count: schedules.len(),
        lesson_count: schedules.values().map(|schedule| schedule.lessons.len()).sum(),
        warnings,
    };
    (schedules, report)
}

fn validate(options: &ExtractOptions) -> Result<(), ExtractError> {
    if options.pages.as_ref().is_some_and(PageSelection::is_empty) {
        return Err(ExtractError::InvalidPageSelection(
            "page selection cannot be empty".to_string(),
        ));
    }
    options.layout.validate()
}

pub fn extract_pdf_to_file(
    input_pdf: &Path,
    output: &Path,
    format: OutputFormat,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    validate(options)?;

    let pages = read_pdf_pages(input_pdf, options.pages.as_ref())?;
    let (schedules, report) = extract_schedules(&pages, options);
    match format {
        OutputFormat::Json => write_json(output, &schedules)?,
        OutputFormat::Csv => write_csv(output, &schedules)?,
    }

    Ok(report)
}

pub fn extract_pdf_bytes_to_string(
    input_pdf: &[u8],
    format: OutputFormat,
    options: &ExtractOptions,
) -> Result<(String, ExtractionReport), ExtractError> {
    validate(options)?;

    let pages = read_pdf_pages_from_bytes(input_pdf, options.pages.as_ref())?;
    let (schedules, report) = extract_schedules(&pages, options);
    let output = match format {
        OutputFormat::Json => write_json_to_string(&schedules)?,
        OutputFormat::Csv => write_csv_to_string(&schedules)?,
    };

    Ok((output, report))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageComparison {
    pub page: u32,
    pub class_name: String,
    pub check: CrossCheck,
}

/// Runs both parsers on each page with a class header. A page whose table
/// could not be detected compares against an empty table schedule, so every
/// position lesson shows up as one-sided.
#[must_use]
pub fn compare_parsers(pages: &[PageContent], layout: &LayoutConfig) -> Vec<PageComparison> {
    pages
        .iter()
        .filter_map(|page| {
            let position = parse_position_schedule(&page.words, layout)?;
            let table = page
                .tables
                .first()
                .and_then(|table| parse_table_schedule(&page.text, table, layout))
                .unwrap_or_else(|| Schedule {
                    class_name: position.class_name.clone(),
                    class_teachers: Vec::new(),
                    lessons: Vec::new(),
                });
            Some(PageComparison {
                page: page.page_number,
                class_name: position.class_name.clone(),
                check: cross_check(&table, &position),
            })
        })
        .collect()
}
