use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single extracted token. `x0` is the left edge and `top` the upper edge,
/// measured from the top-left corner of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub x0: f32,
    pub top: f32,
}

impl Word {
    #[must_use]
    pub fn new(text: impl Into<String>, x0: f32, top: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
        }
    }
}

/// A ruled table found on a page. Cells may contain embedded newlines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedTable {
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageContent {
    pub page_number: u32,
    pub text: String,
    pub words: Vec<Word>,
    pub tables: Vec<ExtractedTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub period: u32,
    pub day_index: usize,
    pub day_name: String,
    pub subject: String,
    pub teacher: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub class_name: String,
    pub class_teachers: Vec<String>,
    pub lessons: Vec<Lesson>,
}

pub type ScheduleMap = BTreeMap<String, Schedule>;
