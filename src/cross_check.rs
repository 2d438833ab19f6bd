use std::collections::BTreeSet;

use crate::model::Schedule;

/// `(period, day_index, subject)` identifies a lesson independently of how the
/// teacher and room lines were split.
pub type LessonKey = (u32, usize, String);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrossCheck {
    pub matched: Vec<LessonKey>,
    pub table_only: Vec<LessonKey>,
    pub position_only: Vec<LessonKey>,
}

impl CrossCheck {
    #[must_use]
    pub fn agrees(&self) -> bool {
        self.table_only.is_empty() && self.position_only.is_empty()
    }
}

fn lesson_keys(schedule: &Schedule) -> BTreeSet<LessonKey> {
    schedule
        .lessons
        .iter()
        .map(|lesson| (lesson.period, lesson.day_index, lesson.subject.clone()))
        .collect()
}

/// Compares the lessons found by the table parser with those found by the
/// position parser for the same page.
#[must_use]
pub fn cross_check(table: &Schedule, position: &Schedule) -> CrossCheck {
    let table_keys = lesson_keys(table);
    let position_keys = lesson_keys(position);

    CrossCheck {
        matched: table_keys.intersection(&position_keys).cloned().collect(),
        table_only: table_keys.difference(&position_keys).cloned().collect(),
        position_only: position_keys.difference(&table_keys).cloned().collect(),
    }
}
