use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserMode {
    /// Cluster word boxes around day and period anchors.
    #[default]
    Position,
    /// Walk the ruled table found on the page.
    Table,
}

impl FromStr for ParserMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "position" | "words" => Ok(Self::Position),
            "table" => Ok(Self::Table),
            other => Err(format!(
                "unknown parser mode '{other}', expected 'position' or 'table'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "unknown output format '{other}', expected 'json' or 'csv'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Tunable heuristics shared by both parsers.
///
/// Distances are in PDF user-space units as reported by the word extractor.
/// The defaults were tuned against one Untis export and should be
/// recalibrated for other layouts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Weekday column headers in their canonical order. `dayIndex` is the
    /// position in this list.
    pub day_names: Vec<String>,
    /// Exact tokens from the page header and footer.
    pub header_blacklist: Vec<String>,
    pub header_prefix_blacklist: Vec<String>,
    /// Substrings marking a token as part of a date or school year.
    pub year_fragments: Vec<String>,
    /// Subjects that are placeholders rather than lessons.
    pub subject_blacklist: Vec<String>,
    pub year_prefixes: Vec<String>,
    pub vertical_tolerance: f32,
    pub horizontal_tolerance: f32,
    /// How far left of a day anchor a word may start and still belong to it.
    pub column_bleed_tolerance: f32,
    pub header_y_threshold: f32,
    pub max_period: u32,
    pub min_cell_lines: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            day_names: strings(&["Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag"]),
            header_blacklist: strings(&["Lessing-Gymnasium", "Karlsruhe", "SJ", "Untis"]),
            header_prefix_blacklist: strings(&["HJ"]),
            year_fragments: strings(&["20"]),
            subject_blacklist: strings(&[
                ".", "-", "HJ", "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli",
                "August", "September", "Oktober", "November", "Dezember",
            ]),
            year_prefixes: strings(&["20"]),
            vertical_tolerance: 25.0,
            horizontal_tolerance: 100.0,
            column_bleed_tolerance: 20.0,
            header_y_threshold: 60.0,
            max_period: 11,
            min_cell_lines: 3,
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn day_index(&self, text: &str) -> Option<usize> {
        self.day_names.iter().position(|name| name == text)
    }

    /// Parses a bare period label such as `"3"`, rejecting values outside
    /// `1..=max_period` so years and room numbers are not mistaken for rows.
    #[must_use]
    pub fn period_number(&self, text: &str) -> Option<u32> {
        let text = text.trim();
        if text.is_empty() || !text.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        text.parse::<u32>()
            .ok()
            .filter(|period| (1..=self.max_period).contains(period))
    }

    #[must_use]
    pub fn is_placeholder_subject(&self, subject: &str) -> bool {
        subject.is_empty()
            || self.subject_blacklist.iter().any(|item| item == subject)
            || self
                .year_prefixes
                .iter()
                .any(|prefix| subject.starts_with(prefix.as_str()))
    }

    /// True for tokens that never belong to a timetable cell: column and row
    /// labels, the export timestamp, and header or footer branding.
    #[must_use]
    pub fn is_noise_token(&self, text: &str) -> bool {
        if self.day_index(text).is_some() {
            return true;
        }
        if !text.is_empty()
            && text.chars().all(|ch| ch.is_ascii_digit())
            && text
                .parse::<u64>()
                .is_ok_and(|value| value <= u64::from(self.max_period))
        {
            return true;
        }
        if is_timestamp_like(text) {
            return true;
        }
        self.header_blacklist.iter().any(|item| item == text)
            || self
                .header_prefix_blacklist
                .iter()
                .any(|prefix| text.starts_with(prefix.as_str()))
            || self
                .year_fragments
                .iter()
                .any(|fragment| text.contains(fragment.as_str()))
    }

    pub(crate) fn validate(&self) -> Result<(), ExtractError> {
        if self.day_names.is_empty() {
            return Err(ExtractError::InvalidOption(
                "day_names must not be empty".to_string(),
            ));
        }
        if self.max_period == 0 {
            return Err(ExtractError::InvalidOption(
                "max_period must be at least 1".to_string(),
            ));
        }
        let tolerances = [
            ("vertical_tolerance", self.vertical_tolerance),
            ("horizontal_tolerance", self.horizontal_tolerance),
            ("column_bleed_tolerance", self.column_bleed_tolerance),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(ExtractError::InvalidOption(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// Timestamps in the export header look like `8.1.2026,13:47`.
pub(crate) fn is_timestamp_like(text: &str) -> bool {
    text.contains('.') && text.contains(':')
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    pub mode: ParserMode,
    pub layout: LayoutConfig,
}

/// Settings read from a TOML file. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub mode: Option<ParserMode>,
    pub format: Option<OutputFormat>,
    pub pages: Option<String>,
    pub layout: LayoutConfig,
}

impl RunConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ExtractError> {
        let config: Self =
            toml::from_str(source).map_err(|error| ExtractError::Config(error.to_string()))?;
        config.layout.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn page_selection(&self) -> Result<Option<PageSelection>, ExtractError> {
        self.pages
            .as_deref()
            .map(PageSelection::from_str)
            .transpose()
            .map_err(ExtractError::InvalidPageSelection)
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutConfig, PageSelection, ParserMode, RunConfig};
    use std::str::FromStr;

    #[test]
    fn parse_page_selection_range_and_single() {
        let selection = PageSelection::from_str("1-3,5").expect("selection should parse");
        assert!(selection.contains(1));
        assert!(selection.contains(2));
        assert!(selection.contains(3));
        assert!(selection.contains(5));
        assert!(!selection.contains(4));
    }

    #[test]
    fn reject_invalid_page_selection() {
        let err = PageSelection::from_str("3-1").expect_err("invalid range should fail");
        assert!(err.contains("invalid range"));
    }

    #[test]
    fn period_numbers_are_bounded() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.period_number(" 7 "), Some(7));
        assert_eq!(layout.period_number("11"), Some(11));
        assert_eq!(layout.period_number("12"), None);
        assert_eq!(layout.period_number("0"), None);
        assert_eq!(layout.period_number("2025"), None);
        assert_eq!(layout.period_number("5a"), None);
    }

    #[test]
    fn placeholder_subjects() {
        let layout = LayoutConfig::default();
        for subject in ["", ".", "-", "HJ", "Februar", "2025"] {
            assert!(layout.is_placeholder_subject(subject), "{subject:?}");
        }
        assert!(!layout.is_placeholder_subject("Mathe"));
    }

    #[test]
    fn noise_tokens() {
        let layout = LayoutConfig::default();
        for token in ["Montag", "3", "8.1.2026,13:47", "Untis", "HJ1", "2025/26"] {
            assert!(layout.is_noise_token(token), "{token:?}");
        }
        for token in ["Mathe", "R12", "12", "Müller"] {
            assert!(!layout.is_noise_token(token), "{token:?}");
        }
    }

    #[test]
    fn parser_mode_from_str() {
        assert_eq!(ParserMode::from_str("Table"), Ok(ParserMode::Table));
        assert_eq!(ParserMode::from_str("position"), Ok(ParserMode::Position));
        assert!(ParserMode::from_str("grid").is_err());
    }

    #[test]
    fn run_config_overrides_only_given_fields() {
        let config = RunConfig::from_toml_str(
            r#"
            input_path = "plans.pdf"
            mode = "table"
            pages = "2-4"

            [layout]
            vertical_tolerance = 18.5
            day_names = ["Mon", "Tue", "Wed", "Thu", "Fri"]
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.mode, Some(ParserMode::Table));
        assert_eq!(config.layout.vertical_tolerance, 18.5);
        assert_eq!(config.layout.horizontal_tolerance, 100.0);
        assert_eq!(config.layout.day_index("Wed"), Some(2));
        let pages = config
            .page_selection()
            .expect("pages should parse")
            .expect("pages should be present");
        assert!(pages.contains(3));
        assert!(!pages.contains(1));
    }

    #[test]
    fn run_config_rejects_empty_day_names() {
        let err = RunConfig::from_toml_str("[layout]\nday_names = []\n")
            .expect_err("empty day names should fail");
        assert!(err.to_string().contains("day_names"));
    }
}
