#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningCode {
    /// The page has no class header, typically a cover or legend page.
    NoClassName,
    NoTable,
    NoWords,
    EmptySchedule,
    /// A later page reused a class name; its schedule replaced the earlier one.
    DuplicateClass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<u32>,
    pub class_name: Option<String>,
}

impl ExtractWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            class_name: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}
