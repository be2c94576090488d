use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    /// No column grid on the page; lines were read from their text.
    NoGridDetected,
    /// The page had no positioned text and was read from plain text.
    TextFallback,
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoGridDetected => "no-grid",
            Self::TextFallback => "text-fallback",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<u32>,
}

impl ConvertWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

impl fmt::Display for ConvertWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "[{}] page {page}: {}", self.code, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}
