#![forbid(unsafe_code)]

/// Construction-time options shared by every atom kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomOptions {
    /// Name used in `Debug` output and log events.
    pub label: Option<String>,
}

impl AtomOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
