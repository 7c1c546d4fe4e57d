//! One-line status shown in the bottom bar.

/// Severity of the current status message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    Info,
    Success,
    Error,
}

/// Latest user-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            kind: StatusKind::Info,
            text: "Ready".to_string(),
        }
    }
}

impl StatusLine {
    pub fn info(&mut self, text: impl Into<String>) {
        self.set(StatusKind::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.set(StatusKind::Success, text);
    }

    /// Record an error and mirror it to the log.
    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::error!("{text}");
        self.set(StatusKind::Error, text);
    }

    fn set(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.kind = kind;
        self.text = text.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let mut status = StatusLine::default();
        assert_eq!(status.kind, StatusKind::Info);
        assert_eq!(status.text, "Ready");

        status.error("cannot read frame 40");
        assert_eq!(status.kind, StatusKind::Error);

        status.success("Saved 3 peaks");
        assert_eq!(status.kind, StatusKind::Success);
        assert_eq!(status.text, "Saved 3 peaks");
    }
}
