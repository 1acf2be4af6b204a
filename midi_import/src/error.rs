use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportErrorKind {
    Io,
    Parse,
    Analysis,
    Timeout,
}

impl ImportErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Parse
            "E1001" | "E1002" | "E1003" => Self::Parse,

            // Io
            "E2001" => Self::Io,

            // Analysis
            "E3001" => Self::Analysis,

            // Timeout
            "E4001" => Self::Timeout,

            _ => Self::Parse,
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message}")]
pub struct ImportError {
    pub code: &'static str,
    pub kind: ImportErrorKind,
    pub message: String,

    pub file: Option<String>,
    pub track: Option<usize>,
}

impl ImportError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: ImportErrorKind::from_code(code),
            message: message.into(),

            file: None,
            track: None,
        }
    }

    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        Self::new("E1001", format!("malformed MIDI data: {err}"))
    }

    pub(crate) fn no_notes() -> Self {
        Self::new("E1002", "no track contains any notes")
    }

    pub(crate) fn empty_track() -> Self {
        Self::new("E3001", "cannot analyze a track with zero notes")
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_track(mut self, track: usize) -> Self {
        self.track = Some(track);
        self
    }

    pub fn is_io(&self) -> bool {
        self.kind == ImportErrorKind::Io
    }
}
