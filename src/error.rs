//! Application error type.
//!
//! Every failure is fatal to the run. Errors carry the category (which also
//! decides the process exit code) and, when known, the pipeline stage where
//! they were raised so the message points at the failing step.

use std::fmt;

/// Error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid arguments or settings.
    Config,
    /// Missing or rejected API key.
    Authentication,
    /// Provider returned nothing usable for the symbol/location.
    DataUnavailable,
    /// Date keys do not line up (climatology miss, duplicate or missing labels, empty join).
    Alignment,
    /// Regression input is degenerate.
    Numeric,
    /// Local file or terminal I/O.
    Io,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Authentication => 3,
            ErrorKind::DataUnavailable => 4,
            ErrorKind::Alignment => 5,
            ErrorKind::Numeric => 6,
            ErrorKind::Io => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Config => "configuration error",
            ErrorKind::Authentication => "authentication error",
            ErrorKind::DataUnavailable => "data unavailable",
            ErrorKind::Alignment => "alignment error",
            ErrorKind::Numeric => "numeric error",
            ErrorKind::Io => "i/o error",
        }
    }
}

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    MarketFetch,
    WeatherFetch,
    Climatology,
    Alignment,
    Analysis,
    Presentation,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::MarketFetch => "market fetch",
            Stage::WeatherFetch => "weather fetch",
            Stage::Climatology => "climatology",
            Stage::Alignment => "alignment",
            Stage::Analysis => "analysis",
            Stage::Presentation => "presentation",
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    stage: Option<Stage>,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage: None,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn data_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataUnavailable, message)
    }

    pub fn alignment(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Alignment, message)
    }

    pub fn numeric(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Numeric, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    /// Tag the error with the stage it surfaced in. An already-tagged error keeps
    /// its original (innermost) stage.
    pub fn at(mut self, stage: Stage) -> Self {
        if self.stage.is_none() {
            self.stage = Some(stage);
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "{} during {}: {}", self.kind.label(), stage.name(), self.message),
            None => write!(f, "{}: {}", self.kind.label(), self.message),
        }
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("stage", &self.stage)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Extension for tagging `Result`s with a stage at the call site.
pub trait StageExt<T> {
    fn at_stage(self, stage: Stage) -> Result<T, AppError>;
}

impl<T> StageExt<T> for Result<T, AppError> {
    fn at_stage(self, stage: Stage) -> Result<T, AppError> {
        self.map_err(|e| e.at(stage))
    }
}
