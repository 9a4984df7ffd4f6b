use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Import folder doesn't exist: {0}")]
    MissingDirectory(String),
    #[error("The folder {0} is empty or doesn't contain any matching images")]
    EmptyFolder(String),
    #[error("Duplicate file name {name} found {count} times in the import folder")]
    DuplicateFile { name: String, count: usize },
    #[error("Sprite {sprite} is missing frame index {index}")]
    MissingFrame { sprite: String, index: u32 },
    #[error("Invalid frame index in file name {0}")]
    InvalidFrameIndex(String),
    #[error("Invalid frame regex {pattern}: {reason}")]
    InvalidRegex { pattern: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Font sidecar {file} contained invalid data. Please check the format and try again.")]
    FontSidecar { file: String },
}

impl ImportError {
    /// Numeric outcome code reported for fatal failures (also used as the
    /// process exit code by the CLI).
    pub fn outcome_code(&self) -> i32 {
        match self {
            ImportError::Io(_) => 310,
            ImportError::MissingDirectory(_) => 311,
            ImportError::EmptyFolder(_) => 312,
            ImportError::DuplicateFile { .. } => 313,
            ImportError::MissingFrame { .. } => 314,
            ImportError::InvalidFrameIndex(_) => 315,
            ImportError::InvalidRegex { .. } => 316,
            ImportError::InvalidConfig(_) => 317,
            ImportError::Image(_) => 318,
            ImportError::FontSidecar { .. } => 319,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
