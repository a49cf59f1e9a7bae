use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// Failure to obtain a usable block sequence from a document.
///
/// These abort the extraction call that hit them. Per-line oddities inside a
/// well-formed document are never reported through this type.
#[derive(Debug)]
pub enum DocumentError {
    Io { path: PathBuf, source: io::Error },
    Json(serde_json::Error),
    NotABlockList,
    MalformedBlock { index: usize, reason: String },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Failed to read document '{}': {}", path.display(), source)
            }
            Self::Json(e) => write!(f, "Document is not valid JSON: {e}"),
            Self::NotABlockList => write!(f, "Document must be a JSON array of blocks"),
            Self::MalformedBlock { index, reason } => {
                write!(f, "Malformed block at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(e) => Some(e),
            Self::NotABlockList | Self::MalformedBlock { .. } => None,
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
