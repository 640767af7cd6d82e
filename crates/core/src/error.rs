use callscope_protocol::Symbol;
use thiserror::Error;

use crate::model::EdgeKeyError;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification callers use to decide how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Unavailable,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("run `{id}` not found for source `{category}`")]
    RunNotFound { id: String, category: String },

    /// Recoverable: rendered as an informational report.
    #[error("symbol `{0}` not found in run")]
    SymbolNotFound(Symbol),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed edge key: {0}")]
    EdgeKey(#[from] EdgeKeyError),

    #[error("{context}")]
    Unavailable {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    pub fn unavailable(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Unavailable {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::RunNotFound { .. } | Error::SymbolNotFound(_) => ErrorKind::NotFound,
            Error::InvalidArgument(_) | Error::EdgeKey(_) => ErrorKind::InvalidArgument,
            Error::Unavailable { .. } => ErrorKind::Unavailable,
        }
    }

    /// Only a missing drill-down symbol is recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::SymbolNotFound(_))
    }
}
