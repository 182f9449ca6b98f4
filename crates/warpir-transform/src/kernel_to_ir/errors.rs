use thiserror::Error;

use warpir_core::ast::Span;

pub type Result<T> = std::result::Result<T, CompileError>;

/// Fatal frontend failure. Compilation never recovers or falls back; the
/// caller gets a full module list or one of these.
///
/// `Source` variants quote the offending kernel text. `Internal` marks
/// states user code cannot reach and points at a compiler defect.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("{message} (at `{snippet}`)")]
    Source {
        span: Span,
        snippet: String,
        message: String,
    },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("IR builder error: {0}")]
    BuilderError(String),

    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CompileError {
    /// A user-facing error pinned to a source span. The snippet is captured
    /// eagerly so the error stays self-describing after the source is gone.
    pub fn at(span: Span, source: &str, message: impl Into<String>) -> Self {
        CompileError::Source {
            span,
            snippet: span.snippet(source).to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal(message.into())
    }
}

impl From<warpir_core::IrError> for CompileError {
    fn from(err: warpir_core::IrError) -> Self {
        CompileError::BuilderError(err.to_string())
    }
}
