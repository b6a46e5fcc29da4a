use crate::types::SourceSpan;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct FunnelError {
    pub code: String,
    pub message: String,
    pub span: Option<SourceSpan>,
}

impl FunnelError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(
        code: impl Into<String>,
        message: impl Into<String>,
        span: SourceSpan,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: Some(span),
        }
    }

    /// `line:column` of the span start, when the error points into a source file.
    pub fn position(&self) -> Option<String> {
        self.span
            .as_ref()
            .map(|span| format!("{}:{}", span.start.line, span.start.column))
    }
}
