use thiserror::Error;

/// Failure to compile or render a report template.
///
/// Lines are 1-based and point at the tag that failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    #[error("template syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("template render error on line {line}: {message}")]
    Render { line: usize, message: String },
}

impl TemplateError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        TemplateError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn render(line: usize, message: impl Into<String>) -> Self {
        TemplateError::Render {
            line,
            message: message.into(),
        }
    }
}

/// Anything that can go wrong while validating or rendering a stored template.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
}
