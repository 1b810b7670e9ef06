use thiserror::Error;

/// Errors that can occur when converting between expression text and trees
#[derive(Debug, Error)]
pub enum FilterParseError {
    #[error("{message}{}", offset.map(|o| format!(" (at offset {o})")).unwrap_or_default())]
    Syntax {
        message: String,
        offset: Option<usize>,
    },

    #[error("Invalid condition tree: {0}")]
    InvalidTree(String),

    #[error("Invalid condition tree JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FilterParseError {
    pub fn syntax(message: impl Into<String>, offset: Option<usize>) -> Self {
        FilterParseError::Syntax {
            message: message.into(),
            offset,
        }
    }

    /// Byte offset into the source text, when the failure can be localised
    pub fn offset(&self) -> Option<usize> {
        match self {
            FilterParseError::Syntax { offset, .. } => *offset,
            _ => None,
        }
    }
}
