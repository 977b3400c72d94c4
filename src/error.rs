use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("position has no legal moves")]
    NoLegalMoves,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("search depth must be at least 1, got {0}")]
    InvalidDepth(u32),
    #[error("time budget must be positive, got {0:?}")]
    InvalidTimeBudget(Duration),
    #[error("unknown difficulty `{0}` (expected easy, medium, hard or expert)")]
    UnknownDifficulty(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid sfen `{sfen}`: {reason}")]
    Sfen { sfen: String, reason: String },
    #[error("illegal or malformed move `{0}`")]
    Move(String),
}

impl ParseError {
    pub(crate) fn sfen(sfen: &str, reason: impl Into<String>) -> Self {
        ParseError::Sfen {
            sfen: sfen.to_string(),
            reason: reason.into(),
        }
    }
}
