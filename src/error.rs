//! Error taxonomy for the matcher.
//!
//! Mirrors the host-visible error tags rather than a deep type hierarchy:
//! every failure the core can raise collapses into one of these variants,
//! behind one `thiserror` enum.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("slicer error: {0}")]
    Slicer(String),

    #[error("indexer error: {0}")]
    Indexer(String),

    #[error("build error: {0}")]
    Build(String),

    #[error("validate error: {0}")]
    Validate(String),

    #[error("parse expression error: {0}")]
    ParseExpression(String),

    #[error("{0}")]
    Generic(String),
}

pub type MatchResult<T> = Result<T, MatchError>;
