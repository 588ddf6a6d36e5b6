//! Error types for the scale core.
//!
//! None of these are fatal: a rejection leaves state untouched and the host
//! keeps rendering.

use serde::Serialize;
use thiserror::Error;

use crate::answers::AnswerId;

/// Why an offered answer or a removal request was refused
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "camelCase")]
pub enum Rejection {
    #[error("malformed drop payload: {0}")]
    Malformed(String),

    #[error("answer {0} is already on the scale for this question")]
    Duplicate(AnswerId),

    #[error("question {question} already holds {max} answers")]
    Capacity { question: u32, max: usize },

    #[error("answer {0} cannot be removed from the current question")]
    NotRemovable(AnswerId),
}

impl From<serde_json::Error> for Rejection {
    fn from(err: serde_json::Error) -> Self {
        Rejection::Malformed(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid tuning value for {field}: {value}")]
    Invalid { field: &'static str, value: f32 },
}
