use bytes::Bytes;

use crate::domain::{
    common::entities::app_errors::CoreError, food_analysis::entities::AnalysisResult,
};

/// Visible state of an analysis session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Identifying,
    Identified(AnalysisResult),
    Analysing,
    Result(AnalysisResult),
    Error(SessionError),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Identifying => "identifying",
            SessionState::Identified(_) => "identified",
            SessionState::Analysing => "analysing",
            SessionState::Result(_) => "result",
            SessionState::Error(_) => "error",
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            SessionState::Identified(result) | SessionState::Result(result) => Some(result),
            SessionState::Idle
            | SessionState::Identifying
            | SessionState::Analysing
            | SessionState::Error(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionError {
    pub title: String,
    pub message: String,
    pub cause: CoreError,
}

impl From<CoreError> for SessionError {
    fn from(cause: CoreError) -> Self {
        Self {
            title: cause.title().to_string(),
            message: cause.to_string(),
            cause,
        }
    }
}

/// What the session is analysing. Owned by the session and dropped on reset.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisSource {
    Image(Bytes),
    Description(String),
}

impl AnalysisSource {
    pub fn image(&self) -> Option<&Bytes> {
        match self {
            AnalysisSource::Image(image) => Some(image),
            AnalysisSource::Description(_) => None,
        }
    }
}
