use crate::domain::food_analysis::value_objects::{AnalysisSource, SessionState};

/// Escalation is allowed once per session, from a fast-tier result that still
/// has its photo.
pub fn can_improve(
    state: &SessionState,
    source: Option<&AnalysisSource>,
    improve_used: bool,
) -> bool {
    if improve_used || source.and_then(AnalysisSource::image).is_none() {
        return false;
    }

    match state {
        SessionState::Identified(result) | SessionState::Result(result) => result.can_improve(),
        SessionState::Idle
        | SessionState::Identifying
        | SessionState::Analysing
        | SessionState::Error(_) => false,
    }
}
