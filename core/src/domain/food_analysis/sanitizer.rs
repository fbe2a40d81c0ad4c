//! Isolates the JSON object in a free-form model reply.
//!
//! Generative models wrap JSON in markdown fences or surround it with prose
//! even when asked not to. Everything here is pure text manipulation.

use serde::de::DeserializeOwned;

use crate::domain::common::entities::app_errors::CoreError;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Strips fences, surrounding whitespace and any text outside the outermost
/// braces. The result is only a candidate; it is not validated as JSON.
pub fn clean_response(raw: &str) -> String {
    let unfenced = json_fence_interior(raw)
        .or_else(|| generic_fence_interior(raw))
        .unwrap_or(raw);

    let mut candidate = unfenced.trim();

    if let Some(first_brace) = candidate.find('{') {
        if first_brace != 0 {
            candidate = &candidate[first_brace..];
        }
    }

    if let Some(last_brace) = candidate.rfind('}') {
        if last_brace != candidate.len() - 1 {
            candidate = &candidate[..=last_brace];
        }
    }

    candidate.to_string()
}

/// Cleans `raw` and decodes it into `T`.
///
/// On failure the error keeps both the raw reply and the cleaned candidate.
pub fn decode_response<T: DeserializeOwned>(raw: &str) -> Result<T, CoreError> {
    let cleaned = clean_response(raw);

    serde_json::from_str(&cleaned).map_err(|e| {
        tracing::error!(
            raw = %raw,
            cleaned = %cleaned,
            "Failed to decode model response: {}",
            e
        );
        CoreError::UnparseableResponse {
            raw: raw.to_string(),
            cleaned,
            reason: e.to_string(),
        }
    })
}

/// Interior of a ```` ```json ```` fence (case-insensitive) closed by the last
/// fence in the text.
fn json_fence_interior(raw: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets aligned with `raw`.
    let open = raw.to_ascii_lowercase().find(JSON_FENCE)?;
    let start = open + JSON_FENCE.len();
    let close = raw.rfind(FENCE)?;

    (close > start).then(|| &raw[start..close])
}

/// Interior between the first and the last generic fence, when the last one
/// really comes after the first.
fn generic_fence_interior(raw: &str) -> Option<&str> {
    let open = raw.find(FENCE)?;
    let start = open + FENCE.len();
    let close = raw.rfind(FENCE)?;

    (close > start).then(|| &raw[start..close])
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    const BODY: &str = r#"{"dishName":"Thali","calories":450,"macros":{"protein":12,"carbs":60,"fats":15}}"#;

    fn assert_extracts(wrapped: &str) {
        assert_eq!(clean_response(wrapped), BODY, "input: {wrapped:?}");
        let value: Value = decode_response(wrapped).unwrap();
        assert_eq!(value["dishName"], "Thali");
    }

    #[test]
    fn test_plain_json_is_unchanged() {
        assert_extracts(BODY);
    }

    #[test]
    fn test_json_fence() {
        assert_extracts(&format!("```json\n{BODY}\n```"));
    }

    #[test]
    fn test_json_fence_is_case_insensitive() {
        assert_extracts(&format!("```JSON\n{BODY}\n```"));
    }

    #[test]
    fn test_generic_fence() {
        assert_extracts(&format!("```\n{BODY}\n```"));
    }

    #[test]
    fn test_leading_and_trailing_prose() {
        assert_extracts(&format!("Here is your analysis: {BODY}"));
        assert_extracts(&format!("{BODY}\nLet me know if you need anything else."));
        assert_extracts(&format!("Sure!\n{BODY}\nEnjoy."));
    }

    #[test]
    fn test_fence_with_surrounding_prose() {
        assert_extracts(&format!(
            "Here is the JSON you asked for:\n```json\n{BODY}\n```\nHope this helps!"
        ));
        assert_extracts(&format!("Result:\n```\n  {BODY}  \n```\n"));
    }

    #[test]
    fn test_other_language_tag_falls_back_to_generic_fence() {
        assert_extracts(&format!("```javascript\n{BODY}\n```"));
    }

    #[test]
    fn test_unclosed_fence_still_finds_braces() {
        assert_extracts(&format!("```json\n{BODY}"));
    }

    #[test]
    fn test_single_fence_after_json_is_ignored() {
        assert_extracts(&format!("{BODY}\n```"));
    }

    #[test]
    fn test_whitespace_only_trim() {
        assert_extracts(&format!("\n\n   {BODY}\t\n"));
    }

    #[test]
    fn test_unparseable_keeps_raw_and_cleaned() {
        let raw = "I could not identify any food in this picture.";
        let error = decode_response::<Value>(raw).unwrap_err();
        match error {
            CoreError::UnparseableResponse {
                raw: kept_raw,
                cleaned,
                ..
            } => {
                assert_eq!(kept_raw, raw);
                assert_eq!(cleaned, raw);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_adjacent_fences_leave_text_untouched() {
        assert_eq!(clean_response("``````"), "``````");
        assert_eq!(clean_response("  ``````\n"), "``````");
    }

    #[test]
    fn test_truncated_json_is_unparseable() {
        let raw = "```json\n{\"dishName\": \"Thali\", \"calories\": \n```";
        let error = decode_response::<Value>(raw).unwrap_err();
        assert!(matches!(error, CoreError::UnparseableResponse { .. }));
    }
}
