//! JSON parsing helpers for narrative backend responses
//!
//! Models often wrap the JSON payload in prose or code fences, so the payload
//! is located by its outermost brackets before parsing.

use crate::error::{Error, Result};

use super::types::InsightResponse;

/// Longest slice of a raw response quoted in error messages
const RAW_PREVIEW_CHARS: usize = 200;

/// Extract insight strings from a model response
///
/// Accepts `{"insights": [...]}` or a bare JSON array of strings. Blank
/// entries are dropped and at most `max` are kept.
pub fn parse_insights(response: &str, max: usize) -> Result<Vec<String>> {
    let response = response.trim();

    let insights = json_slice(response, '{', '}')
        .and_then(|s| serde_json::from_str::<InsightResponse>(s).ok())
        .map(|r| r.insights)
        .or_else(|| {
            json_slice(response, '[', ']')
                .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
        })
        .ok_or_else(|| {
            Error::InvalidData(format!(
                "No insights JSON found in AI response | Raw: {}",
                preview(response)
            ))
        })?;

    Ok(insights
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(max)
        .collect())
}

/// Slice from the first `open` to the last `close`, if well ordered
fn json_slice(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (start < end).then(|| &text[start..=end])
}

fn preview(text: &str) -> String {
    if text.chars().count() > RAW_PREVIEW_CHARS {
        let cut: String = text.chars().take(RAW_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object() {
        let response = r#"{"insights": ["Incidents are rising.", "Two spikes in March."]}"#;
        let insights = parse_insights(response, 5).unwrap();
        assert_eq!(
            insights,
            vec!["Incidents are rising.", "Two spikes in March."]
        );
    }

    #[test]
    fn test_parse_with_surrounding_text() {
        let response = "Sure! Here you go:\n```json\n{\"insights\": [\"Stable risk profile.\"]}\n```";
        let insights = parse_insights(response, 5).unwrap();
        assert_eq!(insights, vec!["Stable risk profile."]);
    }

    #[test]
    fn test_parse_bare_array() {
        let response = r#"["One", "  ", "Two"]"#;
        let insights = parse_insights(response, 5).unwrap();
        assert_eq!(insights, vec!["One", "Two"]);
    }

    #[test]
    fn test_respects_max() {
        let response = r#"{"insights": ["a", "b", "c", "d"]}"#;
        assert_eq!(parse_insights(response, 2).unwrap(), vec!["a", "b"]);
        assert!(parse_insights(response, 0).unwrap().is_empty());
    }

    #[test]
    fn test_no_json() {
        let err = parse_insights("I cannot help with that.", 5).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert!(err.to_string().contains("I cannot help"));
    }

    #[test]
    fn test_long_raw_response_truncated_on_char_boundary() {
        let response = "é".repeat(500);
        let err = parse_insights(&response, 5).unwrap_err();
        assert!(err.to_string().ends_with("..."));
    }
}
