//! Line decoders for every on-disk format the check-in log has used.
//!
//! Structured decoders are tried in priority order on each line. The legacy
//! block decoder only runs over a file in which no line decoded as JSON.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{CheckinState, LogEntry};

pub type LineDecoder = fn(&str) -> Option<LogEntry>;

/// Structured decoders, highest priority first.
pub const LINE_DECODERS: &[LineDecoder] = &[decode_json_with_state, decode_json_without_state];

const LEGACY_RESPONSE_MARKER: &str = "→ ";
const LEGACY_WANDERING_MARKER: &str = "😴";

static LEGACY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<prefix>.*?)(?P<time>\d{2}:\d{2}) - (?P<question>.*)$")
        .expect("legacy header pattern is valid")
});

#[derive(Deserialize)]
struct StatefulLine {
    time: String,
    response: String,
    #[serde(rename = "type")]
    kind: Value,
    #[serde(default)]
    question: Option<String>,
}

#[derive(Deserialize)]
struct StatelessLine {
    time: String,
    response: String,
    #[serde(default)]
    question: Option<String>,
}

/// `{"time", "response", "type"}`; `type` may be any value and is normalized.
pub fn decode_json_with_state(line: &str) -> Option<LogEntry> {
    let parsed: StatefulLine = serde_json::from_str(line).ok()?;
    Some(LogEntry {
        time: parsed.time,
        response: parsed.response,
        state: CheckinState::from_raw(parsed.kind.as_str()),
        question: parsed.question,
    })
}

/// `{"time", "response"}` written before states existed.
pub fn decode_json_without_state(line: &str) -> Option<LogEntry> {
    let parsed: StatelessLine = serde_json::from_str(line).ok()?;
    Some(LogEntry {
        time: parsed.time,
        response: parsed.response,
        state: CheckinState::from_raw(None),
        question: parsed.question,
    })
}

pub fn decode_structured_line(line: &str) -> Option<LogEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    LINE_DECODERS.iter().find_map(|decode| decode(line))
}

/// Two-line plain-text blocks:
///
/// ```text
/// ✨ 09:00 - What are you doing right now?
///    → writing the release notes
/// ```
pub fn decode_legacy_text(text: &str) -> Vec<LogEntry> {
    let mut entries = Vec::new();
    let mut header: Option<(String, String, CheckinState)> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(response) = line.strip_prefix(LEGACY_RESPONSE_MARKER) {
            if let Some((time, question, state)) = header.take() {
                entries.push(LogEntry {
                    time,
                    response: response.trim().to_string(),
                    state,
                    question: Some(question),
                });
            }
            continue;
        }

        // A header without a response line is dropped when the next one starts.
        header = parse_legacy_header(line);
    }

    entries
}

fn parse_legacy_header(line: &str) -> Option<(String, String, CheckinState)> {
    let captures = LEGACY_HEADER.captures(line)?;
    let state = if captures["prefix"].contains(LEGACY_WANDERING_MARKER) {
        CheckinState::Wandering
    } else {
        CheckinState::Focused
    };
    Some((
        captures["time"].to_string(),
        captures["question"].trim().to_string(),
        state,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stateful_line_wins_over_stateless() {
        let entry = decode_structured_line(r#"{"time":"10:15","response":"reading","type":"wandering"}"#)
            .expect("decoded");
        assert_eq!(entry.state, CheckinState::Wandering);
        assert_eq!(entry.time, "10:15");
        assert_eq!(entry.response, "reading");
    }

    #[test]
    fn legacy_break_token_is_resting() {
        let entry = decode_json_with_state(r#"{"time":"12:00","response":"lunch","type":"break"}"#)
            .expect("decoded");
        assert_eq!(entry.state, CheckinState::Resting);
    }

    #[test]
    fn non_string_type_normalizes_to_focused() {
        let entry = decode_structured_line(r#"{"time":"12:00","response":"x","type":7}"#)
            .expect("decoded");
        assert_eq!(entry.state, CheckinState::Focused);
    }

    #[test]
    fn stateless_line_defaults_to_focused() {
        assert!(decode_json_with_state(r#"{"time":"08:30","response":"coffee"}"#).is_none());
        let entry = decode_structured_line(r#"{"time":"08:30","response":"coffee"}"#)
            .expect("decoded");
        assert_eq!(entry.state, CheckinState::Focused);
    }

    #[test]
    fn garbage_and_blank_lines_are_rejected() {
        assert!(decode_structured_line("").is_none());
        assert!(decode_structured_line("   ").is_none());
        assert!(decode_structured_line("{\"time\":").is_none());
        assert!(decode_structured_line(r#"{"response":"no time"}"#).is_none());
        assert!(decode_structured_line("✨ 09:00 - question").is_none());
    }

    #[test]
    fn legacy_blocks_decode_in_order() {
        let text = "✨ 09:00 - What are you doing right now?\n   → writing docs\n\n\
                    😴 09:40 - Are you zoning out?\n   → scrolling\n\n";
        let entries = decode_legacy_text(text);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].time, "09:00");
        assert_eq!(entries[0].response, "writing docs");
        assert_eq!(entries[0].state, CheckinState::Focused);
        assert_eq!(
            entries[0].question.as_deref(),
            Some("What are you doing right now?")
        );

        assert_eq!(entries[1].time, "09:40");
        assert_eq!(entries[1].state, CheckinState::Wandering);
    }

    #[test]
    fn legacy_header_without_response_is_skipped() {
        let text = "✨ 09:00 - first\n✨ 09:05 - second\n   → answered\n→ orphan\n";
        let entries = decode_legacy_text(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].time, "09:05");
        assert_eq!(entries[0].response, "answered");
    }

    #[test]
    fn legacy_question_may_contain_separator() {
        let entries = decode_legacy_text("✨ 11:11 - A - B?\n   → yes\n");
        assert_eq!(entries[0].question.as_deref(), Some("A - B?"));
    }
}
