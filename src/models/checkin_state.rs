use serde::{Deserialize, Deserializer, Serialize};

/// Self-reported attention state attached to every check-in.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CheckinState {
    Focused,
    Wandering,
    Resting,
}

impl Default for CheckinState {
    fn default() -> Self {
        CheckinState::Focused
    }
}

impl CheckinState {
    pub const ALL: [CheckinState; 3] = [
        CheckinState::Focused,
        CheckinState::Wandering,
        CheckinState::Resting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckinState::Focused => "focused",
            CheckinState::Wandering => "wandering",
            CheckinState::Resting => "resting",
        }
    }

    /// Normalizes a persisted token. Never fails: the legacy `"break"` token
    /// maps to `Resting`, anything missing or unrecognized maps to `Focused`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("focused") => CheckinState::Focused,
            Some("wandering") => CheckinState::Wandering,
            Some("resting") | Some("break") => CheckinState::Resting,
            _ => CheckinState::Focused,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckinState::Focused => "Focused",
            CheckinState::Wandering => "Wandering",
            CheckinState::Resting => "Resting",
        }
    }

    pub fn feedback_message(&self) -> &'static str {
        match self {
            CheckinState::Focused => "Nice! Keep going at this pace.",
            CheckinState::Wandering => {
                "Drifting a little. Decide what to do for just the next five minutes."
            }
            CheckinState::Resting => "Rest matters. Decide when you will come back.",
        }
    }
}

impl<'de> Deserialize<'de> for CheckinState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(CheckinState::from_raw(raw.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::CheckinState;

    #[test]
    fn from_raw_is_total() {
        assert_eq!(CheckinState::from_raw(Some("focused")), CheckinState::Focused);
        assert_eq!(CheckinState::from_raw(Some("wandering")), CheckinState::Wandering);
        assert_eq!(CheckinState::from_raw(Some("resting")), CheckinState::Resting);
        assert_eq!(CheckinState::from_raw(Some("break")), CheckinState::Resting);
        assert_eq!(CheckinState::from_raw(None), CheckinState::Focused);
        assert_eq!(CheckinState::from_raw(Some("garbage")), CheckinState::Focused);
        assert_eq!(CheckinState::from_raw(Some("")), CheckinState::Focused);
    }

    #[test]
    fn raw_values_survive_json() {
        for state in CheckinState::ALL {
            let json = serde_json::to_string(&state).expect("serialize");
            assert_eq!(json, format!("\"{}\"", state.as_str()));
            let back: CheckinState = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, state);
        }
    }

    #[test]
    fn legacy_and_null_tokens_deserialize() {
        let legacy: CheckinState = serde_json::from_str("\"break\"").expect("break");
        assert_eq!(legacy, CheckinState::Resting);
        let missing: CheckinState = serde_json::from_str("null").expect("null");
        assert_eq!(missing, CheckinState::Focused);
    }
}
