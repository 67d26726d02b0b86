use crate::models::CheckinState;

/// Phrases that mark an answer as drifting attention ("zoning out",
/// "nothing in particular", "don't know", "somehow", "bored").
pub const WANDERING_KEYWORDS: &[&str] = &["ぼーっと", "特に", "わからない", "なんとなく", "暇"];

/// Infers a state from free text when the user did not pick one.
pub fn classify_response(response: &str) -> CheckinState {
    if WANDERING_KEYWORDS
        .iter()
        .any(|keyword| response.contains(keyword))
    {
        CheckinState::Wandering
    } else {
        CheckinState::Focused
    }
}
