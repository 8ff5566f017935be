//! Static fallback idea
//!
//! Built from a bundled template when no provider produced a payload.
//! It has no external dependency and cannot fail.

use chrono::{DateTime, Utc};

use crate::model::{IdeaPayload, ResearchRequest};
use crate::normalize::idea_id;

const TEMPLATE: &str = include_str!("../templates/fallback_idea.txt");

/// Phrase every fallback thesis carries
pub const FALLBACK_PHRASE: &str = "Buy 0.1 SOL";
pub const FALLBACK_ID_PREFIX: &str = "FALLBACK";
pub const FALLBACK_ASSET: &str = "SOL";
pub const FALLBACK_TTL_MINUTES: u32 = 90;
pub const FALLBACK_CATALYST: &str = "Fallback/Manual";
pub const FALLBACK_ENTRY_RULE: &str = "Market BUY, size according to budget";
pub const FALLBACK_EXIT_RULE: &str = "Time exit after 60 minutes or +2% profit; stop -1.5%";

const FALLBACK_TEXT: &str = "Buy 0.1 SOL within the next 10 minutes; time exit after 60 minutes.";

/// Append the fallback phrase unless the text already has it
pub fn ensure_phrase(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        FALLBACK_TEXT.to_string()
    } else if text.contains(FALLBACK_PHRASE) {
        text.to_string()
    } else {
        format!("{} | {}", text, FALLBACK_PHRASE)
    }
}

/// Thesis text of the bundled template
pub fn template_thesis() -> String {
    ensure_phrase(TEMPLATE)
}

/// Deterministic idea echoing the request's risk and budget
pub fn static_idea(request: &ResearchRequest, now: DateTime<Utc>) -> IdeaPayload {
    IdeaPayload {
        idea_id: idea_id(FALLBACK_ID_PREFIX, now),
        asset: FALLBACK_ASSET.to_string(),
        thesis: template_thesis(),
        entry_rule: FALLBACK_ENTRY_RULE.to_string(),
        exit_rule: FALLBACK_EXIT_RULE.to_string(),
        risk: request.risk,
        budget: request.budget,
        ttl_minutes: FALLBACK_TTL_MINUTES,
        expected_catalyst: Some(FALLBACK_CATALYST.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProviderPreference;
    use chrono::TimeZone;

    fn request() -> ResearchRequest {
        ResearchRequest {
            risk: 4,
            budget: 0.25,
            universe: vec!["JUP".to_string()],
            constraints: "Spot only".to_string(),
            provider: ProviderPreference::Auto,
        }
    }

    #[test]
    fn test_static_idea_is_deterministic() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let first = static_idea(&request(), now);
        let second = static_idea(&request(), now);

        assert_eq!(first, second);
        assert_eq!(first.idea_id, "FALLBACK20260314092653");
        assert_eq!(first.risk, 4);
        assert_eq!(first.budget, 0.25);
        assert_eq!(first.ttl_minutes, 90);
        assert_eq!(first.expected_catalyst.as_deref(), Some(FALLBACK_CATALYST));
        assert!(first.thesis.contains(FALLBACK_PHRASE));
    }

    #[test]
    fn test_ensure_phrase() {
        assert_eq!(ensure_phrase("Buy 0.1 SOL now"), "Buy 0.1 SOL now");
        assert_eq!(ensure_phrase("Wait for dip"), "Wait for dip | Buy 0.1 SOL");
        assert!(ensure_phrase("   ").contains(FALLBACK_PHRASE));
    }
}
