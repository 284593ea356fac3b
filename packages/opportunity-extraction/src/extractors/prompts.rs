//! Extraction prompts shared by every backend.

use tracing::warn;

use crate::fetchers::truncate_chars;

/// Name of the function OpenAI is forced to call.
pub const TOOL_NAME: &str = "extract_volunteer_opportunity";

/// Description attached to the forced function.
pub const TOOL_DESCRIPTION: &str = "Extracts volunteer opportunity details from the provided text.";

/// Standing instructions: one rule per field, then general rules.
pub const SYSTEM_PROMPT: &str = r#"You extract volunteer opportunity records for an aggregation directory. Read the webpage content and fill every field of the record schema.

Field rules:

1. organization_name: Full name of the organization running the opportunity. If unclear, the most prominent organization name on the page.
2. activity_type: What volunteers will do, in 3-10 specific words (e.g. "environmental cleanup and service projects", "distributing meals to the homeless"). Never a generic phrase like "volunteering opportunity".
3. location: The most relevant full street address, formatted "Street Address, City, State". No ZIP code, country or nearby landmarks. "N/A" if no location is given.
4. time_slot:
   - Prefer a structured weekday + time pattern using the codes Su M T W Th F Sa (e.g. "MWThFSa 9am-12pm").
   - "Fl" if the opportunity is drop-in or flexible.
   - Specific one-off dates go in extra, unless they form an unbroken recurring schedule; then use the weekday pattern.
5. slot_availability: Any of "individual drop-in welcome", "individual application required", "corporate group application required", "corporate group drop-in welcome". Leave out individual or corporate values when the opportunity is exclusive to the other. ["N/A"] if the page says nothing about sign-up.
6. contact_email: The single most relevant email. Prefer a labeled volunteer coordinator over a general inbox.
7. contact_number: The single most relevant phone number as digits only. Prefer a labeled volunteer coordinator. 0 if none.
8. extra: Corporate volunteering details, specific dates, requirements and any other important detail that fits no other field. "N/A" if there is nothing.
9. tags: 1-3 tags chosen by the organization's mission, not its location or logistics, only from: "environment", "food security", "education", "community", "healthcare", "animal welfare", "disaster relief", "homeless support", "advocacy".

General rules:
- Use "N/A" for any text field without reliable information.
- Merge scattered or inconsistent formatting into one clean value (e.g. several times into one sentence).
- Keep values human-readable. Do not copy navigation, headers or unrelated text.

Example record:
{
  "organization_name": "SoupMobile",
  "activity_type": "Feeding the homeless and needy children",
  "location": "2490 Coombs Street, Dallas, TX",
  "time_slot": "MWThFSa",
  "slot_availability": ["N/A"],
  "contact_email": "soup@dallas.com",
  "contact_number": 2142356987,
  "extra": "Corporate Phone Number: +1 214 696 6987, Corporate Volunteering only on Tuesday.",
  "tags": ["homeless support", "food security"]
}"#;

const USER_PROMPT: &str = r#"Extract the volunteer opportunity from this page.

Source URL: {url}

Webpage content:
---
{content}
---"#;

/// Format the per-page prompt, truncating content to `max_chars`.
pub fn format_user_prompt(url: &str, content: &str, max_chars: usize) -> String {
    let clipped = truncate_chars(content, max_chars);
    if clipped.len() < content.len() {
        warn!(
            url = %url,
            max_chars,
            original_chars = content.chars().count(),
            "page text truncated before extraction"
        );
    }

    USER_PROMPT
        .replace("{url}", url)
        .replace("{content}", clipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tag;

    #[test]
    fn test_system_prompt_lists_vocabulary() {
        for tag in Tag::ALL {
            assert!(SYSTEM_PROMPT.contains(&format!("\"{tag}\"")), "{tag} missing");
        }
        assert!(SYSTEM_PROMPT.contains("individual drop-in welcome"));
        assert!(SYSTEM_PROMPT.contains("corporate group application required"));
    }

    #[test]
    fn test_prompt_has_no_incentive_framing() {
        let lower = SYSTEM_PROMPT.to_lowercase();
        for phrase in ["$", "datacenter", "reward", "you will be free"] {
            assert!(!lower.contains(phrase), "found {phrase}");
        }
    }

    #[test]
    fn test_user_prompt_carries_url_and_content() {
        let prompt = format_user_prompt("https://soupmobile.org", "Serve meals Mondays", 100);
        assert!(prompt.contains("Source URL: https://soupmobile.org"));
        assert!(prompt.contains("---\nServe meals Mondays\n---"));
    }

    #[test]
    fn test_user_prompt_truncates() {
        let content = "x".repeat(50);
        let prompt = format_user_prompt("https://a.org", &content, 10);
        assert!(prompt.contains(&format!("---\n{}\n---", "x".repeat(10))));
        assert!(!prompt.contains(&"x".repeat(11)));
    }
}
