//! Built-in instant responses, issue categorization, and the office clock
//!
//! The instant table answers common phrases without any external calls.
//! Patterns are matched as whole phrases (word-boundary aware) against the
//! lower-cased transcript, first match wins, so more specific phrases sit
//! above their prefixes.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc, Weekday};
use serde::Serialize;

/// Maintenance issue categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Electrical,
    Plumbing,
    Heating,
    Appliance,
    Noise,
    General,
}

impl IssueCategory {
    /// Label used in ticket confirmations and the rent-manager payload.
    pub fn label(&self) -> &'static str {
        match self {
            IssueCategory::Electrical => "electrical",
            IssueCategory::Plumbing => "plumbing",
            IssueCategory::Heating => "heating",
            IssueCategory::Appliance => "appliance",
            IssueCategory::Noise => "noise complaint",
            IssueCategory::General => "maintenance",
        }
    }

    /// Emergencies get a high-priority ticket.
    pub fn is_urgent(&self) -> bool {
        matches!(
            self,
            IssueCategory::Electrical | IssueCategory::Plumbing | IssueCategory::Heating
        )
    }
}

/// Categorize a problem description by keyword.
pub fn categorize(text: &str) -> IssueCategory {
    let lower = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(&["electrical", "electricity", "power", "lights", "outlet"]) {
        IssueCategory::Electrical
    } else if has(&["water", "leak", "plumbing", "flooding", "drain", "toilet"]) {
        IssueCategory::Plumbing
    } else if has(&["heat", "heating", "hvac", "cold", "radiator"]) {
        IssueCategory::Heating
    } else if has(&["washing machine", "washer", "dryer", "dishwasher", "stove", "fridge", "refrigerator", "appliance", "gas"]) {
        IssueCategory::Appliance
    } else if has(&["noise", "loud", "neighbors"]) {
        IssueCategory::Noise
    } else {
        IssueCategory::General
    }
}

/// A hit in the instant-response table
#[derive(Debug, Clone)]
pub struct InstantMatch {
    pub reply: String,
    /// Set when the phrase itself names a maintenance issue, so the caller
    /// skips straight to the address question.
    pub issue: Option<IssueCategory>,
}

enum Instant {
    Text(&'static str),
    HoursNow,
    Issue(IssueCategory, &'static str),
}

/// Phrase table, first match wins. Specific phrases come before their
/// prefixes ("no power" above "power").
const INSTANT_RESPONSES: &[(&str, Instant)] = &[
    // Office hours
    ("are you open", Instant::HoursNow),
    ("open right now", Instant::HoursNow),
    (
        "what are your hours",
        Instant::Text("We're open Monday through Friday, 9 AM to 5 PM Eastern Time!"),
    ),
    (
        "hours",
        Instant::Text("Our office hours are Monday through Friday, 9 AM to 5 PM Eastern."),
    ),
    // Greetings
    (
        "hello",
        Instant::Text("Hi there! I'm Chris from Grinberg Management. How can I help you today?"),
    ),
    ("hi", Instant::Text("Hello! I'm Chris. What can I help you with?")),
    ("hey", Instant::Text("Hey there! I'm Chris. How can I assist you?")),
    // Service information
    (
        "what services",
        Instant::Text("I help with maintenance requests, office hours, and property questions. What do you need?"),
    ),
    (
        "what can you help with",
        Instant::Text("I can help with maintenance requests, office hours, and property questions. What's happening?"),
    ),
    (
        "maintenance",
        Instant::Text("I understand you need maintenance help. What's the issue and what's your address?"),
    ),
    // Common issues, straight to the address question
    (
        "no power",
        Instant::Issue(
            IssueCategory::Electrical,
            "That's an electrical emergency! What's your address so I can create an urgent service ticket?",
        ),
    ),
    (
        "don't have power",
        Instant::Issue(
            IssueCategory::Electrical,
            "That's urgent! What's your address so I can get this handled right away?",
        ),
    ),
    (
        "electrical",
        Instant::Issue(
            IssueCategory::Electrical,
            "I understand you have an electrical issue. What's your address so I can create a service ticket?",
        ),
    ),
    (
        "power",
        Instant::Issue(
            IssueCategory::Electrical,
            "I understand you're having power issues. What's your address?",
        ),
    ),
    // Thanks and confirmations
    ("thank you", Instant::Text("You're welcome! Anything else I can help with?")),
    ("thanks", Instant::Text("Happy to help! What else can I do for you?")),
    ("yes", Instant::Text("Great! What else can I help you with?")),
    ("okay", Instant::Text("Perfect! Anything else?")),
];

/// Whole-phrase containment: `phrase` occurs in `haystack` bounded by
/// non-alphanumeric characters (so "hi" never fires inside "washing").
pub(crate) fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let bytes = haystack.as_bytes();
    for (start, _) in haystack.match_indices(phrase) {
        let end = start + phrase.len();
        let left_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let right_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        if left_ok && right_ok {
            return true;
        }
    }
    false
}

/// Look up the transcript in the instant table.
pub fn instant_reply(transcript: &str, now: DateTime<Utc>) -> Option<InstantMatch> {
    let lower = transcript.to_lowercase();
    for (pattern, instant) in INSTANT_RESPONSES {
        if !contains_phrase(&lower, pattern) {
            continue;
        }
        return Some(match instant {
            Instant::Text(reply) => InstantMatch {
                reply: (*reply).to_string(),
                issue: None,
            },
            Instant::HoursNow => InstantMatch {
                reply: office_hours_reply(now),
                issue: None,
            },
            Instant::Issue(category, reply) => InstantMatch {
                reply: (*reply).to_string(),
                issue: Some(*category),
            },
        });
    }
    None
}

/// Office-hours answer based on the current US Eastern wall clock.
///
/// Business hours: Monday through Friday, 9 AM to 5 PM Eastern.
pub fn office_hours_reply(now: DateTime<Utc>) -> String {
    let eastern = now + Duration::hours(eastern_utc_offset_hours(now));
    let hour = eastern.hour();
    let is_business_day = !matches!(eastern.weekday(), Weekday::Sat | Weekday::Sun);
    let is_business_hours = (9..17).contains(&hour);

    if is_business_day && is_business_hours {
        "Yes, we're open right now! Our office hours are Monday through Friday, 9 AM to 5 PM Eastern. How can I help you?".to_string()
    } else if is_business_day && hour < 9 {
        "We're closed right now but open at 9 AM this morning! Our office hours are Monday through Friday, 9 AM to 5 PM Eastern. What can I help you with?".to_string()
    } else if is_business_day {
        "We're closed for the day, but open tomorrow at 9 AM! Our office hours are Monday through Friday, 9 AM to 5 PM Eastern. How can I assist you?".to_string()
    } else {
        "We're closed for the weekend, but open Monday at 9 AM! Our office hours are Monday through Friday, 9 AM to 5 PM Eastern. What can I help you with?".to_string()
    }
}

/// UTC offset of US Eastern at `now`: -4 during daylight saving, else -5.
///
/// DST runs from the second Sunday of March (2:00 EST = 07:00 UTC) to the
/// first Sunday of November (2:00 EDT = 06:00 UTC). No timezone crate
/// anywhere in this stack, so the two boundary instants are computed
/// directly.
fn eastern_utc_offset_hours(now: DateTime<Utc>) -> i64 {
    let year = now.year();
    let dst_start = nth_sunday(year, 3, 2)
        .and_hms_opt(7, 0, 0)
        .expect("valid hour")
        .and_utc();
    let dst_end = nth_sunday(year, 11, 1)
        .and_hms_opt(6, 0, 0)
        .expect("valid hour")
        .and_utc();

    if now >= dst_start && now < dst_end {
        -4
    } else {
        -5
    }
}

fn nth_sunday(year: i32, month: u32, nth: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month start");
    let days_to_sunday = (7 - first.weekday().num_days_from_sunday()) % 7;
    first + Duration::days(days_to_sunday as i64 + 7 * (nth as i64 - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn greeting_matches_on_word_boundaries_only() {
        let now = utc(2025, 6, 11, 15, 0);
        assert!(instant_reply("hi", now).is_some());
        assert!(instant_reply("Hello Chris", now).is_some());
        // "washing" contains "hi" but must not greet.
        assert!(instant_reply("I have a problem with my washing machine", now).is_none());
    }

    #[test]
    fn specific_power_phrases_win_over_plain_power() {
        let now = utc(2025, 6, 11, 15, 0);
        let hit = instant_reply("I have no power in my apartment", now).unwrap();
        assert!(hit.reply.contains("emergency"));
        assert_eq!(hit.issue, Some(IssueCategory::Electrical));

        let hit = instant_reply("the power keeps flickering", now).unwrap();
        assert!(hit.reply.contains("power issues"));
    }

    #[test]
    fn categorize_keyword_sets() {
        assert_eq!(categorize("the outlet sparked"), IssueCategory::Electrical);
        assert_eq!(categorize("water leak under the sink"), IssueCategory::Plumbing);
        assert_eq!(categorize("no heat since last night"), IssueCategory::Heating);
        assert_eq!(
            categorize("problem with my washing machine"),
            IssueCategory::Appliance
        );
        assert_eq!(categorize("the neighbors are loud"), IssueCategory::Noise);
        assert_eq!(categorize("broken front door"), IssueCategory::General);
    }

    #[test]
    fn urgent_categories() {
        assert!(IssueCategory::Electrical.is_urgent());
        assert!(IssueCategory::Plumbing.is_urgent());
        assert!(!IssueCategory::Noise.is_urgent());
    }

    #[test]
    fn office_open_midweek_afternoon() {
        // Wednesday 2025-06-11 15:00 UTC = 11:00 EDT
        let reply = office_hours_reply(utc(2025, 6, 11, 15, 0));
        assert!(reply.starts_with("Yes, we're open right now!"));
    }

    #[test]
    fn office_closed_early_morning_and_evening() {
        // Wednesday 11:00 UTC = 07:00 EDT
        let reply = office_hours_reply(utc(2025, 6, 11, 11, 0));
        assert!(reply.contains("open at 9 AM this morning"));

        // Wednesday 22:00 UTC = 18:00 EDT
        let reply = office_hours_reply(utc(2025, 6, 11, 22, 0));
        assert!(reply.contains("open tomorrow at 9 AM"));
    }

    #[test]
    fn office_closed_on_weekends() {
        // Saturday 2025-06-14 15:00 UTC
        let reply = office_hours_reply(utc(2025, 6, 14, 15, 0));
        assert!(reply.contains("closed for the weekend"));
    }

    #[test]
    fn dst_boundaries_2025() {
        // 2025: DST starts Mar 9, ends Nov 2.
        assert_eq!(eastern_utc_offset_hours(utc(2025, 3, 9, 6, 59)), -5);
        assert_eq!(eastern_utc_offset_hours(utc(2025, 3, 9, 7, 0)), -4);
        assert_eq!(eastern_utc_offset_hours(utc(2025, 11, 2, 5, 59)), -4);
        assert_eq!(eastern_utc_offset_hours(utc(2025, 11, 2, 6, 0)), -5);
    }

    #[test]
    fn winter_uses_standard_time() {
        // Friday 2025-01-10 15:00 UTC = 10:00 EST -> open
        let reply = office_hours_reply(utc(2025, 1, 10, 15, 0));
        assert!(reply.starts_with("Yes, we're open right now!"));
        // 13:30 UTC = 08:30 EST -> not open yet
        let reply = office_hours_reply(utc(2025, 1, 10, 13, 30));
        assert!(reply.contains("open at 9 AM this morning"));
    }
}
