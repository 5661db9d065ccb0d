//! The reply ladder for one speech turn
//!
//! Priority order: goodbye, existing ticket, slot capture and auto-ticket,
//! learned rules, instant responses, then the slot fallback that keeps the
//! maintenance flow moving. Filled slots are never re-asked.

use chrono::{DateTime, Utc};

use super::{
    address::{AddressOutcome, PropertyDirectory},
    intents::{self, categorize, contains_phrase, IssueCategory},
    session::CallSession,
};
use crate::{rules::RuleBook, tickets::TicketOffice};

/// Phrases that end the call
const GOODBYE_PHRASES: &[&str] = &["goodbye", "bye", "hang up", "end call", "that's all"];

const FAREWELL: &str = "Thanks for calling Grinberg Management. Have a great day!";
const ASK_ADDRESS: &str =
    "I'm sorry to hear that. What's your address so I can create a service ticket?";
const ASK_ADDRESS_AGAIN: &str = "Got it. What's your address so I can create the service ticket?";
const ASK_PROBLEM: &str = "Thanks! And what's the issue there, so I can create a service ticket?";

/// What the caller hears next, and whether the call should end
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub text: String,
    pub end_call: bool,
}

impl TurnReply {
    fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            end_call: false,
        }
    }

    fn farewell() -> Self {
        Self {
            text: FAREWELL.to_string(),
            end_call: true,
        }
    }
}

/// Produce the reply for one caller transcript.
///
/// The session has already recorded the transcript; this mutates only the
/// request slots and the ticket, both of which are set-once.
pub async fn next_reply(
    session: &mut CallSession,
    transcript: &str,
    rules: &RuleBook,
    directory: &PropertyDirectory,
    tickets: &TicketOffice,
    now: DateTime<Utc>,
) -> TurnReply {
    let lower = transcript.to_lowercase();

    if GOODBYE_PHRASES.iter().any(|p| contains_phrase(&lower, p)) {
        return TurnReply::farewell();
    }

    // A completed request is only ever re-confirmed, never re-collected.
    if let Some(ticket) = session.ticket() {
        return TurnReply::say(ticket.confirmation());
    }

    // Fill whatever slots this transcript carries.
    if session.problem().is_none() && categorize(transcript) != IssueCategory::General {
        session.set_problem(transcript);
    }
    let mut address_captured_now = false;
    if session.address().is_none() {
        match directory.capture(transcript).await {
            AddressOutcome::Verified(address) => {
                session.set_address(&address);
                address_captured_now = true;
            }
            AddressOutcome::Rejected(candidate) => {
                return TurnReply::say(format!(
                    "I'm sorry, but I couldn't find '{}' in our property system. Could you please double-check the address?",
                    candidate
                ));
            }
            AddressOutcome::None => {}
        }
    }

    // Both slots filled: file the ticket in this same turn.
    if session.problem().is_some() && session.address().is_some() {
        return file_ticket(session, tickets);
    }

    if let Some(reply) = rules.match_reply(transcript).await {
        return TurnReply::say(reply);
    }

    if let Some(hit) = intents::instant_reply(transcript, now) {
        // Issue-flavored phrases double as the problem description.
        if hit.issue.is_some() && session.problem().is_none() {
            session.set_problem(transcript);
        }
        return TurnReply::say(hit.reply);
    }

    // Slot fallback: keep the maintenance flow moving.
    if session.problem().is_none() {
        // An address-only transcript is not a problem description.
        if address_captured_now {
            return TurnReply::say(ASK_PROBLEM);
        }
        session.set_problem(transcript);
        if session.address().is_some() {
            return file_ticket(session, tickets);
        }
        return TurnReply::say(ASK_ADDRESS);
    }
    TurnReply::say(ASK_ADDRESS_AGAIN)
}

fn file_ticket(session: &mut CallSession, tickets: &TicketOffice) -> TurnReply {
    let (Some(problem), Some(address)) = (session.problem(), session.address()) else {
        return TurnReply::say(ASK_ADDRESS);
    };
    let category = categorize(problem);
    let ticket = tickets.issue(category, problem, address, &session.caller_number);
    let confirmation = ticket.confirmation();
    session.set_ticket(ticket);
    TurnReply::say(confirmation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::session::SlotState;

    struct Fixture {
        rules: RuleBook,
        directory: PropertyDirectory,
        tickets: TicketOffice,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        Fixture {
            rules: RuleBook::load(dir.path().join("rules.json")).unwrap(),
            directory: PropertyDirectory::new(None),
            tickets: TicketOffice::new(None),
            _dir: dir,
        }
    }

    async fn reply(fx: &Fixture, session: &mut CallSession, transcript: &str) -> TurnReply {
        session.record_caller(transcript, None);
        let reply = next_reply(
            session,
            transcript,
            &fx.rules,
            &fx.directory,
            &fx.tickets,
            Utc::now(),
        )
        .await;
        session.record_chris(&reply.text);
        reply
    }

    #[tokio::test]
    async fn washing_machine_flow_files_one_ticket() {
        let fx = fixture();
        let mut session = CallSession::new("CA1", "+15550001111");

        let first = reply(&fx, &mut session, "I have a problem with my washing machine").await;
        assert!(first.text.contains("What's your address"));
        assert_eq!(session.slot_state(), SlotState::AwaitingAddress);

        let second = reply(&fx, &mut session, "29 Port Richmond Avenue").await;
        assert!(second.text.contains("service ticket #SV-"));
        assert!(second.text.contains("29 Port Richmond Avenue"));
        assert_eq!(session.slot_state(), SlotState::ReadyForTicket);
        let number = session.ticket().unwrap().number.clone();

        // Follow-up never re-asks and re-confirms the same ticket.
        let third = reply(&fx, &mut session, "Yes that's correct").await;
        assert!(third.text.contains(&number));
        assert!(!third.text.contains("What's your address"));
        assert!(!third.end_call);
    }

    #[tokio::test]
    async fn issue_and_address_in_one_turn_files_immediately() {
        let fx = fixture();
        let mut session = CallSession::new("CA2", "+15550002222");

        let out = reply(
            &fx,
            &mut session,
            "There's no heat at 122 Targee Street",
        )
        .await;
        assert!(out.text.contains("service ticket #SV-"));
        assert!(out.text.contains("heating"));
        assert!(out.text.contains("122 Targee Street"));
    }

    #[tokio::test]
    async fn unverified_address_is_blocked_and_slot_stays_open() {
        let fx = fixture();
        let mut session = CallSession::new("CA3", "+15550003333");
        session.set_problem("no power");

        let out = reply(&fx, &mut session, "I'm at 999 Nowhere Street").await;
        assert!(out.text.contains("couldn't find"));
        assert_eq!(session.slot_state(), SlotState::AwaitingAddress);

        // The caller can still supply a real address afterwards.
        let out = reply(&fx, &mut session, "Sorry, it's 29 Port Richmond Avenue").await;
        assert!(out.text.contains("service ticket #SV-"));
    }

    #[tokio::test]
    async fn learned_rules_beat_instant_responses() {
        let fx = fixture();
        fx.rules
            .teach("when someone says hello respond with Welcome to the front desk!")
            .await
            .unwrap();
        let mut session = CallSession::new("CA4", "+15550004444");

        let out = reply(&fx, &mut session, "hello").await;
        assert_eq!(out.text, "Welcome to the front desk!");
    }

    #[tokio::test]
    async fn greetings_do_not_become_problem_descriptions() {
        let fx = fixture();
        let mut session = CallSession::new("CA5", "+15550005555");

        let out = reply(&fx, &mut session, "hello").await;
        assert!(out.text.contains("Chris"));
        assert_eq!(session.slot_state(), SlotState::AwaitingProblem);
    }

    #[tokio::test]
    async fn goodbye_ends_the_call() {
        let fx = fixture();
        let mut session = CallSession::new("CA6", "+15550006666");

        let out = reply(&fx, &mut session, "goodbye").await;
        assert!(out.end_call);

        // "maybe" must not read as "bye".
        let mut session = CallSession::new("CA7", "+15550007777");
        let out = reply(&fx, &mut session, "maybe the stove is broken").await;
        assert!(!out.end_call);
    }

    #[tokio::test]
    async fn address_first_flow_asks_for_the_problem_then_files() {
        let fx = fixture();
        let mut session = CallSession::new("CA9", "+15550009999");

        let out = reply(&fx, &mut session, "I'm calling about 31 Port Richmond Avenue").await;
        assert!(out.text.contains("what's the issue"));
        assert_eq!(session.address(), Some("31 Port Richmond Avenue"));
        assert_eq!(session.problem(), None);

        let out = reply(&fx, &mut session, "the ceiling is cracked and dripping").await;
        assert!(out.text.contains("service ticket #SV-"));
        assert!(out.text.contains("31 Port Richmond Avenue"));
    }

    #[tokio::test]
    async fn urgent_power_phrase_fills_problem_and_asks_address() {
        let fx = fixture();
        let mut session = CallSession::new("CA8", "+15550008888");

        let out = reply(&fx, &mut session, "I have no power").await;
        assert!(out.text.contains("What's your address"));
        assert_eq!(session.slot_state(), SlotState::AwaitingAddress);
    }
}
