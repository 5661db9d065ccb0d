//! Conversation tracking for phone calls
//!
//! A call is a sequence of webhook turns. Chris keeps one [`CallSession`]
//! per call SID recording which maintenance-request slots (problem, address)
//! are already filled, so no turn ever re-asks an answered question. The
//! [`turn`] module holds the reply ladder that drives each exchange.

pub mod address;
pub mod intents;
pub mod session;
pub mod turn;

pub use address::{AddressOutcome, PropertyDirectory};
pub use intents::{instant_reply, IssueCategory};
pub use session::{CallSession, CallSummary, ConversationTurn, SessionRegistry, SlotState, Speaker};
pub use turn::TurnReply;
