//! # Chris - Phone Front-Desk Assistant
//!
//! Assistant core for a property-management phone line. Callers reach a
//! Twilio-compatible number; each webhook turn is answered with TwiML that
//! plays ElevenLabs audio (or falls back to the vendor voice) and gathers the
//! next utterance. Chris tracks which slots of a maintenance request have
//! already been collected so callers are never asked the same question twice,
//! and files a service ticket the moment the request is complete.

pub mod assistant;
pub mod config;
pub mod dialogue;
pub mod rentman;
pub mod rules;
pub mod tickets;
pub mod tts;
pub mod twilio;

pub use assistant::{Assistant, HealthSnapshot, TtsProbe};
pub use config::AssistantConfig;
pub use dialogue::{CallSession, CallSummary, SessionRegistry, SlotState, Speaker, TurnReply};
pub use rules::{LearnedRule, RuleBook, RuleError, RuleStats};
pub use tickets::{Ticket, TicketOffice};
pub use tts::{AudioCache, CachedAudio, ElevenLabsClient, ElevenLabsConfig, TtsError};
pub use twilio::{
    CallRequest, SpeechForm, StatusCallback, TwilioAdminClient, TwilioConfig, TwilioError,
    TwimlBuilder, VoicePayload,
};
