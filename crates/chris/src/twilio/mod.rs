//! Twilio phone integration
//!
//! Webhook payload types for inbound calls and speech results, the TwiML
//! builder used to answer them, and the administrative REST client that
//! points the phone number at this deployment.

pub mod client;
pub mod twiml;

pub use client::TwilioAdminClient;
use serde::Deserialize;
pub use twiml::{TwimlBuilder, VoicePayload};

/// Configuration for the Twilio account behind the phone line
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    /// Twilio Account SID
    pub account_sid: String,
    /// Twilio Auth Token
    pub auth_token: String,
    /// SID of the incoming phone number whose voice webhook we manage
    pub phone_number_sid: String,
}

impl TwilioConfig {
    /// Create config from environment variables.
    ///
    /// Returns `None` when the account is not configured; the assistant still
    /// answers webhooks without it (only the webhook updater needs it).
    pub fn from_env() -> Option<Self> {
        let account_sid = std::env::var("TWILIO_ACCOUNT_SID").ok()?;
        let auth_token = std::env::var("TWILIO_AUTH_TOKEN").ok()?;
        let phone_number_sid = std::env::var("TWILIO_PHONE_NUMBER_SID").ok()?;

        Some(Self {
            account_sid,
            auth_token,
            phone_number_sid,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty()
            && !self.auth_token.is_empty()
            && !self.phone_number_sid.is_empty()
    }
}

/// Webhook form posted by Twilio when a call comes in
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallRequest {
    /// Unique identifier for the call
    pub call_sid: String,
    /// The phone number that initiated the call
    #[serde(default)]
    pub from: Option<String>,
    /// The phone number that was called
    #[serde(default)]
    pub to: Option<String>,
    /// Call status at webhook time
    #[serde(default)]
    pub call_status: Option<String>,
}

/// Webhook form posted by Twilio after the caller speaks
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpeechForm {
    /// The transcribed speech, absent when nothing was recognized
    #[serde(default)]
    pub speech_result: Option<String>,
    /// Recognition confidence (0.0 to 1.0)
    #[serde(default)]
    pub confidence: Option<f64>,
    /// The caller's phone number
    #[serde(default)]
    pub from: Option<String>,
}

impl SpeechForm {
    /// The transcript, trimmed, or `None` when nothing usable was heard.
    pub fn transcript(&self) -> Option<&str> {
        self.speech_result
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Call status callback form
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusCallback {
    pub call_sid: String,
    pub call_status: String,
    #[serde(default)]
    pub call_duration: Option<u32>,
}

impl StatusCallback {
    /// Statuses after which Twilio will send no further webhooks for the call.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.call_status.as_str(),
            "completed" | "failed" | "busy" | "no-answer" | "canceled"
        )
    }
}

/// Twilio error types
#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    #[error("Twilio not configured")]
    NotConfigured,

    #[error("Call not found: {0}")]
    CallNotFound(String),

    #[error("Webhook update rejected: status {0}")]
    WebhookUpdateFailed(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type TwilioResult<T> = Result<T, TwilioError>;
