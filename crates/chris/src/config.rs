//! Assistant configuration
//!
//! Everything comes from the environment (a `.env` file is loaded by the
//! server binary before this runs). Each external integration is optional;
//! without its credentials the assistant degrades to vendor `<Say>` voice,
//! the built-in address roster, and locally issued ticket numbers.

use std::path::PathBuf;

use crate::{rentman::RentManagerConfig, tts::ElevenLabsConfig, twilio::TwilioConfig};

/// Top-level configuration for the assistant
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Public HTTPS base URL of this deployment, used for `<Play>` audio
    /// URLs and the vendor webhook target
    pub public_base_url: String,
    /// Greeting spoken when a call connects
    pub greeting: String,
    /// Where the learned rule book is persisted
    pub rules_path: PathBuf,
    /// Twilio account credentials (webhook updater only)
    pub twilio: Option<TwilioConfig>,
    /// ElevenLabs synthesis credentials
    pub elevenlabs: Option<ElevenLabsConfig>,
    /// Rent-manager API credentials (property roster + ticket writes)
    pub rentman: Option<RentManagerConfig>,
}

fn default_greeting() -> String {
    "Hi there, you've reached Grinberg Management. I'm Chris, how can I help you today?"
        .to_string()
}

impl AssistantConfig {
    /// Build configuration from environment variables.
    pub fn from_env() -> Self {
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string())
            .trim_end_matches('/')
            .to_string();

        let greeting = std::env::var("GREETING_MESSAGE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(default_greeting);

        let rules_path = std::env::var("RULES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("chris_rules.json"));

        Self {
            public_base_url,
            greeting,
            rules_path,
            twilio: TwilioConfig::from_env(),
            elevenlabs: ElevenLabsConfig::from_env(),
            rentman: RentManagerConfig::from_env(),
        }
    }

    /// URL Twilio posts speech results to for a given call.
    pub fn speech_action(&self, call_sid: &str) -> String {
        format!("/handle-speech/{}", call_sid)
    }

    /// Public URL for a cached audio clip.
    pub fn audio_url(&self, audio_id: &str) -> String {
        format!("{}/audio/{}", self.public_base_url, audio_id)
    }

    /// Public URL of the incoming-call webhook.
    pub fn voice_webhook_url(&self) -> String {
        format!("{}/voice", self.public_base_url)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:5000".to_string(),
            greeting: default_greeting(),
            rules_path: PathBuf::from("chris_rules.json"),
            twilio: None,
            elevenlabs: None,
            rentman: None,
        }
    }
}
