//! Speech synthesis via ElevenLabs
//!
//! Twilio plays audio by fetching a URL, so synthesized clips go through the
//! in-memory [`AudioCache`] and are served back by the audio route. When
//! synthesis is unavailable the caller falls back to the vendor voice.

pub mod cache;

pub use cache::{AudioCache, CachedAudio};
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
/// Voice used for Chris
const DEFAULT_VOICE_ID: &str = "f218e5pATi8cBqEEIGBU";
/// Fastest model, tuned for real-time phone turns
const MODEL_ID: &str = "eleven_turbo_v2_5";
/// Synthesis must not stall the webhook response
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub voice_id: String,
    pub base_url: String,
}

impl ElevenLabsConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY")
            .ok()
            .map(|k| k.trim().trim_matches('"').to_string())
            .filter(|k| !k.is_empty())?;

        let voice_id = std::env::var("ELEVENLABS_VOICE_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string());

        let base_url = std::env::var("ELEVENLABS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Some(Self {
            api_key,
            voice_id,
            base_url,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("synthesis rejected with status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub struct ElevenLabsClient {
    config: ElevenLabsConfig,
    client: reqwest::Client,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// Synthesize `text` to MP3 bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        let url = format!(
            "{}/text-to-speech/{}",
            self.config.base_url, self.config.voice_id
        );

        let body = json!({
            "text": text,
            "model_id": MODEL_ID,
            "voice_settings": {
                "stability": 0.75,
                "similarity_boost": 0.85,
                "style": 0.25,
                "use_speaker_boost": true,
            },
        });

        let response = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!("ElevenLabs synthesis failed for '{}': status {}", preview(text), status);
            return Err(TtsError::Status(status));
        }

        let bytes = response.bytes().await?;
        info!(
            "Synthesized {} bytes of audio for '{}'",
            bytes.len(),
            preview(text)
        );
        Ok(bytes.to_vec())
    }

    /// Names of the voices available to this account, used by the health
    /// probe.
    pub async fn list_voices(&self) -> Result<Vec<String>, TtsError> {
        let url = format!("{}/voices", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .header("xi-api-key", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TtsError::Status(response.status().as_u16()));
        }

        let payload: serde_json::Value = response.json().await?;
        let names = payload["voices"]
            .as_array()
            .map(|voices| {
                voices
                    .iter()
                    .filter_map(|v| v["name"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }
}

fn preview(text: &str) -> &str {
    let end = text
        .char_indices()
        .take(50)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &text[..end]
}
