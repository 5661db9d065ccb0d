//! The assistant itself
//!
//! Owns every moving part (sessions, rules, synthesis, tickets, property
//! directory) and turns webhook payloads into TwiML. Webhook handlers never
//! error outward: whatever goes wrong, the vendor receives well-formed TwiML.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::AssistantConfig,
    dialogue::{turn, CallSession, PropertyDirectory, SessionRegistry},
    rentman::RentManagerClient,
    rules::{RuleBook, RuleError},
    tickets::TicketOffice,
    tts::{AudioCache, CachedAudio, ElevenLabsClient},
    twilio::{CallRequest, SpeechForm, StatusCallback, TwimlBuilder, VoicePayload},
};

/// Sessions idle longer than this are swept
pub const SESSION_MAX_IDLE_MINUTES: i64 = 30;
/// How often the sweep runs
pub const SESSION_SWEEP_SECONDS: u64 = 60;

const NO_INPUT_PROMPT: &str = "I didn't catch that. What can I help you with?";
const ERROR_PROMPT: &str = "I'm sorry, I had a technical issue. How can I help you?";

/// Snapshot returned by the health endpoint
#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    pub tts_configured: bool,
    pub twilio_configured: bool,
    pub rentman_configured: bool,
    pub active_calls: usize,
    pub rules: usize,
    pub instructions_seen: u64,
}

/// Result of the live synthesis connectivity probe
#[derive(Debug, Serialize)]
pub struct TtsProbe {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voices: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Assistant {
    config: AssistantConfig,
    sessions: SessionRegistry,
    rules: RuleBook,
    tts: Option<ElevenLabsClient>,
    audio: AudioCache,
    tickets: TicketOffice,
    directory: PropertyDirectory,
}

impl Assistant {
    pub fn new(config: AssistantConfig) -> Result<Self, RuleError> {
        let rentman = config
            .rentman
            .clone()
            .map(|cfg| Arc::new(RentManagerClient::new(cfg)));
        if rentman.is_none() {
            warn!("Rent-manager not configured; using built-in property roster");
        }

        let tts = config.elevenlabs.clone().map(ElevenLabsClient::new);
        if tts.is_none() {
            warn!("ElevenLabs not configured; callers will hear the vendor voice");
        }

        let rules = RuleBook::load(&config.rules_path)?;

        Ok(Self {
            sessions: SessionRegistry::new(),
            rules,
            tts,
            audio: AudioCache::new(),
            tickets: TicketOffice::new(rentman.clone()),
            directory: PropertyDirectory::new(rentman),
            config,
        })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Answer the incoming-call webhook with the greeting.
    pub async fn handle_incoming_call(&self, request: &CallRequest) -> String {
        let caller = request.from.as_deref().unwrap_or("unknown");
        info!("Incoming call {} from {}", request.call_sid, caller);

        self.sessions
            .begin_call(&request.call_sid, caller, &self.config.greeting)
            .await;

        let payload = self
            .voice_payload(&self.config.greeting, &request.call_sid)
            .await;
        TwimlBuilder::respond(&payload, &self.config.speech_action(&request.call_sid))
    }

    /// Answer a speech webhook: run the reply ladder and wrap the result.
    pub async fn handle_speech(&self, call_sid: &str, form: &SpeechForm) -> String {
        let speech_action = self.config.speech_action(call_sid);

        let Some(transcript) = form.transcript() else {
            let payload = self.voice_payload(NO_INPUT_PROMPT, call_sid).await;
            return TwimlBuilder::respond(&payload, &speech_action);
        };

        info!(
            "Call {}: '{}' (confidence: {:?})",
            call_sid, transcript, form.confidence
        );

        let caller = form.from.as_deref().unwrap_or("unknown");
        let reply = {
            let mut sessions = self.sessions.guard().await;
            let session = sessions
                .entry(call_sid.to_string())
                .or_insert_with(|| CallSession::new(call_sid, caller));
            session.record_caller(transcript, form.confidence);

            let reply = turn::next_reply(
                session,
                transcript,
                &self.rules,
                &self.directory,
                &self.tickets,
                chrono::Utc::now(),
            )
            .await;
            session.record_chris(&reply.text);
            reply
        };

        if reply.end_call {
            // Teardown first so the farewell clip outlives the sweep of the
            // call's earlier audio.
            self.teardown(call_sid).await;
            let payload = self.voice_payload(&reply.text, call_sid).await;
            TwimlBuilder::goodbye(&payload)
        } else {
            let payload = self.voice_payload(&reply.text, call_sid).await;
            TwimlBuilder::respond(&payload, &speech_action)
        }
    }

    /// Vendor status callback; terminal statuses tear the session down.
    pub async fn handle_status(&self, callback: &StatusCallback) {
        info!(
            "Call {} status: {} (duration: {:?}s)",
            callback.call_sid, callback.call_status, callback.call_duration
        );
        if callback.is_terminal() {
            self.teardown(&callback.call_sid).await;
        }
    }

    /// TwiML for the vendor's fallback webhook.
    pub fn handle_fallback(&self, call_sid: &str) -> String {
        warn!("Fallback webhook triggered for call {}", call_sid);
        TwimlBuilder::error_fallback(ERROR_PROMPT)
    }

    /// Fetch a cached audio clip for the `<Play>` route.
    pub async fn audio(&self, id: &str) -> Option<CachedAudio> {
        self.audio.get(id).await
    }

    pub async fn health(&self) -> HealthSnapshot {
        let stats = self.rules.stats().await;
        HealthSnapshot {
            tts_configured: self.tts.is_some(),
            twilio_configured: self.config.twilio.is_some(),
            rentman_configured: self.config.rentman.is_some(),
            active_calls: self.sessions.active_count().await,
            rules: stats.rules,
            instructions_seen: stats.instructions_seen,
        }
    }

    /// Live synthesis check: lists the account's voices, like dialing the
    /// vendor to hear a dial tone.
    pub async fn probe_tts(&self) -> TtsProbe {
        let Some(tts) = &self.tts else {
            return TtsProbe {
                configured: false,
                voices: None,
                error: None,
            };
        };

        match tts.list_voices().await {
            Ok(voices) => TtsProbe {
                configured: true,
                voices: Some(voices.len()),
                error: None,
            },
            Err(e) => TtsProbe {
                configured: true,
                voices: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Sweep stale sessions and expired audio. Run on an interval.
    pub async fn sweep(&self) {
        let removed = self.sessions.cleanup_stale(SESSION_MAX_IDLE_MINUTES).await;
        if removed > 0 {
            info!("Swept {} stale call sessions", removed);
        }
        self.audio.cleanup().await;
    }

    async fn teardown(&self, call_sid: &str) {
        self.sessions.remove(call_sid).await;
        self.audio.cleanup_call(call_sid).await;
    }

    /// Synthesize the reply, falling back to the vendor voice when synthesis
    /// is unavailable or fails.
    async fn voice_payload(&self, text: &str, call_sid: &str) -> VoicePayload {
        let Some(tts) = &self.tts else {
            return VoicePayload::Say(text.to_string());
        };

        match tts.synthesize(text).await {
            Ok(bytes) => {
                let id = self
                    .audio
                    .store(bytes, text, Some(call_sid.to_string()))
                    .await;
                VoicePayload::Play(self.config.audio_url(&id))
            }
            Err(e) => {
                warn!("Falling back to vendor voice: {}", e);
                VoicePayload::Say(text.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssistantConfig;

    fn assistant() -> (Assistant, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = AssistantConfig {
            rules_path: dir.path().join("rules.json"),
            ..Default::default()
        };
        (Assistant::new(config).unwrap(), dir)
    }

    fn call_request(call_sid: &str) -> CallRequest {
        CallRequest {
            call_sid: call_sid.to_string(),
            from: Some("+15550001111".to_string()),
            to: None,
            call_status: Some("ringing".to_string()),
        }
    }

    fn speech(text: &str) -> SpeechForm {
        SpeechForm {
            speech_result: Some(text.to_string()),
            confidence: Some(0.9),
            from: Some("+15550001111".to_string()),
        }
    }

    #[tokio::test]
    async fn greeting_twiml_says_and_gathers() {
        let (assistant, _dir) = assistant();
        let twiml = assistant.handle_incoming_call(&call_request("CA1")).await;

        assert!(twiml.contains("Grinberg Management"));
        assert!(twiml.contains("<Gather input=\"speech\""));
        assert!(twiml.contains("<Redirect>/handle-speech/CA1</Redirect>"));
        assert_eq!(assistant.sessions().active_count().await, 1);
    }

    #[tokio::test]
    async fn empty_speech_reprompts_without_mutating_state() {
        let (assistant, _dir) = assistant();
        assistant.handle_incoming_call(&call_request("CA1")).await;

        let twiml = assistant
            .handle_speech(
                "CA1",
                &SpeechForm {
                    speech_result: None,
                    confidence: None,
                    from: None,
                },
            )
            .await;
        assert!(twiml.contains("didn&apos;t catch that"));
        assert!(twiml.contains("<Gather"));
    }

    #[tokio::test]
    async fn goodbye_hangs_up_and_tears_down() {
        let (assistant, _dir) = assistant();
        assistant.handle_incoming_call(&call_request("CA1")).await;

        let twiml = assistant.handle_speech("CA1", &speech("goodbye")).await;
        assert!(twiml.contains("<Hangup/>"));
        assert_eq!(assistant.sessions().active_count().await, 0);
    }

    #[tokio::test]
    async fn terminal_status_removes_session() {
        let (assistant, _dir) = assistant();
        assistant.handle_incoming_call(&call_request("CA1")).await;

        assistant
            .handle_status(&StatusCallback {
                call_sid: "CA1".to_string(),
                call_status: "completed".to_string(),
                call_duration: Some(42),
            })
            .await;
        assert_eq!(assistant.sessions().active_count().await, 0);
    }

    #[tokio::test]
    async fn speech_for_unknown_call_creates_a_session() {
        let (assistant, _dir) = assistant();
        let twiml = assistant
            .handle_speech("CA9", &speech("I have a problem with my washing machine"))
            .await;
        assert!(twiml.contains("What&apos;s your address"));
        assert_eq!(assistant.sessions().active_count().await, 1);
    }
}
