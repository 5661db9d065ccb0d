//! TwiML (Twilio Markup Language) builder for voice responses
//!
//! Creates the XML documents Twilio uses to drive a phone call: play or say
//! something, gather the caller's next utterance, redirect back to the speech
//! webhook so the conversation keeps looping.

use std::fmt::Write;

/// Gather timeout in seconds while waiting for the caller to start speaking
const GATHER_TIMEOUT: u32 = 8;
/// Seconds of silence that end an utterance
const SPEECH_TIMEOUT: u32 = 4;
/// Vendor TTS voice used when no synthesized audio is available
pub const FALLBACK_VOICE: &str = "Polly.Matthew-Neural";

/// What the caller hears: cached synthesized audio, or vendor TTS text.
#[derive(Debug, Clone, PartialEq)]
pub enum VoicePayload {
    /// `<Play>` a URL of pre-generated audio
    Play(String),
    /// `<Say>` text with the fallback vendor voice
    Say(String),
}

/// Builder for TwiML responses
#[derive(Debug, Clone, Default)]
pub struct TwimlBuilder {
    elements: Vec<TwimlElement>,
}

#[derive(Debug, Clone)]
enum TwimlElement {
    Say { text: String, voice: String },
    Play { url: String },
    Gather { timeout: u32, speech_timeout: u32 },
    Redirect { url: String },
    Pause { length: u32 },
    Hangup,
}

impl TwimlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a Say element (vendor text-to-speech)
    pub fn say(mut self, text: &str) -> Self {
        self.elements.push(TwimlElement::Say {
            text: xml_escape(text),
            voice: FALLBACK_VOICE.to_string(),
        });
        self
    }

    /// Add a Play element for pre-generated audio
    pub fn play(mut self, url: &str) -> Self {
        self.elements.push(TwimlElement::Play {
            url: xml_escape(url),
        });
        self
    }

    /// Add whichever voice payload the synthesis layer produced
    pub fn voice(self, payload: &VoicePayload) -> Self {
        match payload {
            VoicePayload::Play(url) => self.play(url),
            VoicePayload::Say(text) => self.say(text),
        }
    }

    /// Add an empty speech Gather with the standard call timings
    pub fn gather_speech(mut self) -> Self {
        self.elements.push(TwimlElement::Gather {
            timeout: GATHER_TIMEOUT,
            speech_timeout: SPEECH_TIMEOUT,
        });
        self
    }

    /// Add a Redirect element
    pub fn redirect(mut self, url: &str) -> Self {
        self.elements.push(TwimlElement::Redirect {
            url: xml_escape(url),
        });
        self
    }

    /// Add a Pause element
    pub fn pause(mut self, seconds: u32) -> Self {
        self.elements.push(TwimlElement::Pause { length: seconds });
        self
    }

    /// Add a Hangup element
    pub fn hangup(mut self) -> Self {
        self.elements.push(TwimlElement::Hangup);
        self
    }

    /// Build the TwiML XML string
    pub fn build(self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n");
        for element in self.elements {
            render_element(&mut xml, &element);
        }
        xml.push_str("</Response>");
        xml
    }

    /// Speak, listen, and loop back to the speech webhook.
    ///
    /// The Gather is deliberately empty: the prompt plays before it so the
    /// caller can barge in, and the trailing Redirect re-arms recognition
    /// when the Gather times out without input.
    pub fn respond(payload: &VoicePayload, speech_action: &str) -> String {
        TwimlBuilder::new()
            .voice(payload)
            .gather_speech()
            .redirect(speech_action)
            .build()
    }

    /// Final farewell: speak, then hang up.
    pub fn goodbye(payload: &VoicePayload) -> String {
        TwimlBuilder::new().voice(payload).pause(1).hangup().build()
    }

    /// Degraded response when something went wrong server-side.
    pub fn error_fallback(text: &str) -> String {
        TwimlBuilder::new().say(text).gather_speech().build()
    }
}

fn render_element(xml: &mut String, element: &TwimlElement) {
    match element {
        TwimlElement::Say { text, voice } => {
            let _ = writeln!(xml, "  <Say voice=\"{}\">{}</Say>", voice, text);
        }
        TwimlElement::Play { url } => {
            let _ = writeln!(xml, "  <Play>{}</Play>", url);
        }
        TwimlElement::Gather {
            timeout,
            speech_timeout,
        } => {
            let _ = writeln!(
                xml,
                "  <Gather input=\"speech\" timeout=\"{}\" speechTimeout=\"{}\"/>",
                timeout, speech_timeout
            );
        }
        TwimlElement::Redirect { url } => {
            let _ = writeln!(xml, "  <Redirect>{}</Redirect>", url);
        }
        TwimlElement::Pause { length } => {
            let _ = writeln!(xml, "  <Pause length=\"{}\"/>", length);
        }
        TwimlElement::Hangup => {
            let _ = writeln!(xml, "  <Hangup/>");
        }
    }
}

/// Escape special XML characters
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
