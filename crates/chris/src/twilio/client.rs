//! Administrative Twilio REST client
//!
//! The only write we ever make against the Twilio API: repoint the incoming
//! phone number's voice webhook at the current deployment. Everything else in
//! the integration is Twilio calling us.

use tracing::info;

use super::{TwilioConfig, TwilioError, TwilioResult};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

pub struct TwilioAdminClient {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioAdminClient {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Point the phone number's voice webhook at `voice_url`.
    pub async fn update_voice_url(&self, voice_url: &str) -> TwilioResult<()> {
        if !self.config.is_configured() {
            return Err(TwilioError::NotConfigured);
        }

        let url = format!(
            "{}/Accounts/{}/IncomingPhoneNumbers/{}.json",
            TWILIO_API_BASE, self.config.account_sid, self.config.phone_number_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("VoiceUrl", voice_url)])
            .send()
            .await?;

        if response.status().is_success() {
            info!("Twilio voice webhook updated to {}", voice_url);
            Ok(())
        } else {
            Err(TwilioError::WebhookUpdateFailed(response.status().as_u16()))
        }
    }
}
