//! Point the Twilio phone number's voice webhook at this deployment.
//!
//! Run after the public URL changes:
//!
//! ```text
//! PUBLIC_BASE_URL=https://frontdesk.example cargo run --bin update_webhook
//! ```

use chris::{AssistantConfig, TwilioAdminClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AssistantConfig::from_env();
    let Some(twilio) = config.twilio.clone() else {
        anyhow::bail!(
            "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_PHONE_NUMBER_SID must be set"
        );
    };

    let voice_url = config.voice_webhook_url();
    tracing::info!("Updating Twilio voice webhook to {}", voice_url);

    TwilioAdminClient::new(twilio)
        .update_voice_url(&voice_url)
        .await?;

    tracing::info!("Webhook URL updated successfully");
    Ok(())
}
