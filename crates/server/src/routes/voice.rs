//! Telephony webhook routes
//!
//! Twilio drives the conversation by POSTing here; every handler answers
//! with TwiML and a 200, whatever happens, so the caller never hears a raw
//! application error.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Form, Router,
};
use tracing::info;

use chris::{CallRequest, SpeechForm, StatusCallback};

use crate::{error::ApiError, AppState};

const XML_CONTENT_TYPE: [(&str, &str); 1] = [("Content-Type", "application/xml")];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/voice", post(handle_incoming_call))
        .route("/handle-speech/{call_sid}", post(handle_speech))
        .route("/twilio/status", post(handle_status_callback))
        .route("/twilio/fallback", post(handle_fallback))
        .route("/audio/{id}", get(serve_audio))
}

/// Handle incoming call webhook
///
/// POST /voice
///
/// Twilio calls this when someone dials the number. Returns TwiML that
/// greets the caller and starts listening for speech.
async fn handle_incoming_call(
    State(assistant): State<AppState>,
    Form(request): Form<CallRequest>,
) -> impl IntoResponse {
    let twiml = assistant.handle_incoming_call(&request).await;
    (StatusCode::OK, XML_CONTENT_TYPE, twiml)
}

/// Handle speech input webhook
///
/// POST /handle-speech/{call_sid}
///
/// Twilio calls this after each caller utterance with the transcript.
async fn handle_speech(
    State(assistant): State<AppState>,
    Path(call_sid): Path<String>,
    Form(form): Form<SpeechForm>,
) -> impl IntoResponse {
    let twiml = assistant.handle_speech(&call_sid, &form).await;
    (StatusCode::OK, XML_CONTENT_TYPE, twiml)
}

/// Handle call status callback
///
/// POST /twilio/status
async fn handle_status_callback(
    State(assistant): State<AppState>,
    Form(callback): Form<StatusCallback>,
) -> impl IntoResponse {
    assistant.handle_status(&callback).await;
    StatusCode::OK
}

/// Handle the vendor fallback webhook (called when the primary errors)
///
/// POST /twilio/fallback
async fn handle_fallback(
    State(assistant): State<AppState>,
    Form(request): Form<CallRequest>,
) -> impl IntoResponse {
    let twiml = assistant.handle_fallback(&request.call_sid);
    (StatusCode::OK, XML_CONTENT_TYPE, twiml)
}

/// Serve cached synthesized audio for `<Play>`
///
/// GET /audio/{id}
async fn serve_audio(
    State(assistant): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let clip = assistant
        .audio(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No audio clip {}", id)))?;

    info!("Serving audio clip {} ({} bytes)", id, clip.audio_bytes.len());
    Ok((
        StatusCode::OK,
        [("Content-Type", clip.content_type())],
        clip.audio_bytes,
    ))
}
