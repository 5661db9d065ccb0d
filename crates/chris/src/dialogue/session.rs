//! Per-call session state
//!
//! Sessions live in memory, keyed by the vendor call SID. Slots are
//! monotonic: once the caller has told us the problem or the address, no
//! later turn may clear or overwrite it. Stale sessions are swept by a
//! background task; terminal status callbacks tear them down early.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::tickets::Ticket;

/// Who is speaking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Caller,
    Chris,
}

/// One exchange in the call transcript
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: Option<f64>,
}

/// Where the maintenance-request flow stands for a call.
///
/// Strictly monotonic: `AwaitingProblem -> AwaitingAddress ->
/// ReadyForTicket`, no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    AwaitingProblem,
    AwaitingAddress,
    ReadyForTicket,
}

/// Operator-facing view of one active call
#[derive(Debug, Clone, Serialize)]
pub struct CallSummary {
    pub call_sid: String,
    pub caller_number: String,
    pub state: SlotState,
    pub turns: u32,
    pub duration_seconds: i64,
    pub last_heard: Option<String>,
}

/// State for one active phone call
#[derive(Debug, Clone)]
pub struct CallSession {
    pub call_sid: String,
    pub caller_number: String,
    problem: Option<String>,
    address: Option<String>,
    ticket: Option<Ticket>,
    pub turn_count: u32,
    pub conversation: Vec<ConversationTurn>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl CallSession {
    pub fn new(call_sid: &str, caller_number: &str) -> Self {
        let now = Utc::now();
        Self {
            call_sid: call_sid.to_string(),
            caller_number: caller_number.to_string(),
            problem: None,
            address: None,
            ticket: None,
            turn_count: 0,
            conversation: Vec::new(),
            started_at: now,
            last_activity: now,
        }
    }

    pub fn slot_state(&self) -> SlotState {
        match (&self.problem, &self.address) {
            (None, _) => SlotState::AwaitingProblem,
            (Some(_), None) => SlotState::AwaitingAddress,
            (Some(_), Some(_)) => SlotState::ReadyForTicket,
        }
    }

    pub fn problem(&self) -> Option<&str> {
        self.problem.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        self.ticket.as_ref()
    }

    /// Fill the problem slot. A later turn can never replace it.
    pub fn set_problem(&mut self, description: &str) -> bool {
        if self.problem.is_some() {
            return false;
        }
        info!("Call {}: problem captured: '{}'", self.call_sid, description);
        self.problem = Some(description.to_string());
        true
    }

    /// Fill the address slot. A later turn can never replace it.
    pub fn set_address(&mut self, address: &str) -> bool {
        if self.address.is_some() {
            return false;
        }
        info!("Call {}: address captured: '{}'", self.call_sid, address);
        self.address = Some(address.to_string());
        true
    }

    /// Attach the ticket issued for this call. Only the first one sticks.
    pub fn set_ticket(&mut self, ticket: Ticket) -> bool {
        if self.ticket.is_some() {
            return false;
        }
        self.ticket = Some(ticket);
        true
    }

    pub fn record_caller(&mut self, content: &str, confidence: Option<f64>) {
        self.turn_count += 1;
        self.last_activity = Utc::now();
        self.conversation.push(ConversationTurn {
            speaker: Speaker::Caller,
            content: content.to_string(),
            timestamp: Utc::now(),
            confidence,
        });
    }

    pub fn record_chris(&mut self, content: &str) {
        self.last_activity = Utc::now();
        self.conversation.push(ConversationTurn {
            speaker: Speaker::Chris,
            content: content.to_string(),
            timestamp: Utc::now(),
            confidence: None,
        });
    }

    pub fn duration_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// Most recent thing the caller said.
    pub fn last_caller_utterance(&self) -> Option<&str> {
        self.conversation
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Caller)
            .map(|t| t.content.as_str())
    }

    fn summary(&self) -> CallSummary {
        CallSummary {
            call_sid: self.call_sid.clone(),
            caller_number: self.caller_number.clone(),
            state: self.slot_state(),
            turns: self.turn_count,
            duration_seconds: self.duration_seconds(),
            last_heard: self.last_caller_utterance().map(str::to_string),
        }
    }
}

/// All active call sessions
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, CallSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the session for a new call and record the greeting turn.
    pub async fn begin_call(&self, call_sid: &str, caller_number: &str, greeting: &str) {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(call_sid.to_string())
            .or_insert_with(|| CallSession::new(call_sid, caller_number));
        session.record_chris(greeting);
    }

    /// Write access to the session table for the span of one webhook turn.
    ///
    /// A call's turns arrive strictly one at a time from the vendor, but two
    /// different calls may land together; the guard keeps a turn's
    /// read-modify-write atomic.
    pub async fn guard(&self) -> tokio::sync::RwLockWriteGuard<'_, HashMap<String, CallSession>> {
        self.sessions.write().await
    }

    pub async fn get(&self, call_sid: &str) -> Option<CallSession> {
        self.sessions.read().await.get(call_sid).cloned()
    }

    pub async fn remove(&self, call_sid: &str) -> Option<CallSession> {
        let removed = self.sessions.write().await.remove(call_sid);
        if let Some(ref session) = removed {
            info!(
                "Call {} ended after {} caller turns",
                call_sid, session.turn_count
            );
        } else {
            warn!("Teardown for unknown call: {}", call_sid);
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Summaries of every active call, for the admin surface.
    pub async fn summaries(&self) -> Vec<CallSummary> {
        self.sessions
            .read()
            .await
            .values()
            .map(CallSession::summary)
            .collect()
    }

    /// Drop sessions idle longer than `max_idle_minutes`.
    pub async fn cleanup_stale(&self, max_idle_minutes: i64) -> usize {
        let cutoff = Utc::now() - Duration::minutes(max_idle_minutes);
        let mut sessions = self.sessions.write().await;

        let stale: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.last_activity < cutoff)
            .map(|(sid, _)| sid.clone())
            .collect();

        for sid in &stale {
            info!("Cleaning up stale call: {}", sid);
            sessions.remove(sid);
        }
        stale.len()
    }
}
