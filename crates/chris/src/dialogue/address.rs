//! Address capture and verification
//!
//! Twilio's phone-call speech model mangles street numbers in predictable
//! ways, so transcripts pass through a correction table first. Known
//! properties match directly; anything else extracted by the general street
//! pattern must be verified against the property directory before it may
//! fill the address slot. Unverified candidates are rejected outright.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::rentman::RentManagerClient;

/// Ordered speech-mishearing rewrites, first hit wins.
const SPEECH_FIXES: &[(&str, &str)] = &[
    ("2540 port richmond", "25 port richmond"),
    ("2540 richmond", "25 richmond"),
    ("254 port richmond", "25 port richmond"),
    ("250 port richmond", "25 port richmond"),
    ("290 port richmond", "29 port richmond"),
    ("310 port richmond", "31 port richmond"),
    ("1220 targee", "122 targee"),
    ("1225 targee", "122 targee"),
];

/// High-traffic properties matched ahead of the general pattern.
const PRIORITY_ADDRESSES: &[(&str, &str)] = &[
    ("29 port richmond", "29 Port Richmond Avenue"),
    ("122 targee", "122 Targee Street"),
    ("31 port richmond", "31 Port Richmond Avenue"),
];

/// Fallback roster used when the rent-manager API is not reachable.
const KNOWN_ADDRESSES: &[&str] = &[
    "29 Port Richmond Avenue",
    "122 Targee Street",
    "31 Port Richmond Avenue",
    "2940 Richmond Avenue",
    "2944 Richmond Avenue",
    "2938 Richmond Avenue",
];

static STREET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s+([\w\s]+(?:street|avenue|ave|road|rd|court|ct|lane|ln|drive|dr))\b")
        .expect("street address regex")
});

/// Apply the mishearing correction table to a lower-cased transcript.
pub fn correct_speech(transcript: &str) -> String {
    let mut corrected = transcript.to_lowercase();
    for (heard, fixed) in SPEECH_FIXES {
        if corrected.contains(heard) {
            corrected = corrected.replace(heard, fixed);
            break;
        }
    }
    corrected
}

/// Result of trying to read an address out of a transcript
#[derive(Debug, Clone, PartialEq)]
pub enum AddressOutcome {
    /// Canonical verified address
    Verified(String),
    /// Looked like an address but is not in the property system
    Rejected(String),
    /// No address in this transcript
    None,
}

/// The property roster candidates are verified against
pub struct PropertyDirectory {
    rentman: Option<Arc<RentManagerClient>>,
    cache: RwLock<Option<Vec<String>>>,
}

impl PropertyDirectory {
    pub fn new(rentman: Option<Arc<RentManagerClient>>) -> Self {
        Self {
            rentman,
            cache: RwLock::new(None),
        }
    }

    /// Extract and verify an address from a caller transcript.
    pub async fn capture(&self, transcript: &str) -> AddressOutcome {
        let corrected = correct_speech(transcript);

        for (spoken, canonical) in PRIORITY_ADDRESSES {
            if corrected.contains(spoken) {
                return AddressOutcome::Verified((*canonical).to_string());
            }
        }

        let Some(caps) = STREET_PATTERN.captures(&corrected) else {
            return AddressOutcome::None;
        };
        let candidate = format!("{} {}", &caps[1], caps[2].trim());

        match self.verify(&candidate).await {
            Some(canonical) => AddressOutcome::Verified(canonical),
            None => {
                warn!("Address '{}' not found in the property system", candidate);
                AddressOutcome::Rejected(candidate)
            }
        }
    }

    /// Match a candidate against the property roster; returns the canonical
    /// address on success.
    async fn verify(&self, candidate: &str) -> Option<String> {
        let candidate_lower = candidate.to_lowercase();
        for address in self.roster().await {
            let known_lower = address.to_lowercase();
            if candidate_lower.contains(&known_lower) || known_lower.contains(&candidate_lower) {
                info!("Verified address '{}' as '{}'", candidate, address);
                return Some(address);
            }
        }
        None
    }

    /// Property addresses, loaded once from the rent-manager API when it is
    /// configured, otherwise the built-in roster.
    async fn roster(&self) -> Vec<String> {
        if let Some(cached) = self.cache.read().await.clone() {
            return cached;
        }

        let roster = match &self.rentman {
            Some(client) => match client.get_all_properties().await {
                Ok(properties) if !properties.is_empty() => {
                    info!("Loaded {} properties for address matching", properties.len());
                    properties.into_iter().map(|p| p.address).collect()
                }
                Ok(_) => {
                    warn!("Rent-manager returned no properties, using built-in roster");
                    builtin_roster()
                }
                Err(e) => {
                    warn!("Failed to load properties ({}), using built-in roster", e);
                    builtin_roster()
                }
            },
            None => builtin_roster(),
        };

        *self.cache.write().await = Some(roster.clone());
        roster
    }
}

fn builtin_roster() -> Vec<String> {
    KNOWN_ADDRESSES.iter().map(|s| s.to_string()).collect()
}
