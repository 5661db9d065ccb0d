//! In-memory cache for synthesized call audio
//!
//! Twilio fetches `<Play>` audio over HTTP shortly after the webhook
//! response, so clips only need to live for minutes. Entries expire by age
//! and the cache sheds oldest-first at capacity.

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// A cached audio clip
#[derive(Debug, Clone)]
pub struct CachedAudio {
    pub id: String,
    /// Raw MP3 bytes
    pub audio_bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
    /// Call this clip belongs to
    pub call_sid: Option<String>,
    /// Text that was synthesized
    pub source_text: String,
}

impl CachedAudio {
    pub fn content_type(&self) -> &'static str {
        "audio/mpeg"
    }
}

/// TTL + capacity bounded audio store
pub struct AudioCache {
    cache: Arc<RwLock<HashMap<String, CachedAudio>>>,
    max_age: Duration,
    max_items: usize,
}

impl Default for AudioCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCache {
    pub fn new() -> Self {
        Self::with_settings(300, 100)
    }

    pub fn with_settings(max_age_secs: u64, max_items: usize) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            max_age: Duration::from_secs(max_age_secs),
            max_items,
        }
    }

    /// Store a clip and return its id.
    pub async fn store(
        &self,
        audio_bytes: Vec<u8>,
        source_text: &str,
        call_sid: Option<String>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let cached = CachedAudio {
            id: id.clone(),
            audio_bytes,
            created_at: Utc::now(),
            call_sid,
            source_text: source_text.to_string(),
        };

        let mut cache = self.cache.write().await;

        if cache.len() >= self.max_items {
            Self::drop_stale(&mut cache, self.max_age);
        }
        while cache.len() >= self.max_items {
            let Some(oldest) = cache
                .iter()
                .min_by_key(|(_, audio)| audio.created_at)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            cache.remove(&oldest);
        }

        cache.insert(id.clone(), cached);
        id
    }

    pub async fn get(&self, id: &str) -> Option<CachedAudio> {
        let cache = self.cache.read().await;
        let audio = cache.get(id)?;
        let cutoff = Utc::now() - chrono::Duration::from_std(self.max_age).unwrap_or_default();
        if audio.created_at < cutoff {
            return None;
        }
        Some(audio.clone())
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// Drop expired clips.
    pub async fn cleanup(&self) {
        let mut cache = self.cache.write().await;
        Self::drop_stale(&mut cache, self.max_age);
    }

    /// Drop every clip belonging to an ended call.
    pub async fn cleanup_call(&self, call_sid: &str) {
        let mut cache = self.cache.write().await;
        let ids: Vec<String> = cache
            .iter()
            .filter(|(_, audio)| audio.call_sid.as_deref() == Some(call_sid))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &ids {
            cache.remove(id);
        }
        if !ids.is_empty() {
            info!("Dropped {} audio clips for call {}", ids.len(), call_sid);
        }
    }

    fn drop_stale(cache: &mut HashMap<String, CachedAudio>, max_age: Duration) {
        let cutoff = Utc::now() - chrono::Duration::from_std(max_age).unwrap_or_default();
        let stale: Vec<String> = cache
            .iter()
            .filter(|(_, audio)| audio.created_at < cutoff)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            cache.remove(id);
        }
        if !stale.is_empty() {
            info!("Dropped {} expired audio clips", stale.len());
        }
    }
}
