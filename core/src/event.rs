// Real-time push channel for speech events
use crate::queue::SpeechRequest;
use crate::util::{gen_id, now_secs};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Kind of broadcast event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Speak,
    Stop,
}

/// Structured event pushed to every subscriber when the presenter
/// starts or abandons a speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub text: String,
    pub audio_url: String,
    pub duration: f64,
    pub priority: String,
    pub source: String,
    pub emotion: String,
    pub timestamp: f64,
}

impl SpeechEvent {
    /// Build a "speak" event from a request about to hold the floor.
    /// An empty `audio_url` means generation failed and the presenter
    /// holds its estimated speaking time silently.
    pub fn speak(request: &SpeechRequest) -> Self {
        Self {
            kind: EventKind::Speak,
            text: request.text.clone(),
            audio_url: request.audio_url.clone().unwrap_or_default(),
            duration: request.duration,
            priority: request.priority.as_str().to_string(),
            source: request.source.clone(),
            emotion: request
                .emotion
                .clone()
                .unwrap_or_else(|| "neutral".to_string()),
            timestamp: now_secs(),
        }
    }

    /// Build a "stop" event for a speech preempted mid-playback.
    pub fn stop(request: &SpeechRequest) -> Self {
        Self {
            kind: EventKind::Stop,
            ..Self::speak(request)
        }
    }
}

/// Channel delivery statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelStats {
    pub total_broadcast: u64,
    pub total_delivered: u64,
    pub dropped_events: u64,
    pub pruned_subscribers: u64,
    pub active_subscribers: usize,
}

/// Best-effort fan-out channel. One failed delivery never blocks the
/// others; a subscriber whose receiver is gone is pruned from the
/// active set.
pub struct SpeechChannel {
    subscribers: DashMap<String, mpsc::Sender<SpeechEvent>>,
    capacity: usize,
    total_broadcast: AtomicU64,
    total_delivered: AtomicU64,
    dropped_events: AtomicU64,
    pruned_subscribers: AtomicU64,
}

impl SpeechChannel {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Per-subscriber buffered capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            capacity: capacity.max(1),
            total_broadcast: AtomicU64::new(0),
            total_delivered: AtomicU64::new(0),
            dropped_events: AtomicU64::new(0),
            pruned_subscribers: AtomicU64::new(0),
        }
    }

    /// Register a subscriber and return its id plus the receiving end.
    pub fn subscribe(&self) -> (String, mpsc::Receiver<SpeechEvent>) {
        let id = format!("sub_{}", gen_id());
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.insert(id.clone(), tx);
        debug!(target = "channel", subscriber = %id, total = self.subscribers.len(), "Subscriber added");
        (id, rx)
    }

    pub fn unsubscribe(&self, id: &str) {
        if self.subscribers.remove(id).is_some() {
            debug!(target = "channel", subscriber = %id, total = self.subscribers.len(), "Subscriber removed");
        }
    }

    /// Fan the event out to every live subscriber. Returns how many
    /// deliveries succeeded.
    pub fn broadcast(&self, event: SpeechEvent) -> usize {
        self.total_broadcast.fetch_add(1, Ordering::Relaxed);

        let mut delivered = 0usize;
        let mut dead: Vec<String> = Vec::new();

        for entry in self.subscribers.iter() {
            match entry.value().try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.dropped_events.fetch_add(1, Ordering::Relaxed);
                    warn!(target = "channel", subscriber = %entry.key(), "Subscriber queue full; event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dead.push(entry.key().clone());
                }
            }
        }

        for id in dead {
            self.subscribers.remove(&id);
            self.pruned_subscribers.fetch_add(1, Ordering::Relaxed);
            warn!(target = "channel", subscriber = %id, "Subscriber disconnected; pruned");
        }

        self.total_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            total_broadcast: self.total_broadcast.load(Ordering::Relaxed),
            total_delivered: self.total_delivered.load(Ordering::Relaxed),
            dropped_events: self.dropped_events.load(Ordering::Relaxed),
            pruned_subscribers: self.pruned_subscribers.load(Ordering::Relaxed),
            active_subscribers: self.subscribers.len(),
        }
    }
}

impl Default for SpeechChannel {
    fn default() -> Self {
        Self::new()
    }
}
