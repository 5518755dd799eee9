// Priority speech queue: ordering, interruption and pause semantics
use crate::util::{gen_id, now_secs};
use crate::{LivecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

/// Speech priority levels. Ordering is numeric, not lexical: a later
/// variant always outranks an earlier one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpeechPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl SpeechPriority {
    pub fn rank(self) -> u8 {
        match self {
            SpeechPriority::Low => 1,
            SpeechPriority::Normal => 2,
            SpeechPriority::High => 3,
            SpeechPriority::Urgent => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpeechPriority::Low => "LOW",
            SpeechPriority::Normal => "NORMAL",
            SpeechPriority::High => "HIGH",
            SpeechPriority::Urgent => "URGENT",
        }
    }
}

/// One unit of text queued for spoken presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub id: String,
    pub text: String,
    pub priority: SpeechPriority,
    pub audio_url: Option<String>,
    pub duration: f64,
    pub emotion: Option<String>,
    pub gesture: Option<String>,
    pub can_interrupt: bool,
    pub source: String,
    pub timestamp: f64,
}

impl SpeechRequest {
    /// Create a request with an estimated duration. Empty text is
    /// rejected synchronously with no side effect.
    pub fn new(text: &str, priority: SpeechPriority, source: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LivecastError::InvalidInput("empty speech text".into()));
        }
        Ok(Self {
            id: format!("speech_{}", gen_id()),
            text: text.to_string(),
            priority,
            audio_url: None,
            duration: Self::estimate_duration(text),
            emotion: None,
            gesture: None,
            can_interrupt: false,
            source: source.to_string(),
            timestamp: now_secs(),
        })
    }

    /// ~50 ms per character plus a one second base, never under 2 s.
    pub fn estimate_duration(text: &str) -> f64 {
        (text.chars().count() as f64 * 0.05 + 1.0).max(2.0)
    }

    pub fn with_duration(mut self, duration: f64) -> Result<Self> {
        if duration <= 0.0 {
            return Err(LivecastError::InvalidInput(format!(
                "non-positive duration: {duration}"
            )));
        }
        self.duration = duration;
        Ok(self)
    }

    pub fn with_audio_url(mut self, url: &str) -> Self {
        self.audio_url = Some(url.to_string());
        self
    }

    pub fn with_emotion(mut self, emotion: &str) -> Self {
        self.emotion = Some(emotion.to_string());
        self
    }

    pub fn with_gesture(mut self, gesture: &str) -> Self {
        self.gesture = Some(gesture.to_string());
        self
    }

    pub fn interruptible(mut self, can_interrupt: bool) -> Self {
        self.can_interrupt = can_interrupt;
        self
    }

    fn preview(&self) -> SpeechPreview {
        SpeechPreview {
            text: truncate_chars(&self.text, 30),
            priority: self.priority.as_str().to_string(),
            source: self.source.clone(),
            id: self.id.clone(),
            timestamp: self.timestamp,
            duration: self.duration,
        }
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let head: String = text.chars().take(limit).collect();
        format!("{head}...")
    }
}

/// Outcome of adding a request to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Inserted at the given position in priority order.
    Queued(usize),
    /// Preempted the currently playing speech and took the front slot.
    Interrupted,
}

/// Truncated view of a queued request, safe to ship in status payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechPreview {
    pub text: String,
    pub priority: String,
    pub source: String,
    pub id: String,
    pub timestamp: f64,
    pub duration: f64,
}

/// Queue status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queue_length: usize,
    pub is_processing: bool,
    pub is_paused: bool,
    pub current: Option<SpeechPreview>,
    pub queued: Vec<SpeechPreview>,
}

#[derive(Default)]
struct QueueState {
    entries: VecDeque<SpeechRequest>,
    current: Option<SpeechRequest>,
    is_processing: bool,
    is_paused: bool,
    /// Bumped by `begin`; identifies which playback an interrupt
    /// permit was issued for.
    epoch: u64,
    interrupt_epoch: Option<u64>,
}

/// Priority-ordered speech queue. All mutation goes through the inner
/// mutex, so concurrent producers never race the consumer's take.
pub struct SpeechQueue {
    inner: Mutex<QueueState>,
    interrupt: Notify,
}

impl SpeechQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueState::default()),
            interrupt: Notify::new(),
        }
    }

    /// Insert in priority order (FIFO among equals). An URGENT request
    /// marked interruptible preempts the speech currently on air: it
    /// takes the front slot and the playing speech is abandoned.
    pub async fn add(&self, request: SpeechRequest) -> Enqueued {
        let mut state = self.inner.lock().await;

        if request.priority == SpeechPriority::Urgent
            && request.can_interrupt
            && state.is_processing
        {
            info!(
                target = "queue",
                id = %request.id,
                text = %truncate_chars(&request.text, 50),
                "Interrupting current speech for urgent request"
            );
            state.entries.push_front(request);
            state.interrupt_epoch = Some(state.epoch);
            self.interrupt.notify_one();
            return Enqueued::Interrupted;
        }

        let position = state
            .entries
            .iter()
            .position(|queued| queued.priority < request.priority)
            .unwrap_or(state.entries.len());
        debug!(
            target = "queue",
            id = %request.id,
            priority = request.priority.as_str(),
            position,
            queue_length = state.entries.len() + 1,
            "Speech request queued"
        );
        state.entries.insert(position, request);
        Enqueued::Queued(position)
    }

    /// Pop the front entry unless the queue is empty or paused.
    pub async fn take_next(&self) -> Option<SpeechRequest> {
        let mut state = self.inner.lock().await;
        if state.is_paused {
            return None;
        }
        state.entries.pop_front()
    }

    /// Drop queued entries. With `keep_high_priority`, HIGH and URGENT
    /// entries survive. Never touches the playing item.
    pub async fn clear(&self, keep_high_priority: bool) {
        let mut state = self.inner.lock().await;
        if keep_high_priority {
            state
                .entries
                .retain(|req| req.priority >= SpeechPriority::High);
            info!(
                target = "queue",
                kept = state.entries.len(),
                "Cleared low priority speeches"
            );
        } else {
            state.entries.clear();
            info!(target = "queue", "Cleared speech queue");
        }
    }

    pub async fn pause(&self) {
        let mut state = self.inner.lock().await;
        state.is_paused = true;
        info!(target = "queue", "Speech queue paused");
    }

    pub async fn resume(&self) {
        let mut state = self.inner.lock().await;
        state.is_paused = false;
        info!(target = "queue", "Speech queue resumed");
    }

    /// Mark a request as on air and return its playback epoch. Called
    /// only by the consumer.
    pub async fn begin(&self, request: &SpeechRequest) -> u64 {
        let mut state = self.inner.lock().await;
        state.epoch += 1;
        state.is_processing = true;
        state.current = Some(request.clone());
        state.epoch
    }

    /// Clear the on-air marker. Called only by the consumer.
    pub async fn finish(&self) {
        let mut state = self.inner.lock().await;
        state.is_processing = false;
        state.current = None;
    }

    /// Resolves when an interrupting request preempts the playback
    /// begun under `epoch`. The consumer races this against its
    /// deliberate wait. A permit issued against an earlier playback
    /// (the interrupting request landed after the previous speech's
    /// wait ended but before `finish`) is consumed and ignored, so a
    /// speech never aborts on a signal meant for its predecessor.
    pub async fn interrupted(&self, epoch: u64) {
        loop {
            self.interrupt.notified().await;
            if self.inner.lock().await.interrupt_epoch == Some(epoch) {
                return;
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    /// Snapshot with previews of at most the first 10 queued entries.
    pub async fn status(&self) -> QueueStatus {
        let state = self.inner.lock().await;
        QueueStatus {
            queue_length: state.entries.len(),
            is_processing: state.is_processing,
            is_paused: state.is_paused,
            current: state.current.as_ref().map(|req| req.preview()),
            queued: state
                .entries
                .iter()
                .take(10)
                .map(|req| req.preview())
                .collect(),
        }
    }
}

impl Default for SpeechQueue {
    fn default() -> Self {
        Self::new()
    }
}
