// Speech orchestrator: single consumer loop driving the presenter
use crate::event::{SpeechChannel, SpeechEvent};
use crate::queue::{Enqueued, QueueStatus, SpeechPriority, SpeechQueue, SpeechRequest};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// A generated speech artifact ready to serve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSpeech {
    pub file_path: String,
    pub audio_url: String,
}

/// Seam to the TTS pipeline. The orchestrator only needs a URL back;
/// provider selection and audio repair live behind this trait.
#[async_trait]
pub trait SpeechGenerator: Send + Sync {
    async fn generate(&self, text: &str, emotion: Option<&str>) -> Result<GeneratedSpeech>;
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Idle delay between loop iterations when the queue yields nothing.
    pub poll_interval_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

/// Everything a caller can ask of `speak_with_options`.
#[derive(Debug, Clone)]
pub struct SpeakOptions {
    pub text: String,
    pub priority: SpeechPriority,
    pub audio_url: Option<String>,
    pub duration: Option<f64>,
    pub emotion: Option<String>,
    pub gesture: Option<String>,
    pub can_interrupt: bool,
    pub source: String,
}

impl SpeakOptions {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            priority: SpeechPriority::Normal,
            audio_url: None,
            duration: None,
            emotion: None,
            gesture: None,
            can_interrupt: false,
            source: "api".to_string(),
        }
    }
}

/// Orchestrator status snapshot: queue state plus the consumer flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    pub is_running: bool,
    #[serde(flatten)]
    pub queue: QueueStatus,
}

/// Owns the queue and executes exactly one speech at a time.
/// Constructible per session; nothing here is process-global.
pub struct SpeechOrchestrator {
    queue: Arc<SpeechQueue>,
    channel: Arc<SpeechChannel>,
    generator: Option<Arc<dyn SpeechGenerator>>,
    config: OrchestratorConfig,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SpeechOrchestrator {
    pub fn new(
        channel: Arc<SpeechChannel>,
        generator: Option<Arc<dyn SpeechGenerator>>,
    ) -> Self {
        Self::with_config(channel, generator, OrchestratorConfig::default())
    }

    pub fn with_config(
        channel: Arc<SpeechChannel>,
        generator: Option<Arc<dyn SpeechGenerator>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            queue: Arc::new(SpeechQueue::new()),
            channel,
            generator,
            config,
            running: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    pub fn queue(&self) -> Arc<SpeechQueue> {
        Arc::clone(&self.queue)
    }

    pub fn channel(&self) -> Arc<SpeechChannel> {
        Arc::clone(&self.channel)
    }

    /// Spawn the single consumer task. Idempotent.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let mut task = self.task.lock().await;
        if task.as_ref().map(|t| !t.is_finished()).unwrap_or(false) {
            return Ok(());
        }
        self.running.store(true, Ordering::SeqCst);
        let this = Arc::clone(self);
        *task = Some(tokio::spawn(async move {
            this.run_loop().await;
        }));
        info!(target = "orchestrator", "Speech queue processor started");
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
        info!(target = "orchestrator", "Speech orchestrator shut down");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run_loop(&self) {
        while self.running.load(Ordering::SeqCst) {
            match self.queue.take_next().await {
                Some(request) => self.execute(request).await,
                None => sleep(Duration::from_millis(self.config.poll_interval_ms)).await,
            }
        }
    }

    /// Execute one request: generate audio if needed, broadcast the
    /// speak event, then hold the floor for the speech duration unless
    /// an urgent request preempts it.
    async fn execute(&self, mut request: SpeechRequest) {
        info!(
            target = "orchestrator",
            id = %request.id,
            priority = request.priority.as_str(),
            duration = request.duration,
            "Executing speech"
        );
        let epoch = self.queue.begin(&request).await;

        if request.audio_url.is_none() {
            if let Some(generator) = &self.generator {
                match generator
                    .generate(&request.text, request.emotion.as_deref())
                    .await
                {
                    Ok(generated) => request.audio_url = Some(generated.audio_url),
                    Err(err) => {
                        // No retry: the presenter holds its estimated
                        // speaking time without audio.
                        warn!(
                            target = "orchestrator",
                            id = %request.id,
                            error = %err,
                            "Speech generation failed; holding the floor silently"
                        );
                    }
                }
            }
        }

        self.channel.broadcast(SpeechEvent::speak(&request));

        let wait = Duration::from_secs_f64(request.duration.max(0.0));
        tokio::select! {
            _ = sleep(wait) => {
                debug!(target = "orchestrator", id = %request.id, "Speech completed");
            }
            _ = self.queue.interrupted(epoch) => {
                info!(target = "orchestrator", id = %request.id, "Speech abandoned by urgent request");
                self.channel.broadcast(SpeechEvent::stop(&request));
            }
        }

        self.queue.finish().await;
    }

    /// Queue a speech request. Returns the request id.
    pub async fn speak(
        &self,
        text: &str,
        priority: SpeechPriority,
        can_interrupt: bool,
        source: &str,
        emotion: Option<&str>,
    ) -> Result<String> {
        let mut options = SpeakOptions::new(text);
        options.priority = priority;
        options.can_interrupt = can_interrupt;
        options.source = source.to_string();
        options.emotion = emotion.map(str::to_string);
        self.speak_with_options(options).await
    }

    pub async fn speak_with_options(&self, options: SpeakOptions) -> Result<String> {
        let mut request =
            SpeechRequest::new(&options.text, options.priority, &options.source)?
                .interruptible(options.can_interrupt);
        if let Some(duration) = options.duration {
            request = request.with_duration(duration)?;
        }
        if let Some(url) = &options.audio_url {
            request = request.with_audio_url(url);
        }
        if let Some(emotion) = &options.emotion {
            request = request.with_emotion(emotion);
        }
        if let Some(gesture) = &options.gesture {
            request = request.with_gesture(gesture);
        }

        let id = request.id.clone();
        match self.queue.add(request).await {
            Enqueued::Interrupted => {
                debug!(target = "orchestrator", id = %id, "Request preempted the current speech");
            }
            Enqueued::Queued(position) => {
                debug!(target = "orchestrator", id = %id, position, "Request queued");
            }
        }
        Ok(id)
    }

    /// URGENT + interruptible shorthand.
    pub async fn speak_immediately(&self, text: &str) -> Result<String> {
        self.speak(text, SpeechPriority::Urgent, true, "interrupt", None)
            .await
    }

    /// Chat responses jump ahead of queued presentation material.
    pub async fn respond_to_chat(&self, text: &str) -> Result<String> {
        self.speak(text, SpeechPriority::High, false, "chat", None)
            .await
    }

    pub async fn clear_queue(&self, keep_high_priority: bool) {
        self.queue.clear(keep_high_priority).await;
    }

    pub async fn pause(&self) {
        self.queue.pause().await;
    }

    pub async fn resume(&self) {
        self.queue.resume().await;
    }

    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            is_running: self.is_running(),
            queue: self.queue.status().await,
        }
    }
}
