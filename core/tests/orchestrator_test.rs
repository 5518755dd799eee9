use async_trait::async_trait;
use livecast_core::{
    EventKind, GeneratedSpeech, LivecastError, OrchestratorConfig, SpeakOptions, SpeechChannel,
    SpeechGenerator, SpeechOrchestrator, SpeechPriority,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Generator stub returning a canned URL, counting invocations.
struct FakeGenerator {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeGenerator {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail,
        })
    }
}

#[async_trait]
impl SpeechGenerator for FakeGenerator {
    async fn generate(
        &self,
        text: &str,
        _emotion: Option<&str>,
    ) -> livecast_core::Result<GeneratedSpeech> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LivecastError::GenerationError("stub failure".into()));
        }
        Ok(GeneratedSpeech {
            file_path: format!("/tmp/fake_{n}.wav"),
            audio_url: format!("/static/audio/fake_{}.wav", text.chars().count()),
        })
    }
}

fn fast_orchestrator(
    channel: Arc<SpeechChannel>,
    generator: Option<Arc<dyn SpeechGenerator>>,
) -> Arc<SpeechOrchestrator> {
    Arc::new(SpeechOrchestrator::with_config(
        channel,
        generator,
        OrchestratorConfig {
            poll_interval_ms: 10,
        },
    ))
}

fn short_speech(text: &str, priority: SpeechPriority, can_interrupt: bool) -> SpeakOptions {
    let mut options = SpeakOptions::new(text);
    options.priority = priority;
    options.can_interrupt = can_interrupt;
    options.duration = Some(0.2);
    options
}

#[tokio::test]
async fn queued_speech_is_broadcast_with_generated_audio() {
    let channel = Arc::new(SpeechChannel::with_capacity(16));
    let (_id, mut rx) = channel.subscribe();
    let generator = FakeGenerator::new(false);
    let orchestrator = fast_orchestrator(Arc::clone(&channel), Some(generator.clone()));
    orchestrator.start().await.unwrap();

    orchestrator
        .speak_with_options(short_speech("สวัสดีครับ", SpeechPriority::Normal, false))
        .await
        .unwrap();

    let event = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout")
        .expect("channel closed");
    assert_eq!(event.kind, EventKind::Speak);
    assert_eq!(event.text, "สวัสดีครับ");
    assert!(!event.audio_url.is_empty());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn generation_failure_holds_the_floor_silently() {
    let channel = Arc::new(SpeechChannel::with_capacity(16));
    let (_id, mut rx) = channel.subscribe();
    let generator = FakeGenerator::new(true);
    let orchestrator = fast_orchestrator(Arc::clone(&channel), Some(generator));
    orchestrator.start().await.unwrap();

    orchestrator
        .speak_with_options(short_speech("no audio", SpeechPriority::Normal, false))
        .await
        .unwrap();

    // The speak event still goes out, with an empty audio URL.
    let event = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout")
        .expect("channel closed");
    assert_eq!(event.kind, EventKind::Speak);
    assert!(event.audio_url.is_empty());

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn urgent_request_preempts_current_speech() {
    let channel = Arc::new(SpeechChannel::with_capacity(16));
    let (_id, mut rx) = channel.subscribe();
    let orchestrator = fast_orchestrator(Arc::clone(&channel), None);
    orchestrator.start().await.unwrap();

    // A long product pitch occupies the floor.
    let mut pitch = short_speech("สวัสดีครับ วันนี้มีโปรโมชั่นพิเศษ", SpeechPriority::Normal, false);
    pitch.duration = Some(10.0);
    orchestrator.speak_with_options(pitch).await.unwrap();

    let first = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout")
        .expect("channel closed");
    assert_eq!(first.kind, EventKind::Speak);

    // Urgent interruptible announcement preempts it.
    orchestrator.speak_immediately("ด่วน!").await.unwrap();

    let stop = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout")
        .expect("channel closed");
    assert_eq!(stop.kind, EventKind::Stop);
    assert_eq!(stop.text, first.text);

    // The urgent line is what plays next, and the pitch never replays.
    let second = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout")
        .expect("channel closed");
    assert_eq!(second.kind, EventKind::Speak);
    assert_eq!(second.text, "ด่วน!");
    assert_eq!(second.source, "interrupt");

    let leftover = timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(
        leftover.is_err(),
        "preempted speech must not be replayed: {leftover:?}"
    );

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn urgent_without_interrupt_flag_waits_its_turn() {
    let channel = Arc::new(SpeechChannel::with_capacity(16));
    let (_id, mut rx) = channel.subscribe();
    let orchestrator = fast_orchestrator(Arc::clone(&channel), None);
    orchestrator.start().await.unwrap();

    let mut pitch = short_speech("long pitch", SpeechPriority::Normal, false);
    pitch.duration = Some(0.5);
    orchestrator.speak_with_options(pitch).await.unwrap();
    let first = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout")
        .expect("channel closed");
    assert_eq!(first.kind, EventKind::Speak);

    orchestrator
        .speak_with_options(short_speech("urgent but polite", SpeechPriority::Urgent, false))
        .await
        .unwrap();

    // No stop event: the pitch runs to completion first.
    let second = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout")
        .expect("channel closed");
    assert_eq!(second.kind, EventKind::Speak);
    assert_eq!(second.text, "urgent but polite");

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn chat_responses_outrank_presentation_material() {
    let channel = Arc::new(SpeechChannel::with_capacity(16));
    let orchestrator = fast_orchestrator(Arc::clone(&channel), None);

    // Not started: requests pile up so we can inspect the order.
    orchestrator
        .speak("pitch 1", SpeechPriority::Normal, false, "script", None)
        .await
        .unwrap();
    orchestrator
        .speak("pitch 2", SpeechPriority::Normal, false, "script", None)
        .await
        .unwrap();
    orchestrator.respond_to_chat("answer").await.unwrap();

    let status = orchestrator.status().await;
    assert_eq!(status.queue.queue_length, 3);
    assert_eq!(status.queue.queued[0].text, "answer");
    assert_eq!(status.queue.queued[0].source, "chat");
}

#[tokio::test]
async fn preset_audio_url_skips_generation() {
    let channel = Arc::new(SpeechChannel::with_capacity(16));
    let (_id, mut rx) = channel.subscribe();
    let generator = FakeGenerator::new(false);
    let orchestrator = fast_orchestrator(Arc::clone(&channel), Some(generator.clone()));
    orchestrator.start().await.unwrap();

    let mut options = short_speech("prerecorded", SpeechPriority::Normal, false);
    options.audio_url = Some("/static/audio/prerecorded.wav".to_string());
    orchestrator.speak_with_options(options).await.unwrap();

    let event = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout")
        .expect("channel closed");
    assert_eq!(event.audio_url, "/static/audio/prerecorded.wav");
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn start_is_idempotent_and_shutdown_stops_the_loop() {
    let channel = Arc::new(SpeechChannel::with_capacity(16));
    let orchestrator = fast_orchestrator(Arc::clone(&channel), None);

    orchestrator.start().await.unwrap();
    orchestrator.start().await.unwrap();
    assert!(orchestrator.is_running());

    orchestrator.shutdown().await;
    assert!(!orchestrator.is_running());
}
