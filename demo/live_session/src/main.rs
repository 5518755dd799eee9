use livecast_core::{
    LivePlatform, Product, SessionHub, SpeechChannel, SpeechOrchestrator,
};
use livecast_tts::{TtsCoordinator, TtsConfig};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

/// Console stand-in for a real live platform: responses that would go
/// into the comment feed are just printed.
struct ConsolePlatform;

#[async_trait::async_trait]
impl LivePlatform for ConsolePlatform {
    async fn post_response(&self, text: &str) -> livecast_core::Result<()> {
        println!("[platform] {text}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,livecast_core=info,livecast_tts=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        target = "live_session",
        "Starting live session demo: comments → session hub → orchestrator → TTS"
    );

    // Speech event channel plus a subscriber standing in for the
    // avatar front-end.
    let channel = Arc::new(SpeechChannel::with_capacity(64));
    let (_sub_id, mut events) = channel.subscribe();
    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!(
                "[avatar] {:?} \"{}\" ({:.1}s, {})",
                event.kind, event.text, event.duration, event.emotion
            );
        }
    });

    // TTS pipeline behind the orchestrator's generator seam.
    let coordinator = Arc::new(TtsCoordinator::new(TtsConfig::default()));
    let orchestrator = Arc::new(SpeechOrchestrator::new(
        Arc::clone(&channel),
        Some(coordinator),
    ));
    orchestrator.start().await?;

    let hub = SessionHub::new(Arc::clone(&orchestrator)).with_platform(Arc::new(ConsolePlatform));

    hub.start_session().await?;

    hub.present_product(&Product {
        id: "sku-001".to_string(),
        name: "หูฟังไร้สาย".to_string(),
        description: "เสียงใสตัดเสียงรบกวน แบตอึด 30 ชั่วโมง".to_string(),
        price: 1290.0,
    })
    .await?;

    // A burst of simulated viewer comments.
    for (user, message) in [
        ("Mint", "สวัสดีค่ะ"),
        ("Beam", "ราคาเท่าไหร่ครับ"),
        ("Fah", "สนใจค่ะ สั่งยังไง"),
        ("Nok", "ใช้กับไอโฟนได้ไหม"),
    ] {
        hub.handle_comment(user, message).await?;
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }

    // An urgent flash-sale announcement preempts whatever is playing.
    orchestrator
        .speak_immediately("ด่วน! ลดเพิ่มอีก 10 เปอร์เซ็นต์ เฉพาะ 5 นาทีนี้เท่านั้น!")
        .await?;

    println!("Press Ctrl+C to end the session.");
    signal::ctrl_c().await?;

    info!(target = "live_session", "Shutting down...");
    hub.stop_session().await?;

    // Give the farewell line a moment to be spoken.
    tokio::time::sleep(std::time::Duration::from_secs(5)).await;

    let status = hub.status().await;
    println!(
        "session stats: {}",
        serde_json::to_string_pretty(&status.stats)?
    );

    orchestrator.shutdown().await;
    event_task.abort();
    Ok(())
}
