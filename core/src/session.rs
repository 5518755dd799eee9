// Session policy hub: classifies inbound messages and drives the
// orchestrator. Platform glue and script persistence stay behind
// traits; this layer only decides what gets said, and how urgently.
use crate::orchestrator::SpeechOrchestrator;
use crate::queue::SpeechPriority;
use crate::{OrchestratorStatus, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::util::now_ms;

/// Outbound glue to a live platform. Comment polling is upstream and
/// out of scope; comments arrive via `SessionHub::handle_comment`.
#[async_trait]
pub trait LivePlatform: Send + Sync {
    async fn post_response(&self, text: &str) -> Result<()>;
}

/// Read-only script lookup from the persistence layer.
pub trait ScriptStore: Send + Sync {
    fn script_for(&self, product_id: &str) -> Option<PresentationScript>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationScript {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// Intent buckets for inbound comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentIntent {
    Greeting,
    PriceInquiry,
    Interest,
    Question,
    General,
}

/// Keyword classifier over the lowercased message. Thai and English
/// keyword sets, checked from most to least actionable.
pub fn classify_comment(message: &str) -> CommentIntent {
    let lower = message.to_lowercase();
    let contains_any =
        |keywords: &[&str]| keywords.iter().any(|keyword| lower.contains(keyword));

    if contains_any(&["ราคา", "เท่าไหร่", "price", "cost", "บาท"]) {
        CommentIntent::PriceInquiry
    } else if contains_any(&["สนใจ", "เอา", "ขอ", "สั่ง", "ซื้อ", "want", "interested"]) {
        CommentIntent::Interest
    } else if contains_any(&["?", "ไหม", "อะไร", "ยังไง", "what", "how", "why"]) {
        CommentIntent::Question
    } else if contains_any(&["สวัสดี", "hello", "hi", "hey"]) {
        CommentIntent::Greeting
    } else {
        CommentIntent::General
    }
}

fn templates_for(intent: CommentIntent) -> &'static [&'static str] {
    match intent {
        CommentIntent::Greeting => &[
            "สวัสดีครับ! ยินดีต้อนรับสู่ไลฟ์ขายของ",
            "สวัสดีครับ ขอบคุณที่เข้ามาดูนะครับ",
            "ยินดีต้อนรับครับ! วันนี้มีของดีๆ มาแนะนำเยอะเลย",
        ],
        CommentIntent::PriceInquiry => &[
            "ราคาจะแสดงในคอมเมนต์ครับ รอสักครู่นะครับ",
            "ขอบคุณที่สนใจครับ ราคาพิเศษจะประกาศให้ฟังเลยครับ",
            "ราคาดีมากครับ รับรองคุ้มค่าแน่นอน ติดตามต่อนะครับ",
        ],
        CommentIntent::Interest => &[
            "ขอบคุณที่สนใจครับ! รายละเอียดจะบอกให้ฟังทันทีเลยครับ",
            "เยี่ยมเลยครับ! คนที่สนใจแบบนี้แหละที่เราชอบ",
            "สนใจดีครับ! รอดูข้อมูลเพิ่มเติมนะครับ",
        ],
        CommentIntent::Question => &[
            "คำถามดีครับ! ขอตอบให้ฟังทันทีเลยนะครับ",
            "ถามได้เลยครับ เราพร้อมตอบทุกคำถาม",
            "ดีที่ถามครับ! รายละเอียดจะอธิบายให้ฟังเลย",
        ],
        CommentIntent::General => &[],
    }
}

const WELCOME_LINE: &str =
    "สวัสดีครับทุกคน! วันนี้เรามาขายของกันแบบสดๆ ร้อนๆ มี AI มาช่วยนำเสนอสินค้าด้วยนะครับ!";
const FAREWELL_LINE: &str = "ขอบคุณทุกคนที่ติดตามครับ! แล้วเจอกันใหม่ไลฟ์หน้านะครับ!";

/// Running totals for one live session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub comments_processed: u64,
    pub auto_responses_sent: u64,
    pub products_presented: u64,
    pub speeches_queued: u64,
    pub started_at_ms: Option<i64>,
}

/// Session status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub active: bool,
    pub auto_response_enabled: bool,
    pub current_product: Option<String>,
    pub stats: SessionStats,
    pub orchestrator: OrchestratorStatus,
}

/// Policy layer tying comments, products and the orchestrator together.
pub struct SessionHub {
    orchestrator: Arc<SpeechOrchestrator>,
    platform: Option<Arc<dyn LivePlatform>>,
    scripts: Option<Arc<dyn ScriptStore>>,
    active: AtomicBool,
    auto_response: AtomicBool,
    template_cursor: AtomicUsize,
    current_product: Mutex<Option<Product>>,
    stats: Mutex<SessionStats>,
}

impl SessionHub {
    pub fn new(orchestrator: Arc<SpeechOrchestrator>) -> Self {
        Self {
            orchestrator,
            platform: None,
            scripts: None,
            active: AtomicBool::new(false),
            auto_response: AtomicBool::new(true),
            template_cursor: AtomicUsize::new(0),
            current_product: Mutex::new(None),
            stats: Mutex::new(SessionStats::default()),
        }
    }

    pub fn with_platform(mut self, platform: Arc<dyn LivePlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_script_store(mut self, scripts: Arc<dyn ScriptStore>) -> Self {
        self.scripts = Some(scripts);
        self
    }

    pub fn orchestrator(&self) -> Arc<SpeechOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a session: fresh queue, welcome line at NORMAL priority.
    pub async fn start_session(&self) -> Result<()> {
        info!(target = "session", "Starting live commerce session");
        self.active.store(true, Ordering::SeqCst);
        {
            let mut stats = self.stats.lock().await;
            *stats = SessionStats {
                started_at_ms: Some(now_ms()),
                ..SessionStats::default()
            };
        }
        self.orchestrator.clear_queue(false).await;
        self.queue_speech(
            WELCOME_LINE,
            SpeechPriority::Normal,
            "session_start",
        )
        .await?;
        Ok(())
    }

    /// End the session: keep only HIGH/URGENT leftovers, say goodbye.
    pub async fn stop_session(&self) -> Result<()> {
        self.active.store(false, Ordering::SeqCst);
        self.orchestrator.clear_queue(true).await;
        self.queue_speech(FAREWELL_LINE, SpeechPriority::High, "session_end")
            .await?;
        let stats = self.stats.lock().await.clone();
        info!(
            target = "session",
            comments = stats.comments_processed,
            responses = stats.auto_responses_sent,
            products = stats.products_presented,
            speeches = stats.speeches_queued,
            "Live commerce session ended"
        );
        Ok(())
    }

    /// Process one inbound comment: classify, answer, and bump a
    /// product pitch when the viewer signals interest.
    pub async fn handle_comment(&self, user_name: &str, message: &str) -> Result<CommentIntent> {
        let intent = classify_comment(message);
        {
            let mut stats = self.stats.lock().await;
            stats.comments_processed += 1;
        }
        info!(target = "session", user = %user_name, intent = ?intent, "Comment received");

        if self.auto_response.load(Ordering::SeqCst) {
            if let Some(response) = self.compose_response(intent, user_name) {
                if let Some(platform) = &self.platform {
                    // Outbound glue is best effort; a platform error
                    // never blocks the spoken response.
                    if let Err(err) = platform.post_response(&response).await {
                        warn!(target = "session", error = %err, "Platform response failed");
                    }
                }
                let priority = match intent {
                    CommentIntent::PriceInquiry
                    | CommentIntent::Interest
                    | CommentIntent::Question => Some(SpeechPriority::High),
                    CommentIntent::Greeting => Some(SpeechPriority::Normal),
                    CommentIntent::General => None,
                };
                if let Some(priority) = priority {
                    self.queue_speech(&response, priority, "chat_response").await?;
                    let mut stats = self.stats.lock().await;
                    stats.auto_responses_sent += 1;
                }
            }
        }

        if intent == CommentIntent::Interest {
            let product = self.current_product.lock().await.clone();
            if let Some(product) = product {
                self.present_product(&product).await?;
            }
        }

        Ok(intent)
    }

    fn compose_response(&self, intent: CommentIntent, user_name: &str) -> Option<String> {
        let templates = templates_for(intent);
        if templates.is_empty() {
            return None;
        }
        let index = self.template_cursor.fetch_add(1, Ordering::Relaxed) % templates.len();
        let base = templates[index];
        if user_name.is_empty() || user_name == "Unknown" {
            Some(base.to_string())
        } else {
            Some(format!("คุณ{user_name} {base}"))
        }
    }

    /// Present a product: saved script when the store has one, else a
    /// generated pitch line.
    pub async fn present_product(&self, product: &Product) -> Result<()> {
        *self.current_product.lock().await = Some(product.clone());

        let script = self
            .scripts
            .as_ref()
            .and_then(|store| store.script_for(&product.id));
        let content = match script {
            Some(script) => script.content,
            None => format!(
                "ขอแนะนำ {} ครับ {} ในราคา {:.0} บาท สินค้าคุณภาพดี ราคาพิเศษ!",
                product.name, product.description, product.price
            ),
        };

        self.queue_speech(&content, SpeechPriority::Normal, "product_presentation")
            .await?;
        if let Some(platform) = &self.platform {
            if let Err(err) = platform.post_response(&content).await {
                warn!(target = "session", error = %err, "Platform pitch post failed");
            }
        }
        let mut stats = self.stats.lock().await;
        stats.products_presented += 1;
        Ok(())
    }

    pub async fn set_auto_response(&self, enabled: bool) -> Result<()> {
        self.auto_response.store(enabled, Ordering::SeqCst);
        let announcement = if enabled {
            "เปิดระบบตอบกลับอัตโนมัติแล้วครับ"
        } else {
            "ปิดระบบตอบกลับอัตโนมัติแล้วครับ"
        };
        self.queue_speech(announcement, SpeechPriority::Normal, "system_announcement")
            .await?;
        Ok(())
    }

    async fn queue_speech(
        &self,
        text: &str,
        priority: SpeechPriority,
        source: &str,
    ) -> Result<String> {
        let id = self
            .orchestrator
            .speak(text, priority, false, source, None)
            .await?;
        let mut stats = self.stats.lock().await;
        stats.speeches_queued += 1;
        Ok(id)
    }

    pub async fn status(&self) -> SessionStatus {
        SessionStatus {
            active: self.is_active(),
            auto_response_enabled: self.auto_response.load(Ordering::SeqCst),
            current_product: self
                .current_product
                .lock()
                .await
                .as_ref()
                .map(|p| p.name.clone()),
            stats: self.stats.lock().await.clone(),
            orchestrator: self.orchestrator.status().await,
        }
    }
}
