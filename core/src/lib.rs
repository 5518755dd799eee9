// Livecast Core Library
// Speech orchestration engine for live-commerce presenters

pub mod event;
pub mod orchestrator;
pub mod queue;
pub mod session;

pub(crate) mod util;

// Export core types
pub use event::{ChannelStats, EventKind, SpeechChannel, SpeechEvent};
pub use orchestrator::{
    GeneratedSpeech, OrchestratorConfig, OrchestratorStatus, SpeakOptions, SpeechGenerator,
    SpeechOrchestrator,
};
pub use queue::{
    Enqueued, QueueStatus, SpeechPreview, SpeechPriority, SpeechQueue, SpeechRequest,
};
pub use session::{
    classify_comment, CommentIntent, LivePlatform, PresentationScript, Product, ScriptStore,
    SessionHub, SessionStats, SessionStatus,
};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LivecastError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Orchestrator error: {0}")]
    OrchestratorError(String),

    #[error("Speech generation error: {0}")]
    GenerationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LivecastError>;
