// Livecast TTS Library
// Multi-provider speech synthesis with mandatory audio repair

pub mod audio;
pub mod config;
pub mod coordinator;
pub mod providers;
pub mod sanitize;
pub mod voices;

pub(crate) mod util;

pub use audio::{AudioProcessor, AudioProcessorConfig};
pub use config::TtsConfig;
pub use coordinator::{GeneratedAudioArtifact, GenerationRequest, TtsCoordinator};
pub use providers::{SynthesisRequest, VoiceProvider};
pub use sanitize::sanitize_text;
pub use voices::{ProviderId, VoiceConfig, VoiceInfo, FALLBACK_ORDER};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error("Provider {0} unavailable")]
    ProviderUnavailable(&'static str),

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("All providers exhausted")]
    GenerationFailed,

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type TtsResult<T> = std::result::Result<T, TtsError>;
