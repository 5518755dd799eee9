// Provider adapters: one uniform contract over interchangeable
// synthesis back-ends.

mod basic;
mod enterprise;
mod neural;
mod premium;

pub use basic::BasicProvider;
pub use enterprise::EnterpriseProvider;
pub use neural::NeuralProvider;
pub use premium::PremiumProvider;

use crate::voices::{ProviderId, VoiceConfig};
use crate::TtsResult;
use async_trait::async_trait;
use std::path::Path;

/// Everything a back-end needs for one synthesis attempt. The text is
/// already sanitized and the emotion already mapped to the provider's
/// native vocabulary.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: VoiceConfig,
    pub emotion: String,
    pub intensity: f32,
    pub language: String,
    /// Estimated speech length, used by degraded last-resort output.
    pub duration_hint: f64,
}

/// Uniform adapter over a TTS back-end. Implementations write raw
/// audio to `out_path`; repair and metadata happen downstream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Whether this back-end can be attempted at all (keys present,
    /// endpoint configured). Unavailable providers are skipped by the
    /// fallback chain without logging an error.
    fn is_available(&self) -> bool;

    async fn synthesize(&self, request: &SynthesisRequest, out_path: &Path) -> TtsResult<()>;
}
