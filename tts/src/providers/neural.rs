// Free neural synthesis back-end over HTTP.
//
// Sends plain text, never SSML: concatenation artifacts from reused
// SSML buffers on this service were the original source of stale
// audio leaking between requests.
use super::{SynthesisRequest, VoiceProvider};
use crate::config::TtsConfig;
use crate::voices::ProviderId;
use crate::{TtsError, TtsResult};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub struct NeuralProvider {
    endpoint: String,
    client: reqwest::Client,
}

impl NeuralProvider {
    pub fn new(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint: config.neural_endpoint.clone(),
            client,
        }
    }
}

#[async_trait]
impl VoiceProvider for NeuralProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Neural
    }

    fn is_available(&self) -> bool {
        !self.endpoint.is_empty()
    }

    async fn synthesize(&self, request: &SynthesisRequest, out_path: &Path) -> TtsResult<()> {
        debug!(
            target = "tts",
            provider = "neural",
            voice = %request.voice.voice_id,
            emotion = %request.emotion,
            "Requesting neural synthesis"
        );

        let body = json!({
            "text": request.text,
            "voice": request.voice.voice_id,
            "style": request.emotion,
            "rate": request.voice.speed,
            "pitch": request.voice.pitch,
            "volume": request.voice.volume,
            "language": request.language,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::SynthesisFailed(format!("neural request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TtsError::SynthesisFailed(format!(
                "neural endpoint returned status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::SynthesisFailed(format!("neural body read failed: {e}")))?;
        if bytes.is_empty() {
            return Err(TtsError::SynthesisFailed("neural returned no audio".into()));
        }

        tokio::fs::write(out_path, &bytes).await?;
        Ok(())
    }
}
