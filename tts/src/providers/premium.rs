// Premium cloud back-end. Steers expressiveness through text context
// rather than SSML, so the emotional prefix is prepended here.
use super::{SynthesisRequest, VoiceProvider};
use crate::config::TtsConfig;
use crate::voices::{emotional_prefix, ProviderId};
use crate::{TtsError, TtsResult};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io/v1";
const MODEL_ID: &str = "eleven_multilingual_v2";

pub struct PremiumProvider {
    api_key: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl PremiumProvider {
    pub fn new(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: config.premium_api_key.clone(),
            api_base: DEFAULT_API_BASE.to_string(),
            client,
        }
    }
}

#[async_trait]
impl VoiceProvider for PremiumProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Premium
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn synthesize(&self, request: &SynthesisRequest, out_path: &Path) -> TtsResult<()> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(TtsError::ProviderUnavailable("premium"))?;

        let text = format!("{}{}", emotional_prefix(&request.emotion), request.text);
        let url = format!(
            "{}/text-to-speech/{}",
            self.api_base,
            urlencoding::encode(&request.voice.voice_id)
        );
        debug!(
            target = "tts",
            provider = "premium",
            voice = %request.voice.voice_id,
            "Requesting premium synthesis"
        );

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .json(&json!({
                "text": text,
                "model_id": MODEL_ID,
                "voice_settings": {
                    "stability": 0.5,
                    "similarity_boost": 0.75,
                    "style": request.intensity.clamp(0.5, 2.0) / 2.0,
                },
            }))
            .send()
            .await
            .map_err(|e| TtsError::SynthesisFailed(format!("premium request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TtsError::SynthesisFailed(format!(
                "premium endpoint returned status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::SynthesisFailed(format!("premium body read failed: {e}")))?;
        if bytes.is_empty() {
            return Err(TtsError::SynthesisFailed("premium returned no audio".into()));
        }

        tokio::fs::write(out_path, &bytes).await?;
        Ok(())
    }
}
