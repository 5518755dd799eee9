// Enterprise cloud back-end: regional endpoint, subscription key,
// SSML body with expressive style and prosody.
use super::{SynthesisRequest, VoiceProvider};
use crate::config::TtsConfig;
use crate::voices::{build_ssml, ProviderId};
use crate::{TtsError, TtsResult};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const OUTPUT_FORMAT: &str = "riff-22050hz-16bit-mono-pcm";

pub struct EnterpriseProvider {
    subscription_key: Option<String>,
    region: String,
    client: reqwest::Client,
}

impl EnterpriseProvider {
    pub fn new(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            subscription_key: config.enterprise_key.clone(),
            region: config.enterprise_region.clone(),
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }
}

#[async_trait]
impl VoiceProvider for EnterpriseProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Enterprise
    }

    fn is_available(&self) -> bool {
        self.subscription_key.is_some()
    }

    async fn synthesize(&self, request: &SynthesisRequest, out_path: &Path) -> TtsResult<()> {
        let key = self
            .subscription_key
            .as_ref()
            .ok_or(TtsError::ProviderUnavailable("enterprise"))?;

        let ssml = build_ssml(
            &request.text,
            &request.voice,
            &request.emotion,
            request.intensity,
        );
        debug!(
            target = "tts",
            provider = "enterprise",
            region = %self.region,
            voice = %request.voice.voice_id,
            "Requesting enterprise synthesis"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("Ocp-Apim-Subscription-Key", key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .body(ssml)
            .send()
            .await
            .map_err(|e| TtsError::SynthesisFailed(format!("enterprise request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TtsError::SynthesisFailed(format!(
                "enterprise endpoint returned status {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            TtsError::SynthesisFailed(format!("enterprise body read failed: {e}"))
        })?;
        if bytes.is_empty() {
            return Err(TtsError::SynthesisFailed(
                "enterprise returned no audio".into(),
            ));
        }

        tokio::fs::write(out_path, &bytes).await?;
        Ok(())
    }
}
