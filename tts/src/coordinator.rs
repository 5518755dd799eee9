// Generation coordinator: one call in, one servable artifact out.
//
// Walks the provider chain in preference order, post-processes the
// winning clip and names artifacts so regenerating the same text
// replaces the previous file instead of piling up.
use crate::audio::AudioProcessor;
use crate::config::TtsConfig;
use crate::providers::{
    BasicProvider, EnterpriseProvider, NeuralProvider, PremiumProvider, SynthesisRequest,
    VoiceProvider,
};
use crate::sanitize::sanitize_text;
use crate::util::now_ms;
use crate::voices::{native_emotion, ProviderId, VoiceConfig, FALLBACK_ORDER};
use crate::{TtsError, TtsResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One synthesis job. Defaults mirror a neutral Thai presenter line.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub text: String,
    /// Preferred back-end; tried first, ahead of the fallback order.
    pub provider: Option<ProviderId>,
    pub voice: VoiceConfig,
    pub emotion: String,
    pub intensity: f32,
    pub language: String,
    /// Artifact title for metadata; defaults to the leading text.
    pub title: Option<String>,
}

impl GenerationRequest {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            provider: None,
            voice: VoiceConfig::default(),
            emotion: "neutral".to_string(),
            intensity: 1.0,
            language: "th".to_string(),
            title: None,
        }
    }

    pub fn with_emotion(mut self, emotion: &str) -> Self {
        self.emotion = emotion.to_string();
        self
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_voice(mut self, voice: VoiceConfig) -> Self {
        self.voice = voice;
        self
    }
}

/// A finished artifact on disk plus the URL it is served under.
#[derive(Debug, Clone)]
pub struct GeneratedAudioArtifact {
    pub file_path: PathBuf,
    pub url: String,
    pub provider: ProviderId,
    pub emotion: String,
    pub generated_at_ms: i64,
}

pub struct TtsCoordinator {
    config: TtsConfig,
    providers: Vec<Arc<dyn VoiceProvider>>,
    processor: AudioProcessor,
}

impl TtsCoordinator {
    pub fn new(config: TtsConfig) -> Self {
        let providers: Vec<Arc<dyn VoiceProvider>> = vec![
            Arc::new(NeuralProvider::new(&config)),
            Arc::new(PremiumProvider::new(&config)),
            Arc::new(EnterpriseProvider::new(&config)),
            Arc::new(BasicProvider::new(config.target_sample_rate)),
        ];
        Self::with_providers(config, providers)
    }

    /// Inject a custom provider set; used by tests and embedders.
    pub fn with_providers(config: TtsConfig, providers: Vec<Arc<dyn VoiceProvider>>) -> Self {
        let processor = AudioProcessor::with_target_rate(config.target_sample_rate);
        Self {
            config,
            providers,
            processor,
        }
    }

    pub fn config(&self) -> &TtsConfig {
        &self.config
    }

    /// Synthesize one request, walking the provider chain until a
    /// back-end produces audio. Returns the final processed artifact.
    pub async fn generate_speech(
        &self,
        request: &GenerationRequest,
    ) -> TtsResult<GeneratedAudioArtifact> {
        let text = sanitize_text(&request.text);
        if text.is_empty() {
            return Err(TtsError::InvalidInput(
                "text empty after sanitization".to_string(),
            ));
        }

        tokio::fs::create_dir_all(&self.config.audio_dir).await?;

        let hash = format!("{:x}", md5::compute(text.as_bytes()));
        let hash8 = &hash[..8];
        let generated_at_ms = now_ms();
        let filename = format!("speech_{hash8}_{generated_at_ms}.wav");
        let final_path = self.config.audio_dir.join(&filename);
        let tmp_path = self.config.audio_dir.join(format!("{filename}.tmp.wav"));

        // Same text regenerated supersedes the previous artifact.
        self.remove_stale_artifacts(hash8, &filename).await;

        let chain = self.provider_chain(request.provider);
        let mut last_error: Option<TtsError> = None;

        for provider in chain {
            if !provider.is_available() {
                debug!(
                    target = "tts",
                    provider = provider.id().as_str(),
                    "Skipping unavailable provider"
                );
                continue;
            }
            if let Some(ref err) = last_error {
                warn!(
                    target = "tts",
                    next = provider.id().as_str(),
                    error = %err,
                    "Provider failed, falling back"
                );
            }

            let synth = SynthesisRequest {
                text: text.clone(),
                voice: request.voice.clone(),
                emotion: native_emotion(provider.id(), &request.emotion).to_string(),
                intensity: request.intensity.clamp(0.5, 2.0),
                language: request.language.clone(),
                duration_hint: livecast_core::SpeechRequest::estimate_duration(&text),
            };

            match provider.synthesize(&synth, &tmp_path).await {
                Ok(()) => {
                    self.finalize(&tmp_path, &final_path, request, &synth.emotion);
                    info!(
                        target = "tts",
                        provider = provider.id().as_str(),
                        file = %final_path.display(),
                        "Generated speech artifact"
                    );
                    return Ok(GeneratedAudioArtifact {
                        url: format!("{}/{}", self.config.url_base, filename),
                        file_path: final_path,
                        provider: provider.id(),
                        emotion: synth.emotion,
                        generated_at_ms,
                    });
                }
                Err(err) => {
                    let _ = tokio::fs::remove_file(&tmp_path).await;
                    last_error = Some(err);
                }
            }
        }

        if let Some(err) = last_error {
            warn!(target = "tts", error = %err, "All providers exhausted");
        }
        Err(TtsError::GenerationFailed)
    }

    /// Requested provider first, then the fixed preference order.
    fn provider_chain(&self, preferred: Option<ProviderId>) -> Vec<Arc<dyn VoiceProvider>> {
        let mut order: Vec<ProviderId> = Vec::with_capacity(FALLBACK_ORDER.len() + 1);
        if let Some(id) = preferred {
            order.push(id);
        }
        for id in FALLBACK_ORDER {
            if !order.contains(&id) {
                order.push(id);
            }
        }
        order
            .into_iter()
            .filter_map(|id| {
                self.providers
                    .iter()
                    .find(|p| p.id() == id)
                    .map(Arc::clone)
            })
            .collect()
    }

    /// Post-process tmp into the final artifact. Processing failure is
    /// non-fatal: the raw synthesis output is kept as-is.
    fn finalize(
        &self,
        tmp_path: &std::path::Path,
        final_path: &std::path::Path,
        request: &GenerationRequest,
        emotion: &str,
    ) {
        let title = request
            .title
            .clone()
            .unwrap_or_else(|| preview_title(&request.text));
        match self
            .processor
            .process_file(tmp_path, final_path, &title, emotion)
        {
            Ok(()) => {
                let _ = std::fs::remove_file(tmp_path);
            }
            Err(err) => {
                warn!(
                    target = "tts",
                    error = %err,
                    "Audio post-processing failed, keeping raw synthesis output"
                );
                if let Err(rename_err) = std::fs::rename(tmp_path, final_path) {
                    warn!(
                        target = "tts",
                        error = %rename_err,
                        "Could not move raw artifact into place"
                    );
                }
            }
        }
    }

    async fn remove_stale_artifacts(&self, hash8: &str, keep: &str) {
        let prefix = format!("speech_{hash8}_");
        let mut dir = match tokio::fs::read_dir(&self.config.audio_dir).await {
            Ok(dir) => dir,
            Err(_) => return,
        };
        while let Ok(Some(entry)) = dir.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && name != keep {
                debug!(target = "tts", file = %name, "Removing superseded artifact");
                let _ = tokio::fs::remove_file(entry.path()).await;
            }
        }
    }
}

fn preview_title(text: &str) -> String {
    let mut title: String = text.chars().take(40).collect();
    if text.chars().count() > 40 {
        title.push_str("...");
    }
    title
}

#[async_trait]
impl livecast_core::SpeechGenerator for TtsCoordinator {
    async fn generate(
        &self,
        text: &str,
        emotion: Option<&str>,
    ) -> livecast_core::Result<livecast_core::GeneratedSpeech> {
        let mut request = GenerationRequest::new(text);
        if let Some(emotion) = emotion {
            request.emotion = emotion.to_string();
        }
        let artifact = self
            .generate_speech(&request)
            .await
            .map_err(|e| livecast_core::LivecastError::GenerationError(e.to_string()))?;
        Ok(livecast_core::GeneratedSpeech {
            file_path: artifact.file_path.to_string_lossy().into_owned(),
            audio_url: artifact.url,
        })
    }
}
