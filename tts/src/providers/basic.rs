// Last-resort synthesizer. Prefers a local espeak-ng binary; when none
// is installed it renders a silent clip spanning the estimated speech
// duration, so the chain always ends with a servable file.
use super::{SynthesisRequest, VoiceProvider};
use crate::audio::wav::{write_wav, WavData};
use crate::util::get_from_path;
use crate::voices::ProviderId;
use crate::{TtsError, TtsResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

pub struct BasicProvider {
    espeak_bin: Option<PathBuf>,
    sample_rate: u32,
}

impl BasicProvider {
    pub fn new(sample_rate: u32) -> Self {
        let espeak_bin = std::env::var("ESPEAK_BIN")
            .ok()
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .or_else(|| get_from_path("espeak-ng"))
            .or_else(|| get_from_path("espeak"));
        if let Some(ref bin) = espeak_bin {
            info!(target = "tts", bin = ?bin, "Detected espeak binary for basic synthesis");
        }
        Self {
            espeak_bin,
            sample_rate,
        }
    }

    async fn synth_with_espeak(
        &self,
        bin: &Path,
        request: &SynthesisRequest,
        out_wav: &Path,
    ) -> TtsResult<()> {
        let wpm = (160.0 * request.voice.speed).round().clamp(80.0, 450.0) as i32;
        let amp = (100.0 * request.voice.volume).round().clamp(50.0, 200.0) as i32;

        let mut cmd = Command::new(bin);
        if !request.language.is_empty() {
            cmd.arg("-v").arg(&request.language);
        }
        cmd.arg("-s").arg(wpm.to_string());
        cmd.arg("-a").arg(amp.to_string());
        cmd.arg("-w").arg(out_wav);
        cmd.arg(&request.text);

        debug!(target = "tts", command = ?cmd, "Running espeak");
        let output = cmd.output().await.map_err(TtsError::IoError)?;
        if !output.status.success() {
            return Err(TtsError::SynthesisFailed(format!(
                "espeak failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }

    fn write_silent_wav(&self, duration_secs: f64, out_wav: &Path) -> TtsResult<()> {
        let frames = (duration_secs.max(0.5) * self.sample_rate as f64) as usize;
        let wav = WavData {
            sample_rate: self.sample_rate,
            channels: 1,
            samples: vec![0i16; frames],
        };
        write_wav(out_wav, &wav)
    }
}

#[async_trait]
impl VoiceProvider for BasicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Basic
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn synthesize(&self, request: &SynthesisRequest, out_path: &Path) -> TtsResult<()> {
        if let Some(bin) = self.espeak_bin.clone() {
            match self.synth_with_espeak(&bin, request, out_path).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(target = "tts", error = %err, "espeak synthesis failed; writing silent clip");
                }
            }
        }
        // Silent floor-holder; the presenter still occupies its slot.
        self.write_silent_wav(request.duration_hint, out_path)
    }
}
