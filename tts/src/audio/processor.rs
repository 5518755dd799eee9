// Artifact repair stage between synthesis and the player.
//
// Trims leading/trailing silence with windowed RMS, normalizes the
// peak, resamples to the stream rate and rewrites metadata. Every
// step has a guard rail so a weird clip degrades instead of breaking.
use super::wav::{read_wav, write_wav_with_info, WavData, WavInfo};
use crate::TtsResult;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct AudioProcessorConfig {
    /// Windows quieter than this count as silence.
    pub silence_threshold_db: f64,
    /// RMS analysis window.
    pub window_ms: u32,
    /// Clips trimmed shorter than this get the conservative trim.
    pub min_duration_secs: f64,
    /// Clips still longer than this get cut to the loudest span.
    pub max_duration_secs: f64,
    /// Span kept when an over-long clip is rescued.
    pub rescue_window_secs: f64,
    /// Sample rate every artifact is resampled to.
    pub target_sample_rate: u32,
    /// Peak level after normalization, in dBFS.
    pub peak_dbfs: f64,
}

impl Default for AudioProcessorConfig {
    fn default() -> Self {
        Self {
            silence_threshold_db: -50.0,
            window_ms: 100,
            min_duration_secs: 0.5,
            max_duration_secs: 30.0,
            rescue_window_secs: 5.0,
            target_sample_rate: 22_050,
            peak_dbfs: -1.0,
        }
    }
}

pub struct AudioProcessor {
    config: AudioProcessorConfig,
}

impl AudioProcessor {
    pub fn new(config: AudioProcessorConfig) -> Self {
        Self { config }
    }

    pub fn with_target_rate(target_sample_rate: u32) -> Self {
        Self::new(AudioProcessorConfig {
            target_sample_rate,
            ..AudioProcessorConfig::default()
        })
    }

    /// Full repair of one artifact on disk. Reads `input`, writes the
    /// cleaned clip with fresh metadata to `output`. Callers treat an
    /// error here as non-fatal and keep the raw file.
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        title: &str,
        emotion: &str,
    ) -> TtsResult<()> {
        let wav = read_wav(input)?;
        let before_secs = wav.duration_secs();
        let cleaned = self.process(wav);
        let info = WavInfo {
            title: title.to_string(),
            artist: "Livecast TTS".to_string(),
            genre: format!("Speech/{emotion}"),
            creation_date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
        };
        write_wav_with_info(output, &cleaned, &info)?;
        info!(
            target = "tts",
            input = %input.display(),
            before_secs = format!("{before_secs:.2}"),
            after_secs = format!("{:.2}", cleaned.duration_secs()),
            "Post-processed audio artifact"
        );
        Ok(())
    }

    /// Pure repair pipeline: trim, normalize, resample.
    pub fn process(&self, wav: WavData) -> WavData {
        let trimmed = self.trim_silence(wav);
        let normalized = self.normalize_peak(trimmed);
        self.resample(normalized)
    }

    fn trim_silence(&self, wav: WavData) -> WavData {
        let window_frames =
            (wav.sample_rate as u64 * self.config.window_ms as u64 / 1000) as usize;
        let frames = wav.frame_count();
        if window_frames == 0 || frames < window_frames * 2 {
            return wav;
        }

        let levels = self.window_levels(&wav, window_frames);
        let loud = |db: f64| db > self.config.silence_threshold_db;

        let first_loud = levels.iter().position(|&db| loud(db));
        let last_loud = levels.iter().rposition(|&db| loud(db));
        let (first_loud, last_loud) = match (first_loud, last_loud) {
            (Some(a), Some(b)) => (a, b),
            // All silence; leave the clip alone.
            _ => return wav,
        };

        // Keep one window of lead-in and two of tail room.
        let start_win = first_loud.saturating_sub(1);
        let end_win = (last_loud + 3).min(levels.len());

        let mut start_frame = start_win * window_frames;
        let mut end_frame = (end_win * window_frames).min(frames);

        let span_secs = (end_frame - start_frame) as f64 / wav.sample_rate as f64;
        if span_secs < self.config.min_duration_secs {
            // The detector probably ate real speech; only shave the
            // outer 10% from each side of the original clip.
            debug!(
                target = "tts",
                span_secs = format!("{span_secs:.2}"),
                "Trimmed span too short, applying conservative trim"
            );
            start_frame = frames / 10;
            end_frame = frames - frames / 10;
        } else if span_secs > self.config.max_duration_secs {
            // Runaway clip; keep the loudest contiguous span.
            debug!(
                target = "tts",
                span_secs = format!("{span_secs:.2}"),
                "Trimmed span too long, keeping loudest window"
            );
            let rescue_wins = (self.config.rescue_window_secs * 1000.0
                / self.config.window_ms as f64)
                .round() as usize;
            let (s, e) = loudest_span(&levels, rescue_wins.max(1));
            start_frame = s * window_frames;
            end_frame = (e * window_frames).min(frames);
        }

        let ch = wav.channels as usize;
        let samples = wav.samples[start_frame * ch..end_frame * ch].to_vec();
        WavData {
            sample_rate: wav.sample_rate,
            channels: wav.channels,
            samples,
        }
    }

    /// Per-window dBFS from RMS of the mono mix.
    fn window_levels(&self, wav: &WavData, window_frames: usize) -> Vec<f64> {
        let ch = wav.channels as usize;
        let frames = wav.frame_count();
        let mut levels = Vec::with_capacity(frames / window_frames + 1);
        let mut frame = 0;
        while frame < frames {
            let end = (frame + window_frames).min(frames);
            let mut sum_sq = 0.0f64;
            for f in frame..end {
                let mut mono = 0.0f64;
                for c in 0..ch {
                    mono += wav.samples[f * ch + c] as f64;
                }
                mono /= ch as f64 * i16::MAX as f64;
                sum_sq += mono * mono;
            }
            let rms = (sum_sq / (end - frame) as f64).sqrt();
            levels.push(if rms > 0.0 {
                20.0 * rms.log10()
            } else {
                f64::NEG_INFINITY
            });
            frame = end;
        }
        levels
    }

    fn normalize_peak(&self, mut wav: WavData) -> WavData {
        let peak = wav
            .samples
            .iter()
            .map(|s| (*s as i32).abs())
            .max()
            .unwrap_or(0);
        if peak == 0 {
            return wav;
        }
        let target = 10f64.powf(self.config.peak_dbfs / 20.0) * i16::MAX as f64;
        let gain = target / peak as f64;
        // Never amplify noise floors aggressively; gain is capped.
        let gain = gain.min(8.0);
        if (gain - 1.0).abs() < 0.01 {
            return wav;
        }
        for s in wav.samples.iter_mut() {
            let scaled = (*s as f64 * gain).round();
            *s = scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        }
        wav
    }

    fn resample(&self, wav: WavData) -> WavData {
        let target = self.config.target_sample_rate;
        if wav.sample_rate == target || wav.sample_rate == 0 {
            return wav;
        }
        let ch = wav.channels as usize;
        let in_frames = wav.frame_count();
        if in_frames < 2 {
            return wav;
        }
        let out_frames =
            ((in_frames as u64 * target as u64) / wav.sample_rate as u64) as usize;
        let mut samples = vec![0i16; out_frames * ch];
        let step = (in_frames - 1) as f64 / (out_frames.max(2) - 1) as f64;
        for (out_f, chunk) in samples.chunks_exact_mut(ch).enumerate() {
            let pos = out_f as f64 * step;
            let base = pos.floor() as usize;
            let frac = pos - base as f64;
            let next = (base + 1).min(in_frames - 1);
            for (c, slot) in chunk.iter_mut().enumerate() {
                let a = wav.samples[base * ch + c] as f64;
                let b = wav.samples[next * ch + c] as f64;
                *slot = (a + (b - a) * frac).round() as i16;
            }
        }
        WavData {
            sample_rate: target,
            channels: wav.channels,
            samples,
        }
    }
}

/// Start/end window indices of the loudest contiguous run of
/// `span_wins` windows.
fn loudest_span(levels: &[f64], span_wins: usize) -> (usize, usize) {
    let span = span_wins.min(levels.len());
    if span == 0 {
        return (0, levels.len());
    }
    let energy = |db: &f64| {
        if db.is_finite() {
            10f64.powf(db / 10.0)
        } else {
            0.0
        }
    };
    let mut best_start = 0;
    let mut window_sum: f64 = levels[..span].iter().map(energy).sum();
    let mut best_sum = window_sum;
    for start in 1..=levels.len() - span {
        window_sum += energy(&levels[start + span - 1]) - energy(&levels[start - 1]);
        if window_sum > best_sum {
            best_sum = window_sum;
            best_start = start;
        }
    }
    (best_start, best_start + span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(sample_rate: u32, secs: f64, amplitude: i16) -> Vec<i16> {
        let frames = (sample_rate as f64 * secs) as usize;
        (0..frames)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (amplitude as f64 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as i16
            })
            .collect()
    }

    fn silence(sample_rate: u32, secs: f64) -> Vec<i16> {
        vec![0i16; (sample_rate as f64 * secs) as usize]
    }

    #[test]
    fn trims_long_leading_silence() {
        let rate = 22_050;
        let mut samples = silence(rate, 2.5);
        samples.extend(tone(rate, 2.0, 12_000));
        let wav = WavData {
            sample_rate: rate,
            channels: 1,
            samples,
        };
        let processor = AudioProcessor::new(AudioProcessorConfig::default());
        let out = processor.process(wav);
        // Speech starts within the first lead-in window.
        assert!(out.duration_secs() < 2.5);
        assert!(out.duration_secs() > 1.5);
        let lead_frames = (rate as f64 * 0.6) as usize;
        let lead_peak = out.samples[..lead_frames.min(out.samples.len())]
            .iter()
            .map(|s| (*s as i32).abs())
            .max()
            .unwrap_or(0);
        assert!(lead_peak > 1_000, "speech should begin almost immediately");
    }

    #[test]
    fn short_clip_gets_conservative_trim() {
        let rate = 22_050;
        // A single click surrounded by silence trims to under the
        // minimum, so only the outer 10% per side may go.
        let mut samples = silence(rate, 1.0);
        samples.extend(tone(rate, 0.05, 10_000));
        samples.extend(silence(rate, 1.0));
        let total = samples.len();
        let wav = WavData {
            sample_rate: rate,
            channels: 1,
            samples,
        };
        let processor = AudioProcessor::new(AudioProcessorConfig::default());
        let out = processor.process(wav);
        assert!(out.samples.len() >= total - 2 * (total / 10) - 1);
    }

    #[test]
    fn all_silence_left_untouched_by_trim() {
        let rate = 22_050;
        let wav = WavData {
            sample_rate: rate,
            channels: 1,
            samples: silence(rate, 1.5),
        };
        let frames = wav.frame_count();
        let processor = AudioProcessor::new(AudioProcessorConfig::default());
        let out = processor.process(wav);
        assert_eq!(out.frame_count(), frames);
    }

    #[test]
    fn resamples_to_target_rate() {
        let wav = WavData {
            sample_rate: 44_100,
            channels: 1,
            samples: tone(44_100, 1.0, 8_000),
        };
        let processor = AudioProcessor::with_target_rate(22_050);
        let out = processor.resample(wav);
        assert_eq!(out.sample_rate, 22_050);
        assert!((out.frame_count() as i64 - 22_050).abs() <= 2);
    }

    #[test]
    fn normalization_raises_quiet_peaks() {
        let wav = WavData {
            sample_rate: 22_050,
            channels: 1,
            samples: tone(22_050, 0.5, 4_000),
        };
        let processor = AudioProcessor::new(AudioProcessorConfig::default());
        let out = processor.normalize_peak(wav);
        let peak = out.samples.iter().map(|s| (*s as i32).abs()).max().unwrap();
        assert!(peak > 20_000);
    }

    #[test]
    fn overlong_clip_cut_to_rescue_window() {
        let rate = 8_000; // keep the test fast
        let mut samples = tone(rate, 20.0, 3_000);
        samples.extend(tone(rate, 5.0, 14_000));
        samples.extend(tone(rate, 20.0, 3_000));
        let wav = WavData {
            sample_rate: rate,
            channels: 1,
            samples,
        };
        let processor = AudioProcessor::new(AudioProcessorConfig {
            target_sample_rate: rate,
            ..AudioProcessorConfig::default()
        });
        let out = processor.process(wav);
        assert!(out.duration_secs() < 6.0);
        let peak = out.samples.iter().map(|s| (*s as i32).abs()).max().unwrap();
        assert!(peak > 10_000, "kept span should be the loud one");
    }
}
