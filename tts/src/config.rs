// TTS pipeline configuration
//
// Env overrides:
// - LIVECAST_AUDIO_DIR, LIVECAST_AUDIO_URL_BASE
// - NEURAL_TTS_ENDPOINT
// - PREMIUM_TTS_API_KEY
// - ENTERPRISE_TTS_KEY, ENTERPRISE_TTS_REGION
// - TTS_TIMEOUT_MS
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Where final artifacts land.
    pub audio_dir: PathBuf,
    /// URL prefix under which `audio_dir` is served.
    pub url_base: String,
    /// Free neural synthesis endpoint.
    pub neural_endpoint: String,
    /// Premium cloud provider key; provider is skipped when absent.
    pub premium_api_key: Option<String>,
    /// Enterprise cloud provider key and region.
    pub enterprise_key: Option<String>,
    pub enterprise_region: String,
    /// Per-request HTTP timeout.
    pub timeout_ms: u64,
    /// Sample rate every artifact is resampled to.
    pub target_sample_rate: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        let audio_dir = std::env::var("LIVECAST_AUDIO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public/audio"));
        let url_base = std::env::var("LIVECAST_AUDIO_URL_BASE")
            .unwrap_or_else(|_| "/static/audio".to_string());
        let neural_endpoint = std::env::var("NEURAL_TTS_ENDPOINT")
            .unwrap_or_else(|_| "http://127.0.0.1:5500/api/tts".to_string());
        let premium_api_key = std::env::var("PREMIUM_TTS_API_KEY").ok();
        let enterprise_key = std::env::var("ENTERPRISE_TTS_KEY").ok();
        let enterprise_region = std::env::var("ENTERPRISE_TTS_REGION")
            .unwrap_or_else(|_| "southeastasia".to_string());
        let timeout_ms = std::env::var("TTS_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(20_000);

        Self {
            audio_dir,
            url_base,
            neural_endpoint,
            premium_api_key,
            enterprise_key,
            enterprise_region,
            timeout_ms,
            target_sample_rate: 22_050,
        }
    }
}
