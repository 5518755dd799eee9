// Provider identities, voice catalogs and emotion mapping.
//
// Each back-end has its own expressive-style vocabulary; abstract
// emotion tags are mapped per provider and degrade to neutral rather
// than erroring.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Interchangeable TTS back-ends, ordered by preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Free neural provider (default).
    Neural,
    /// Premium cloud provider, needs an API key.
    Premium,
    /// Enterprise cloud provider, needs a key and region.
    Enterprise,
    /// Last-resort basic synthesizer, always assumed available.
    Basic,
}

/// Fixed fallback preference order.
pub const FALLBACK_ORDER: [ProviderId; 4] = [
    ProviderId::Neural,
    ProviderId::Premium,
    ProviderId::Enterprise,
    ProviderId::Basic,
];

impl ProviderId {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Neural => "neural",
            ProviderId::Premium => "premium",
            ProviderId::Enterprise => "enterprise",
            ProviderId::Basic => "basic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "neural" => Some(ProviderId::Neural),
            "premium" => Some(ProviderId::Premium),
            "enterprise" => Some(ProviderId::Enterprise),
            "basic" => Some(ProviderId::Basic),
            _ => None,
        }
    }
}

/// Voice settings passed by value into generation. Scalars are clamped
/// to the supported 0.5–2.0 range on construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub provider: ProviderId,
    pub voice_id: String,
    pub language: String,
    pub speed: f32,
    pub pitch: f32,
    pub volume: f32,
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

impl VoiceConfig {
    pub fn new(provider: ProviderId, voice_id: &str, language: &str) -> Self {
        Self {
            provider,
            voice_id: voice_id.to_string(),
            language: language.to_string(),
            speed: 1.0,
            pitch: 1.0,
            volume: 1.0,
            extra: HashMap::new(),
        }
    }

    pub fn with_scalars(mut self, speed: f32, pitch: f32, volume: f32) -> Self {
        self.speed = speed.clamp(0.5, 2.0);
        self.pitch = pitch.clamp(0.5, 2.0);
        self.volume = volume.clamp(0.5, 2.0);
        self
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self::new(ProviderId::Neural, "th-TH-PremwadeeNeural", "th-TH")
    }
}

/// Catalog entry describing one voice of one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub voice_id: String,
    pub name: String,
    pub language: String,
    pub gender: String,
    pub emotions: Vec<String>,
}

fn emotion_list(emotions: &[&str]) -> Vec<String> {
    emotions.iter().map(|e| e.to_string()).collect()
}

/// Static voice catalog per provider.
pub fn voices_for(provider: ProviderId) -> Vec<VoiceInfo> {
    match provider {
        ProviderId::Neural => vec![
            VoiceInfo {
                voice_id: "th-TH-PremwadeeNeural".into(),
                name: "Premwadee (Thai Female Professional)".into(),
                language: "th-TH".into(),
                gender: "female".into(),
                emotions: emotion_list(NEURAL_EMOTIONS),
            },
            VoiceInfo {
                voice_id: "th-TH-NiwatNeural".into(),
                name: "Niwat (Thai Male Casual)".into(),
                language: "th-TH".into(),
                gender: "male".into(),
                emotions: emotion_list(NEURAL_EMOTIONS),
            },
            VoiceInfo {
                voice_id: "en-US-JennyNeural".into(),
                name: "Jenny (English Female Professional)".into(),
                language: "en-US".into(),
                gender: "female".into(),
                emotions: emotion_list(NEURAL_EMOTIONS),
            },
        ],
        ProviderId::Premium => vec![
            VoiceInfo {
                voice_id: "pNInz6obpgDQGcFmaJgB".into(),
                name: "Adam (English Male)".into(),
                language: "en".into(),
                gender: "male".into(),
                emotions: emotion_list(PREMIUM_EMOTIONS),
            },
            VoiceInfo {
                voice_id: "21m00Tcm4TlvDq8ikWAM".into(),
                name: "Rachel (English Female Professional)".into(),
                language: "en".into(),
                gender: "female".into(),
                emotions: emotion_list(PREMIUM_EMOTIONS),
            },
        ],
        ProviderId::Enterprise => vec![
            VoiceInfo {
                voice_id: "th-TH-PremwadeeNeural".into(),
                name: "Premwadee Premium".into(),
                language: "th-TH".into(),
                gender: "female".into(),
                emotions: emotion_list(ENTERPRISE_EMOTIONS),
            },
            VoiceInfo {
                voice_id: "th-TH-NiwatNeural".into(),
                name: "Niwat Premium".into(),
                language: "th-TH".into(),
                gender: "male".into(),
                emotions: emotion_list(ENTERPRISE_EMOTIONS),
            },
        ],
        ProviderId::Basic => vec![VoiceInfo {
            voice_id: "default".into(),
            name: "Basic Synthesizer".into(),
            language: "th".into(),
            gender: "neutral".into(),
            emotions: emotion_list(&["neutral"]),
        }],
    }
}

const NEURAL_EMOTIONS: &[&str] = &[
    "cheerful",
    "sad",
    "angry",
    "fearful",
    "serious",
    "affectionate",
    "gentle",
];
const PREMIUM_EMOTIONS: &[&str] = &[
    "neutral", "excited", "sad", "angry", "cheerful", "serious", "gentle",
];
const ENTERPRISE_EMOTIONS: &[&str] =
    &["cheerful", "sad", "angry", "fearful", "serious", "gentle"];

fn supported_emotions(provider: ProviderId) -> &'static [&'static str] {
    match provider {
        ProviderId::Neural => NEURAL_EMOTIONS,
        ProviderId::Premium => PREMIUM_EMOTIONS,
        ProviderId::Enterprise => ENTERPRISE_EMOTIONS,
        ProviderId::Basic => &["neutral"],
    }
}

/// Map an abstract emotion tag to the provider's native vocabulary.
/// Unknown or unsupported tags degrade to "neutral".
pub fn native_emotion(provider: ProviderId, emotion: &str) -> &'static str {
    let mapped: &'static str = match emotion {
        "excited" | "happy" | "energetic" => "cheerful",
        "professional" | "confident" => "serious",
        "friendly" | "calm" => "gentle",
        "urgent" => "angry",
        other => match supported_emotions(provider)
            .iter()
            .find(|candidate| **candidate == other)
        {
            Some(found) => *found,
            None => "neutral",
        },
    };
    if supported_emotions(provider).contains(&mapped) {
        mapped
    } else {
        "neutral"
    }
}

/// Prosody adjustments per abstract emotion, used in SSML bodies.
pub fn prosody_for(emotion: &str) -> (&'static str, &'static str) {
    let rate = match emotion {
        "excited" => "+20%",
        "energetic" => "+15%",
        "urgent" => "+25%",
        "calm" => "-10%",
        "professional" => "+5%",
        "friendly" => "+10%",
        _ => "medium",
    };
    let pitch = match emotion {
        "excited" => "+15%",
        "happy" => "+10%",
        "energetic" => "+12%",
        "sad" => "-15%",
        "calm" => "-5%",
        "confident" => "+8%",
        _ => "medium",
    };
    (rate, pitch)
}

/// Emotional context prefixes for providers that steer by text alone.
pub fn emotional_prefix(emotion: &str) -> &'static str {
    match emotion {
        "excited" => "ด้วยความตื่นเต้นและกระตือรือร้น: ",
        "happy" => "ด้วยความสุขและความยินดี: ",
        "professional" => "ด้วยมาตรฐานทางวิชาชีพ: ",
        "friendly" => "ด้วยความเป็นมิตรและอบอุ่น: ",
        "confident" => "ด้วยความมั่นใจและแน่วแน่: ",
        "energetic" => "ด้วยพลังและความกระปรี้กระเปร่า: ",
        "calm" => "ด้วยความสงบและใจเย็น: ",
        "urgent" => "ด้วยความเร่งด่วนและจำกัดเวลา: ",
        _ => "",
    }
}

/// Build an expressive SSML body for providers that accept it.
pub fn build_ssml(text: &str, voice: &VoiceConfig, emotion: &str, intensity: f32) -> String {
    let style = native_emotion(voice.provider, emotion);
    let (rate, pitch) = prosody_for(emotion);
    format!(
        concat!(
            "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" ",
            "xmlns:mstts=\"https://www.w3.org/2001/mstts\" xml:lang=\"{lang}\">",
            "<voice name=\"{voice}\">",
            "<mstts:express-as style=\"{style}\" styledegree=\"{degree:.1}\">",
            "<prosody rate=\"{rate}\" pitch=\"{pitch}\">{text}</prosody>",
            "</mstts:express-as></voice></speak>"
        ),
        lang = voice.language,
        voice = voice.voice_id,
        style = style,
        degree = intensity.clamp(0.5, 2.0),
        rate = rate,
        pitch = pitch,
        text = text,
    )
}
