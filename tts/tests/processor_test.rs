use livecast_tts::audio::wav::{read_info_tags, read_wav, write_wav, WavData};
use livecast_tts::{AudioProcessor, AudioProcessorConfig};
use std::path::PathBuf;

fn temp_wav(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("livecast_proc_{}_{}.wav", std::process::id(), tag))
}

fn tone(sample_rate: u32, secs: f64, amplitude: i16) -> Vec<i16> {
    let frames = (sample_rate as f64 * secs) as usize;
    (0..frames)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (amplitude as f64 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as i16
        })
        .collect()
}

#[test]
fn long_leading_silence_is_trimmed() {
    let rate = 22_050;
    // 2.5 s of digital silence, then 2 s of speech-level tone.
    let mut samples = vec![0i16; (rate as f64 * 2.5) as usize];
    samples.extend(tone(rate, 2.0, 12_000));

    let input = temp_wav("silence_in");
    let output = temp_wav("silence_out");
    write_wav(
        &input,
        &WavData {
            sample_rate: rate,
            channels: 1,
            samples,
        },
    )
    .unwrap();

    let processor = AudioProcessor::new(AudioProcessorConfig::default());
    processor
        .process_file(&input, &output, "trim test", "neutral")
        .unwrap();

    let cleaned = read_wav(&output).unwrap();
    // Whatever silence is left in front must be under 0.6 s.
    let threshold = 500i16;
    let first_loud = cleaned
        .samples
        .iter()
        .position(|s| s.abs() > threshold)
        .expect("speech survived the trim");
    let leading_secs = first_loud as f64 / cleaned.sample_rate as f64;
    assert!(
        leading_secs < 0.6,
        "leading silence still {leading_secs:.2}s after trim"
    );

    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&output);
}

#[test]
fn processed_artifact_carries_fresh_metadata_only() {
    let rate = 22_050;
    let input = temp_wav("meta_in");
    let output = temp_wav("meta_out");
    write_wav(
        &input,
        &WavData {
            sample_rate: rate,
            channels: 1,
            samples: tone(rate, 1.0, 10_000),
        },
    )
    .unwrap();

    let processor = AudioProcessor::new(AudioProcessorConfig::default());
    processor
        .process_file(&input, &output, "โปรโมชั่นพิเศษ", "excited")
        .unwrap();

    let tags = read_info_tags(&output).unwrap();
    let get = |id: &str| {
        tags.iter()
            .find(|(tag, _)| tag == id)
            .map(|(_, value)| value.as_str())
    };
    assert_eq!(get("INAM"), Some("โปรโมชั่นพิเศษ"));
    assert_eq!(get("IART"), Some("Livecast TTS"));
    assert_eq!(get("IGNR"), Some("Speech/excited"));
    assert!(get("ICRD").is_some());

    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&output);
}

#[test]
fn mismatched_sample_rate_is_converted() {
    let input = temp_wav("rate_in");
    let output = temp_wav("rate_out");
    write_wav(
        &input,
        &WavData {
            sample_rate: 44_100,
            channels: 1,
            samples: tone(44_100, 1.0, 10_000),
        },
    )
    .unwrap();

    let processor = AudioProcessor::new(AudioProcessorConfig::default());
    processor
        .process_file(&input, &output, "resample", "neutral")
        .unwrap();

    let cleaned = read_wav(&output).unwrap();
    assert_eq!(cleaned.sample_rate, 22_050);

    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&output);
}

#[test]
fn unreadable_input_is_an_error_not_a_panic() {
    let input = temp_wav("garbage_in");
    let output = temp_wav("garbage_out");
    std::fs::write(&input, b"this is not audio").unwrap();

    let processor = AudioProcessor::new(AudioProcessorConfig::default());
    assert!(processor
        .process_file(&input, &output, "broken", "neutral")
        .is_err());
    assert!(!output.exists());

    let _ = std::fs::remove_file(&input);
}
