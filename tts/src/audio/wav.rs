// Minimal RIFF/WAVE codec for 16-bit PCM.
//
// Reading walks the chunk list and keeps only fmt and data; whatever
// metadata a synthesis back-end left behind is dropped on the floor.
// Writing emits a canonical header plus, optionally, a fresh LIST/INFO
// block - the only tags an artifact ever carries.
use crate::{TtsError, TtsResult};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Decoded waveform: interleaved 16-bit PCM frames.
#[derive(Debug, Clone)]
pub struct WavData {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl WavData {
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frame_count() as f64 / self.sample_rate as f64
        }
    }
}

/// Fresh metadata written to a processed artifact.
#[derive(Debug, Clone)]
pub struct WavInfo {
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub creation_date: String,
}

pub fn read_wav(path: &Path) -> TtsResult<WavData> {
    let mut file = File::open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    parse_wav(&buf)
}

pub(crate) fn parse_wav(buf: &[u8]) -> TtsResult<WavData> {
    if buf.len() < 12 || &buf[0..4] != b"RIFF" || &buf[8..12] != b"WAVE" {
        return Err(TtsError::AudioProcessing("not a RIFF/WAVE file".into()));
    }

    let mut idx = 12;
    let mut sample_rate = 0u32;
    let mut channels = 0u16;
    let mut bits_per_sample = 0u16;
    let mut data: Option<&[u8]> = None;

    while idx + 8 <= buf.len() {
        let chunk_id = &buf[idx..idx + 4];
        let size =
            u32::from_le_bytes([buf[idx + 4], buf[idx + 5], buf[idx + 6], buf[idx + 7]]) as usize;
        let body_start = idx + 8;
        let body_end = (body_start + size).min(buf.len());

        match chunk_id {
            b"fmt " => {
                let body = &buf[body_start..body_end];
                if body.len() < 16 {
                    return Err(TtsError::AudioProcessing("truncated fmt chunk".into()));
                }
                let audio_format = u16::from_le_bytes([body[0], body[1]]);
                if audio_format != 1 {
                    return Err(TtsError::AudioProcessing(format!(
                        "unsupported audio format {audio_format}, expected PCM"
                    )));
                }
                channels = u16::from_le_bytes([body[2], body[3]]);
                sample_rate = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
                bits_per_sample = u16::from_le_bytes([body[14], body[15]]);
            }
            b"data" => {
                data = Some(&buf[body_start..body_end]);
            }
            // LIST/INFO, id3 and any other legacy chunks are ignored.
            _ => {}
        }

        // Chunks are word aligned.
        idx = body_start + size + (size & 1);
    }

    if sample_rate == 0 || channels == 0 {
        return Err(TtsError::AudioProcessing("missing fmt chunk".into()));
    }
    if bits_per_sample != 16 {
        return Err(TtsError::AudioProcessing(format!(
            "unsupported bit depth {bits_per_sample}, expected 16"
        )));
    }
    let data = data.ok_or_else(|| TtsError::AudioProcessing("missing data chunk".into()))?;

    let samples = data
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    Ok(WavData {
        sample_rate,
        channels,
        samples,
    })
}

pub fn write_wav(path: &Path, wav: &WavData) -> TtsResult<()> {
    write_wav_bytes(path, wav, None)
}

pub fn write_wav_with_info(path: &Path, wav: &WavData, info: &WavInfo) -> TtsResult<()> {
    write_wav_bytes(path, wav, Some(info))
}

fn write_wav_bytes(path: &Path, wav: &WavData, info: Option<&WavInfo>) -> TtsResult<()> {
    if wav.channels == 0 || wav.sample_rate == 0 {
        return Err(TtsError::AudioProcessing("invalid wav parameters".into()));
    }

    let data_len = wav.samples.len() * 2;
    let info_chunk = info.map(encode_info_chunk).unwrap_or_default();
    let riff_len = 4 + (8 + 16) + (8 + data_len) + info_chunk.len();

    let block_align = wav.channels * 2;
    let byte_rate = wav.sample_rate * block_align as u32;

    let mut out = Vec::with_capacity(riff_len + 8);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(riff_len as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&wav.channels.to_le_bytes());
    out.extend_from_slice(&wav.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());
    for sample in &wav.samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out.extend_from_slice(&info_chunk);

    let mut file = File::create(path)?;
    file.write_all(&out)?;
    Ok(())
}

fn encode_info_chunk(info: &WavInfo) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"INFO");
    append_info_entry(&mut body, b"INAM", &info.title);
    append_info_entry(&mut body, b"IART", &info.artist);
    append_info_entry(&mut body, b"IGNR", &info.genre);
    append_info_entry(&mut body, b"ICRD", &info.creation_date);

    let mut chunk = Vec::with_capacity(body.len() + 8);
    chunk.extend_from_slice(b"LIST");
    chunk.extend_from_slice(&(body.len() as u32).to_le_bytes());
    chunk.extend_from_slice(&body);
    chunk
}

fn append_info_entry(out: &mut Vec<u8>, id: &[u8; 4], value: &str) {
    // NUL terminated, word aligned.
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(0);
    if bytes.len() % 2 == 1 {
        bytes.push(0);
    }
    out.extend_from_slice(id);
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&bytes);
}

/// Read back just the LIST/INFO entries, used to verify metadata
/// rewrites.
pub fn read_info_tags(path: &Path) -> TtsResult<Vec<(String, String)>> {
    let mut file = File::open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    if buf.len() < 12 || &buf[0..4] != b"RIFF" || &buf[8..12] != b"WAVE" {
        return Err(TtsError::AudioProcessing("not a RIFF/WAVE file".into()));
    }

    let mut tags = Vec::new();
    let mut idx = 12;
    while idx + 8 <= buf.len() {
        let chunk_id = &buf[idx..idx + 4];
        let size =
            u32::from_le_bytes([buf[idx + 4], buf[idx + 5], buf[idx + 6], buf[idx + 7]]) as usize;
        let body_start = idx + 8;
        let body_end = (body_start + size).min(buf.len());

        if chunk_id == b"LIST" && body_end - body_start >= 4 && &buf[body_start..body_start + 4] == b"INFO" {
            let mut pos = body_start + 4;
            while pos + 8 <= body_end {
                let id = String::from_utf8_lossy(&buf[pos..pos + 4]).to_string();
                let len = u32::from_le_bytes([
                    buf[pos + 4],
                    buf[pos + 5],
                    buf[pos + 6],
                    buf[pos + 7],
                ]) as usize;
                let val_end = (pos + 8 + len).min(body_end);
                let raw = &buf[pos + 8..val_end];
                let value = String::from_utf8_lossy(raw)
                    .trim_end_matches('\0')
                    .to_string();
                tags.push((id, value));
                pos += 8 + len + (len & 1);
            }
        }
        idx = body_start + size + (size & 1);
    }
    Ok(tags)
}
