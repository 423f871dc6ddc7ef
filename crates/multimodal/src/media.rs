//! Container header inspection for binary media. Only the first bytes of
//! each format are parsed; nothing is decoded.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub format: &'static str,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioInfo {
    pub format: &'static str,
    pub channels: Option<u16>,
    pub sample_rate: Option<u32>,
    pub bits_per_sample: Option<u16>,
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub format: &'static str,
    /// Major brand of MP4/QuickTime files.
    pub brand: Option<String>,
}

fn be_u32(b: &[u8], at: usize) -> Option<u32> {
    b.get(at..at + 4).map(|s| u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
}

fn be_u16(b: &[u8], at: usize) -> Option<u16> {
    b.get(at..at + 2).map(|s| u16::from_be_bytes([s[0], s[1]]))
}

fn le_u32(b: &[u8], at: usize) -> Option<u32> {
    b.get(at..at + 4).map(|s| u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

fn le_u16(b: &[u8], at: usize) -> Option<u16> {
    b.get(at..at + 2).map(|s| u16::from_le_bytes([s[0], s[1]]))
}

pub fn sniff_image(data: &[u8]) -> Option<ImageInfo> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        // IHDR is always the first chunk.
        return Some(ImageInfo {
            format: "png",
            width: be_u32(data, 16),
            height: be_u32(data, 20),
        });
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some(ImageInfo {
            format: "gif",
            width: le_u16(data, 6).map(u32::from),
            height: le_u16(data, 8).map(u32::from),
        });
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        let (width, height) = jpeg_dimensions(data).unzip();
        return Some(ImageInfo {
            format: "jpeg",
            width,
            height,
        });
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some(ImageInfo {
            format: "webp",
            width: None,
            height: None,
        });
    }
    if data.starts_with(b"BM") {
        return Some(ImageInfo {
            format: "bmp",
            width: le_u32(data, 18),
            height: le_u32(data, 22).map(|h| (h as i32).unsigned_abs()),
        });
    }
    None
}

/// Walk JPEG segments up to the first start-of-frame marker.
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        if marker == 0xFF {
            i += 1;
            continue;
        }
        let len = be_u16(data, i + 2)? as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let height = be_u16(data, i + 5)?;
            let width = be_u16(data, i + 7)?;
            return Some((u32::from(width), u32::from(height)));
        }
        i += 2 + len;
    }
    None
}

pub fn sniff_audio(data: &[u8]) -> Option<AudioInfo> {
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE" {
        return Some(wav_info(data));
    }
    let format = if data.starts_with(b"fLaC") {
        "flac"
    } else if data.starts_with(b"OggS") {
        "ogg"
    } else if data.starts_with(b"ID3") || (data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0) {
        "mp3"
    } else {
        return None;
    };
    Some(AudioInfo {
        format,
        channels: None,
        sample_rate: None,
        bits_per_sample: None,
        duration_secs: None,
    })
}

fn wav_info(data: &[u8]) -> AudioInfo {
    let mut info = AudioInfo {
        format: "wav",
        channels: None,
        sample_rate: None,
        bits_per_sample: None,
        duration_secs: None,
    };
    let mut data_len = None;
    let mut i = 12;
    while i + 8 <= data.len() {
        let id = &data[i..i + 4];
        let Some(size) = le_u32(data, i + 4) else { break };
        let body = i + 8;
        match id {
            b"fmt " => {
                info.channels = le_u16(data, body + 2);
                info.sample_rate = le_u32(data, body + 4);
                info.bits_per_sample = le_u16(data, body + 14);
            }
            b"data" => {
                data_len = Some(size);
                break;
            }
            _ => {}
        }
        // Chunks are word aligned.
        i = body + size as usize + (size as usize & 1);
    }
    if let (Some(len), Some(ch), Some(rate), Some(bits)) =
        (data_len, info.channels, info.sample_rate, info.bits_per_sample)
    {
        let bytes_per_sec = f64::from(rate) * f64::from(ch) * f64::from(bits) / 8.0;
        if bytes_per_sec > 0.0 {
            info.duration_secs = Some(f64::from(len) / bytes_per_sec);
        }
    }
    info
}

pub fn sniff_video(data: &[u8]) -> Option<VideoInfo> {
    if data.get(4..8) == Some(b"ftyp") {
        let brand = data
            .get(8..12)
            .map(|b| String::from_utf8_lossy(b).trim().to_string());
        let format = match brand.as_deref() {
            Some("qt") => "quicktime",
            _ => "mp4",
        };
        return Some(VideoInfo { format, brand });
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(VideoInfo {
            format: "matroska",
            brand: None,
        });
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"AVI " {
        return Some(VideoInfo {
            format: "avi",
            brand: None,
        });
    }
    None
}

/// Build a minimal PCM WAV header followed by `samples` zeroed 16-bit
/// frames. Used by tests across the crate.
#[cfg(test)]
pub(crate) fn test_wav(sample_rate: u32, channels: u16, frames: u32) -> Vec<u8> {
    let bits: u16 = 16;
    let data_len = frames * u32::from(channels) * u32::from(bits / 8);
    let mut v = Vec::new();
    v.extend_from_slice(b"RIFF");
    v.extend_from_slice(&(36 + data_len).to_le_bytes());
    v.extend_from_slice(b"WAVEfmt ");
    v.extend_from_slice(&16u32.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&channels.to_le_bytes());
    v.extend_from_slice(&sample_rate.to_le_bytes());
    v.extend_from_slice(&(sample_rate * u32::from(channels) * u32::from(bits / 8)).to_le_bytes());
    v.extend_from_slice(&(channels * bits / 8).to_le_bytes());
    v.extend_from_slice(&bits.to_le_bytes());
    v.extend_from_slice(b"data");
    v.extend_from_slice(&data_len.to_le_bytes());
    v.resize(v.len() + data_len as usize, 0);
    v
}

#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    let mut v = b"\x89PNG\r\n\x1a\n".to_vec();
    v.extend_from_slice(&13u32.to_be_bytes());
    v.extend_from_slice(b"IHDR");
    v.extend_from_slice(&width.to_be_bytes());
    v.extend_from_slice(&height.to_be_bytes());
    v.extend_from_slice(&[8, 6, 0, 0, 0]);
    v
}
