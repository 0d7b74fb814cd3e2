//! Media transcoding: raw bytes <-> `TAG:base64` envelope values.
//!
//! Format sniffing here is advisory. It picks a file extension for saving a
//! received payload and is never used to accept or reject one.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::error::{RelayError, Result};

/// Media payload tag carried at the start of an envelope value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaTag {
    Image,
    Audio,
    Video,
}

impl MediaTag {
    pub const ALL: [MediaTag; 3] = [MediaTag::Image, MediaTag::Audio, MediaTag::Video];

    /// Wire prefix (including the colon).
    pub fn prefix(self) -> &'static str {
        match self {
            MediaTag::Image => "IMG:",
            MediaTag::Audio => "AUDIO:",
            MediaTag::Video => "VIDEO:",
        }
    }

    /// Lowercase label used for history classification and placeholders.
    pub fn label(self) -> &'static str {
        match self {
            MediaTag::Image => "image",
            MediaTag::Audio => "audio",
            MediaTag::Video => "video",
        }
    }

    /// Tag found at the start of `value`, if any.
    pub fn detect(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| value.starts_with(t.prefix()))
    }

    /// Pick a tag from a file extension (with or without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "bmp" | "gif" | "webp" => Some(MediaTag::Image),
            "mp3" | "wav" | "ogg" | "m4a" => Some(MediaTag::Audio),
            "mp4" | "avi" | "mov" | "mkv" => Some(MediaTag::Video),
            _ => None,
        }
    }
}

/// Encode raw bytes as `TAG:base64`.
pub fn encode(tag: MediaTag, raw: &[u8]) -> String {
    let mut out = String::with_capacity(tag.prefix().len() + raw.len().div_ceil(3) * 4);
    out.push_str(tag.prefix());
    STANDARD.encode_string(raw, &mut out);
    out
}

/// Decode a `TAG:base64` value. A missing tag is tolerated.
pub fn decode(value: &str, tag: MediaTag) -> Result<Bytes> {
    let body = value.strip_prefix(tag.prefix()).unwrap_or(value);
    STANDARD
        .decode(body.trim())
        .map(Bytes::from)
        .map_err(|e| RelayError::Decode(format!("invalid {} payload: {e}", tag.label())))
}

/// Audio container guessed from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    M4a,
    Unknown,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
            AudioFormat::M4a => "m4a",
            AudioFormat::Unknown => "bin",
        }
    }
}

/// Guess the audio container of `raw`.
pub fn sniff_audio(raw: &[u8]) -> AudioFormat {
    if raw.starts_with(b"RIFF") && raw.get(8..12) == Some(b"WAVE".as_slice()) {
        return AudioFormat::Wav;
    }
    if raw.starts_with(b"ID3") {
        return AudioFormat::Mp3;
    }
    // MPEG-1 layer III frame sync
    if matches!(raw.get(..2), Some([0xFF, 0xFB] | [0xFF, 0xF3] | [0xFF, 0xF2])) {
        return AudioFormat::Mp3;
    }
    if raw.starts_with(b"OggS") {
        return AudioFormat::Ogg;
    }
    if raw.get(4..8) == Some(b"ftyp".as_slice()) {
        return AudioFormat::M4a;
    }
    AudioFormat::Unknown
}

fn sniff_image_extension(raw: &[u8]) -> &'static str {
    if raw.starts_with(b"\x89PNG") {
        "png"
    } else if raw.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if raw.starts_with(b"GIF8") {
        "gif"
    } else if raw.starts_with(b"RIFF") && raw.get(8..12) == Some(b"WEBP".as_slice()) {
        "webp"
    } else if raw.starts_with(b"BM") {
        "bmp"
    } else {
        "bin"
    }
}

/// Suggested file extension for a received payload.
pub fn suggested_extension(tag: MediaTag, raw: &[u8]) -> &'static str {
    match tag {
        MediaTag::Audio => sniff_audio(raw).extension(),
        MediaTag::Image => sniff_image_extension(raw),
        MediaTag::Video => "mp4",
    }
}
