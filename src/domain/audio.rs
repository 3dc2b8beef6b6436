//! Recording location heuristic and audio value objects

use std::fmt;

use chrono::{Local, NaiveDate};

use super::call_event::parse_calldate;

/// Supported audio MIME types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioMimeType {
    Ogg,
    Mp3,
    Wav,
    Webm,
    Mp4,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ogg => "audio/ogg",
            Self::Mp3 => "audio/mp3",
            Self::Wav => "audio/wav",
            Self::Webm => "audio/webm",
            Self::Mp4 => "audio/mp4",
        }
    }

    /// Map a file extension to a MIME hint.
    /// Unknown extensions fall back to mp3, the archive format.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "ogg" => Self::Ogg,
            "wav" => Self::Wav,
            "webm" => Self::Webm,
            "mp4" | "m4a" => Self::Mp4,
            _ => Self::Mp3,
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for AudioMimeType {
    fn default() -> Self {
        Self::Mp3
    }
}

/// Downloaded audio ready for transcription.
#[derive(Debug, Clone)]
pub struct AudioData {
    data: Vec<u8>,
    mime_type: AudioMimeType,
}

impl AudioData {
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self { data, mime_type }
    }

    /// Get the raw audio data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the MIME type
    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size for logs
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }

    /// Encode the audio data as base64 for inline upload
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Where the recording system serves its files.
#[derive(Debug, Clone)]
pub struct RecordingLayout {
    pub base_url: String,
    pub live_extension: String,
    pub archive_extension: String,
}

/// Candidate recording URLs, in probe order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioCandidates {
    pub urls: Vec<String>,
}

/// Resolve a recording code to its candidate URLs.
///
/// The recording system serves today's calls at the live extension and
/// migrates older calls to the archive extension at the same base path.
/// Same calendar day (local midnight-to-midnight, not a rolling 24h)
/// means only the live candidate; an earlier day or an unparseable
/// timestamp probes live first, then archive, covering the transition
/// window.
pub fn locate(
    call_timestamp: Option<&str>,
    recording_code: &str,
    layout: &RecordingLayout,
    today: NaiveDate,
) -> AudioCandidates {
    let base = layout.base_url.trim_end_matches('/');
    let url_for = |ext: &str| format!("{base}/{recording_code}.{ext}");

    let same_day = call_timestamp
        .and_then(parse_calldate)
        .map(|parsed| parsed.date() == today);

    let urls = match same_day {
        Some(true) => vec![url_for(&layout.live_extension)],
        _ => vec![
            url_for(&layout.live_extension),
            url_for(&layout.archive_extension),
        ],
    };
    AudioCandidates { urls }
}

/// Resolve against the current local calendar day.
pub fn locate_now(
    call_timestamp: Option<&str>,
    recording_code: &str,
    layout: &RecordingLayout,
) -> AudioCandidates {
    locate(
        call_timestamp,
        recording_code,
        layout,
        Local::now().date_naive(),
    )
}

/// Extract the file extension from a URL, ignoring query and fragment.
pub fn url_extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}
