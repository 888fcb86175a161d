// Wire types shared between the HTTP surface and the browser UI

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

/// Default speaking rate in words per minute when the request omits it.
pub const DEFAULT_RATE_WPM: u32 = 200;
/// Bounds the speaking rate is clamped to before it reaches an engine.
pub const MIN_RATE_WPM: u32 = 50;
pub const MAX_RATE_WPM: u32 = 400;
/// Default playback volume (0.0 - 1.0) when the request omits it.
pub const DEFAULT_VOLUME: f32 = 0.9;

/// Audio container produced by a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn label(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "WAV",
            AudioFormat::Mp3 => "MP3",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }
}

/// Which synthesis engine a conversion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Offline,
    Cloud,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Offline => "offline",
            EngineKind::Cloud => "cloud",
        }
    }
}

/// A conversion request as posted by the UI. The engine-specific parameters
/// are tagged by the `engine` field so each branch only carries what it uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertRequest {
    pub text: String,
    #[serde(flatten)]
    pub params: EngineParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "engine", rename_all = "lowercase")]
pub enum EngineParams {
    #[serde(rename_all = "camelCase")]
    Offline {
        /// Index into the voice catalog; out-of-bounds falls back to the
        /// engine's current default voice.
        #[serde(default)]
        voice_index: Option<usize>,
        /// Speaking rate in words per minute.
        #[serde(default = "default_rate")]
        rate: u32,
        /// Volume, 0.0 - 1.0.
        #[serde(default = "default_volume")]
        volume: f32,
    },
    #[serde(rename_all = "camelCase")]
    Cloud {
        /// Region token ("co.uk", "com.au", "de", ...) selecting both the
        /// service host and the accent.
        region: String,
        #[serde(default)]
        slow: bool,
    },
}

fn default_rate() -> u32 {
    DEFAULT_RATE_WPM
}

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

impl EngineParams {
    pub fn kind(&self) -> EngineKind {
        match self {
            EngineParams::Offline { .. } => EngineKind::Offline,
            EngineParams::Cloud { .. } => EngineKind::Cloud,
        }
    }
}

/// Successful conversion payload returned to the UI. The audio travels as
/// base64 so the page can build both the inline player and the download link
/// from one response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub filename: String,
    pub format: AudioFormat,
    pub mime: &'static str,
    pub size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    pub audio_base64: String,
}

impl ConvertResponse {
    pub fn new(
        filename: String,
        format: AudioFormat,
        audio: &[u8],
        duration_secs: Option<f64>,
    ) -> Self {
        ConvertResponse {
            filename,
            format,
            mime: format.mime(),
            size_bytes: audio.len(),
            duration_secs,
            audio_base64: BASE64.encode(audio),
        }
    }
}
