// Synthesis engine layer: trait seams for the offline and cloud engines,
// concrete backends, and the startup factory that picks an offline backend.

pub mod espeak;
pub mod gtranslate;
pub mod mock;
pub mod say;

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

use crate::config::OfflineConfig;
use crate::types::{DEFAULT_RATE_WPM, DEFAULT_VOLUME, MAX_RATE_WPM, MIN_RATE_WPM};

/// One voice installed with the offline engine, as reported by its own
/// listing command. `id` is whatever the engine's voice flag accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVoice {
    pub id: String,
    pub name: String,
    pub language: String,
}

/// Engine-facing knobs for one offline render. Values are clamped on
/// construction so backends never see an out-of-range rate or volume.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Voice to speak with; `None` keeps the engine default.
    pub voice_id: Option<String>,
    pub rate_wpm: u32,
    pub volume: f32,
}

impl RenderSettings {
    pub fn new(voice_id: Option<String>, rate_wpm: u32, volume: f32) -> Self {
        RenderSettings {
            voice_id,
            rate_wpm: rate_wpm.clamp(MIN_RATE_WPM, MAX_RATE_WPM),
            volume: volume.clamp(0.0, 1.0),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings::new(None, DEFAULT_RATE_WPM, DEFAULT_VOLUME)
    }
}

/// Knobs for one cloud synthesis call. `region` drives the endpoint host
/// (and thereby the accent), `language` the spoken language code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSettings {
    pub region: String,
    pub language: String,
    pub slow: bool,
}

/// A locally installed synthesizer driven over a subprocess boundary.
#[async_trait]
pub trait OfflineEngine: Send + Sync {
    /// Short backend name for logs and the engines endpoint.
    fn name(&self) -> &str;

    /// Enumerate installed voices. Called once at startup; a failure leaves
    /// the offline engine unavailable instead of aborting the server.
    fn list_voices(&self) -> Result<Vec<InstalledVoice>>;

    /// Synthesize `text` into a WAV file at `out_path`.
    async fn render_to_file(
        &self,
        text: &str,
        settings: &RenderSettings,
        out_path: &Path,
    ) -> Result<()>;
}

/// A remote synthesis service reached over HTTP.
#[async_trait]
pub trait CloudEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Synthesize `text` into a complete MP3 byte buffer.
    async fn synthesize(&self, text: &str, settings: &CloudSettings) -> Result<Vec<u8>>;
}

/// Resolve the configured offline backend. `auto` probes the platform's
/// usual suspects with `which`; `None` means no offline engine is installed,
/// which the rest of the app tolerates.
pub fn detect_offline_engine(config: &OfflineConfig) -> Result<Option<Box<dyn OfflineEngine>>> {
    match config.backend.as_str() {
        "mock" => Ok(Some(Box::new(mock::MockOffline::new()))),
        "espeak" => Ok(espeak::EspeakBackend::locate(config.binary.clone())
            .map(|backend| Box::new(backend) as Box<dyn OfflineEngine>)),
        "say" => Ok(say::SayBackend::locate(config.binary.clone())
            .map(|backend| Box::new(backend) as Box<dyn OfflineEngine>)),
        "auto" => {
            if cfg!(target_os = "macos") {
                if let Some(backend) = say::SayBackend::locate(None) {
                    return Ok(Some(Box::new(backend)));
                }
            }
            if let Some(backend) = espeak::EspeakBackend::locate(None) {
                return Ok(Some(Box::new(backend)));
            }
            warn!("No offline TTS engine found on this system");
            Ok(None)
        }
        other => bail!("Unknown offline backend '{other}' (expected auto, espeak, say or mock)"),
    }
}
