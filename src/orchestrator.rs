// Conversion orchestrator: takes one request, drives the selected engine,
// and returns exactly one outcome.

use anyhow::Context;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::catalog::VoiceCatalog;
use crate::engines::{CloudEngine, CloudSettings, OfflineEngine, RenderSettings};
use crate::types::{AudioFormat, ConvertRequest, EngineKind, EngineParams};

/// Why a conversion attempt failed. Every collaborator error is caught and
/// folded into one of these; nothing below panics or leaks a raw error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("No text provided. Please enter some text to convert.")]
    EmptyInput,

    #[error(
        "Offline TTS engine not available. Please ensure a speech synthesizer \
         is installed on this system."
    )]
    EngineUnavailable,

    #[error("Offline TTS failed: {0}")]
    RenderFailure(String),

    #[error("Cloud TTS failed: {0}. Check your internet connection.")]
    NetworkOrServiceFailure(String),
}

/// Audio produced by a successful conversion.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub filename: String,
    pub format: AudioFormat,
    pub audio: Vec<u8>,
    /// Probed from WAV output; MP3 is not probed.
    pub duration_secs: Option<f64>,
}

/// A conversion attempt yields audio or a typed failure, never both.
pub type ConversionOutcome = Result<Synthesis, ConvertError>;

/// Owns the engines and the voice catalog. Built once at startup and shared
/// read-only across requests.
pub struct Converter {
    offline: Option<Box<dyn OfflineEngine>>,
    cloud: Box<dyn CloudEngine>,
    catalog: VoiceCatalog,
    temp_dir: PathBuf,
}

impl Converter {
    pub fn new(
        offline: Option<Box<dyn OfflineEngine>>,
        cloud: Box<dyn CloudEngine>,
        temp_dir: Option<PathBuf>,
    ) -> Self {
        let catalog = match &offline {
            Some(engine) => VoiceCatalog::build(engine.as_ref()),
            None => VoiceCatalog::empty(),
        };
        Converter {
            offline,
            cloud,
            catalog,
            temp_dir: temp_dir.unwrap_or_else(std::env::temp_dir),
        }
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn offline_name(&self) -> Option<&str> {
        self.offline.as_deref().map(|engine| engine.name())
    }

    pub fn cloud_name(&self) -> &str {
        self.cloud.name()
    }

    /// The offline engine counts as available only when it exists and its
    /// voice catalog is non-empty.
    pub fn offline_available(&self) -> bool {
        self.offline.is_some() && !self.catalog.is_empty()
    }

    /// Run one conversion. Exactly one outcome per call.
    pub async fn convert(&self, request: &ConvertRequest) -> ConversionOutcome {
        let conversion_id = Uuid::new_v4();
        let span = info_span!(
            "convert",
            id = %conversion_id,
            engine = request.params.kind().as_str()
        );
        self.convert_inner(request).instrument(span).await
    }

    async fn convert_inner(&self, request: &ConvertRequest) -> ConversionOutcome {
        let text = request.text.trim();
        if text.is_empty() {
            warn!("Rejected conversion: empty input");
            return Err(ConvertError::EmptyInput);
        }

        let outcome = match &request.params {
            EngineParams::Offline {
                voice_index,
                rate,
                volume,
            } => self.convert_offline(text, *voice_index, *rate, *volume).await,
            EngineParams::Cloud { region, slow } => self.convert_cloud(text, region, *slow).await,
        };

        match &outcome {
            Ok(synthesis) => info!(
                filename = %synthesis.filename,
                bytes = synthesis.audio.len(),
                "Conversion succeeded"
            ),
            Err(error) => warn!(%error, "Conversion failed"),
        }

        outcome
    }

    async fn convert_offline(
        &self,
        text: &str,
        voice_index: Option<usize>,
        rate: u32,
        volume: f32,
    ) -> ConversionOutcome {
        let Some(engine) = self.offline.as_deref() else {
            return Err(ConvertError::EngineUnavailable);
        };
        if self.catalog.is_empty() {
            return Err(ConvertError::EngineUnavailable);
        }

        // An out-of-range index keeps the engine's default voice
        let voice_id = voice_index
            .and_then(|index| self.catalog.get(index))
            .map(|voice| voice.id.clone());
        let settings = RenderSettings::new(voice_id, rate, volume);

        let audio = self
            .render_to_buffer(engine, text, &settings)
            .await
            .map_err(|error| ConvertError::RenderFailure(format!("{error:#}")))?;
        if audio.is_empty() {
            return Err(ConvertError::RenderFailure(
                "engine produced no audio".to_string(),
            ));
        }

        let duration_secs = wav_duration_secs(&audio);
        Ok(Synthesis {
            filename: output_filename(EngineKind::Offline, AudioFormat::Wav),
            format: AudioFormat::Wav,
            audio,
            duration_secs,
        })
    }

    /// Render through a scratch file that is removed when `temp` drops,
    /// whether or not the render or the read-back succeeds.
    async fn render_to_buffer(
        &self,
        engine: &dyn OfflineEngine,
        text: &str,
        settings: &RenderSettings,
    ) -> anyhow::Result<Vec<u8>> {
        let temp = tempfile::Builder::new()
            .prefix("tts-")
            .suffix(".wav")
            .tempfile_in(&self.temp_dir)
            .context("Failed to create temp audio file")?
            .into_temp_path();

        engine.render_to_file(text, settings, &temp).await?;
        let audio = tokio::fs::read(&temp)
            .await
            .context("Failed to read rendered audio")?;
        Ok(audio)
    }

    async fn convert_cloud(&self, text: &str, region: &str, slow: bool) -> ConversionOutcome {
        let settings = CloudSettings {
            region: region.to_string(),
            language: language_for_region(region),
            slow,
        };

        let audio = self
            .cloud
            .synthesize(text, &settings)
            .await
            .map_err(|error| ConvertError::NetworkOrServiceFailure(format!("{error:#}")))?;
        if audio.is_empty() {
            return Err(ConvertError::NetworkOrServiceFailure(
                "service returned no audio".to_string(),
            ));
        }

        Ok(Synthesis {
            filename: output_filename(EngineKind::Cloud, AudioFormat::Mp3),
            format: AudioFormat::Mp3,
            audio,
            duration_secs: None,
        })
    }
}

/// Derive the spoken language code from an accent region token. Tokens
/// carrying a country qualifier ("co.uk", "com.au") speak English; any other
/// token doubles as the language code itself. Note this sends "com.mx" to
/// English too.
pub fn language_for_region(region: &str) -> String {
    if region.contains("co") {
        "en".to_string()
    } else {
        region.to_string()
    }
}

fn output_filename(kind: EngineKind, format: AudioFormat) -> String {
    format!(
        "tts_{}_{}.{}",
        kind.as_str(),
        chrono::Utc::now().timestamp(),
        format.extension()
    )
}

/// Decode just enough of a WAV header to report a playback length.
fn wav_duration_secs(audio: &[u8]) -> Option<f64> {
    let reader = hound::WavReader::new(std::io::Cursor::new(audio)).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    Some(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}
