// Mock engines for tests and engine-less development (`backend = "mock"`).
// The offline mock writes a real WAV tone so the browser player and the
// duration probe behave exactly as they do with a real engine.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{CloudEngine, CloudSettings, InstalledVoice, OfflineEngine, RenderSettings};

/// Mock behavior for the offline engine mock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MockOfflineBehavior {
    /// Write a short sine tone WAV and succeed
    #[default]
    Success,
    /// Fail the render call
    RenderError,
    /// Report success but leave the output file empty
    EmptyOutput,
    /// Write the output, then delete it before returning
    DeleteOutput,
}

/// Mock offline engine for testing
#[derive(Clone)]
pub struct MockOffline {
    behavior: Arc<Mutex<MockOfflineBehavior>>,
    voices: Arc<Mutex<Result<Vec<InstalledVoice>, String>>>,
    render_count: Arc<Mutex<usize>>,
    captured_settings: Arc<Mutex<Vec<RenderSettings>>>,
}

impl MockOffline {
    pub fn new() -> Self {
        Self::with_behavior(MockOfflineBehavior::Success)
    }

    pub fn with_behavior(behavior: MockOfflineBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            voices: Arc::new(Mutex::new(Ok(default_voices()))),
            render_count: Arc::new(Mutex::new(0)),
            captured_settings: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the voice listing (empty to simulate a bare installation).
    pub fn with_voices(voices: Vec<InstalledVoice>) -> Self {
        let mock = Self::new();
        *mock.voices.lock().unwrap() = Ok(voices);
        mock
    }

    /// Make `list_voices` fail, as a broken installation would.
    pub fn with_failing_listing() -> Self {
        let mock = Self::new();
        *mock.voices.lock().unwrap() = Err("mock voice listing failure".to_string());
        mock
    }

    pub fn set_behavior(&self, behavior: MockOfflineBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn get_render_count(&self) -> usize {
        *self.render_count.lock().unwrap()
    }

    pub fn get_last_settings(&self) -> Option<RenderSettings> {
        self.captured_settings.lock().unwrap().last().cloned()
    }
}

impl Default for MockOffline {
    fn default() -> Self {
        Self::new()
    }
}

fn default_voices() -> Vec<InstalledVoice> {
    vec![
        InstalledVoice {
            id: "david".to_string(),
            name: "Microsoft David Desktop".to_string(),
            language: "en-US".to_string(),
        },
        InstalledVoice {
            id: "zira".to_string(),
            name: "Microsoft Zira Desktop".to_string(),
            language: "en-US".to_string(),
        },
        InstalledVoice {
            id: "hazel".to_string(),
            name: "Microsoft Hazel Desktop".to_string(),
            language: "en-GB".to_string(),
        },
    ]
}

/// Write a sine tone WAV whose length scales with the word count and rate,
/// and whose amplitude scales with the volume.
fn write_tone_wav(out_path: &Path, text: &str, settings: &RenderSettings) -> Result<()> {
    const SAMPLE_RATE: u32 = 22050;

    let words = text.split_whitespace().count().max(1) as f64;
    let secs = (words * 60.0 / f64::from(settings.rate_wpm.max(1))).clamp(0.2, 5.0);
    let amplitude = f64::from(settings.volume.clamp(0.0, 1.0)) * f64::from(i16::MAX) * 0.3;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(out_path, spec).context("Failed to create WAV file")?;

    let total_samples = (secs * f64::from(SAMPLE_RATE)) as usize;
    for n in 0..total_samples {
        let t = n as f64 / f64::from(SAMPLE_RATE);
        let sample = (t * 440.0 * 2.0 * std::f64::consts::PI).sin() * amplitude;
        writer
            .write_sample(sample as i16)
            .context("Failed to write WAV sample")?;
    }
    writer.finalize().context("Failed to finalize WAV file")?;

    Ok(())
}

#[async_trait]
impl OfflineEngine for MockOffline {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_voices(&self) -> Result<Vec<InstalledVoice>> {
        match &*self.voices.lock().unwrap() {
            Ok(voices) => Ok(voices.clone()),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }
    }

    async fn render_to_file(
        &self,
        text: &str,
        settings: &RenderSettings,
        out_path: &Path,
    ) -> Result<()> {
        *self.render_count.lock().unwrap() += 1;
        self.captured_settings.lock().unwrap().push(settings.clone());

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            MockOfflineBehavior::Success => write_tone_wav(out_path, text, settings),
            MockOfflineBehavior::RenderError => Err(anyhow::anyhow!("mock render failure")),
            MockOfflineBehavior::EmptyOutput => {
                std::fs::write(out_path, b"").context("Failed to write empty output")?;
                Ok(())
            }
            MockOfflineBehavior::DeleteOutput => {
                write_tone_wav(out_path, text, settings)?;
                std::fs::remove_file(out_path).context("Failed to delete mock output")?;
                Ok(())
            }
        }
    }
}

/// Mock behavior for the cloud engine mock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MockCloudBehavior {
    /// Return canned MP3 frames
    #[default]
    Success,
    /// Fail as an unreachable service would
    NetworkError,
}

/// Mock cloud engine for testing
#[derive(Clone)]
pub struct MockCloud {
    behavior: Arc<Mutex<MockCloudBehavior>>,
    call_count: Arc<Mutex<usize>>,
    captured_requests: Arc<Mutex<Vec<(String, CloudSettings)>>>,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::with_behavior(MockCloudBehavior::Success)
    }

    pub fn with_behavior(behavior: MockCloudBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            call_count: Arc::new(Mutex::new(0)),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_last_request(&self) -> Option<(String, CloudSettings)> {
        self.captured_requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockCloud {
    fn default() -> Self {
        Self::new()
    }
}

/// A single silent 32 kbps MPEG-1 Layer III mono frame (104 bytes).
fn silent_mp3_frame() -> Vec<u8> {
    let mut frame = vec![0u8; 104];
    frame[0] = 0xFF;
    frame[1] = 0xFB;
    frame[2] = 0x10;
    frame[3] = 0xC4;
    frame
}

#[async_trait]
impl CloudEngine for MockCloud {
    fn name(&self) -> &str {
        "mock-cloud"
    }

    async fn synthesize(&self, text: &str, settings: &CloudSettings) -> Result<Vec<u8>> {
        *self.call_count.lock().unwrap() += 1;
        self.captured_requests
            .lock()
            .unwrap()
            .push((text.to_string(), settings.clone()));

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            MockCloudBehavior::Success => {
                // Frame count scales with the text so longer input means
                // more bytes, like the real service
                let frames = (text.chars().count() / 20).clamp(4, 40);
                let mut audio = Vec::new();
                for _ in 0..frames {
                    audio.extend_from_slice(&silent_mp3_frame());
                }
                Ok(audio)
            }
            MockCloudBehavior::NetworkError => {
                Err(anyhow::anyhow!("mock network failure: connection refused"))
            }
        }
    }
}
