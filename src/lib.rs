// voxbox - dual-engine text-to-speech converter served to the browser

pub mod catalog;
pub mod config;
pub mod engines;
pub mod http_server;
pub mod orchestrator;
pub mod types;

pub use catalog::{VoiceCatalog, VoiceDescriptor, VoiceGender};
pub use config::AppConfig;
pub use orchestrator::{ConversionOutcome, ConvertError, Converter, Synthesis};
pub use types::{AudioFormat, ConvertRequest, ConvertResponse, EngineKind};
