// Voice catalog: a one-shot enumeration of the offline engine's installed
// voices, annotated with an inferred gender for the UI.

use serde::Serialize;
use tracing::warn;

use crate::engines::OfflineEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VoiceGender {
    Male,
    Female,
}

impl VoiceGender {
    /// Desktop engines rarely report gender directly, but their voice names
    /// carry it ("Microsoft Zira Desktop" is the stock female voice). Names
    /// containing "female" or "zira" are Female, everything else is Male.
    pub fn infer(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("female") || lower.contains("zira") {
            VoiceGender::Female
        } else {
            VoiceGender::Male
        }
    }
}

/// One catalog entry, serialized for the voices endpoint. `index` is the
/// position a conversion request selects the voice by.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDescriptor {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub gender: VoiceGender,
    pub language: String,
}

/// Read-only voice list built once at startup.
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<VoiceDescriptor>,
}

impl VoiceCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Enumerate the engine's voices. Any listing failure is logged and
    /// swallowed; the catalog is then empty and offline conversion reports
    /// the engine as unavailable rather than erroring at startup.
    pub fn build(engine: &dyn OfflineEngine) -> Self {
        match engine.list_voices() {
            Ok(installed) => {
                let voices = installed
                    .into_iter()
                    .enumerate()
                    .map(|(index, voice)| VoiceDescriptor {
                        index,
                        gender: VoiceGender::infer(&voice.name),
                        id: voice.id,
                        name: voice.name,
                        language: voice.language,
                    })
                    .collect();
                VoiceCatalog { voices }
            }
            Err(error) => {
                warn!("Voice enumeration failed for {}: {:#}", engine.name(), error);
                VoiceCatalog::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn get(&self, index: usize) -> Option<&VoiceDescriptor> {
        self.voices.get(index)
    }

    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::mock::MockOffline;
    use crate::engines::InstalledVoice;

    #[test]
    fn test_gender_inference() {
        assert_eq!(
            VoiceGender::infer("Microsoft Zira Desktop"),
            VoiceGender::Female
        );
        assert_eq!(
            VoiceGender::infer("Microsoft David Desktop"),
            VoiceGender::Male
        );
        assert_eq!(VoiceGender::infer("english female voice"), VoiceGender::Female);
        assert_eq!(VoiceGender::infer("ZIRA"), VoiceGender::Female);
        assert_eq!(VoiceGender::infer("Karen"), VoiceGender::Male);
        assert_eq!(VoiceGender::infer(""), VoiceGender::Male);
    }

    #[test]
    fn test_build_assigns_indices() {
        let catalog = VoiceCatalog::build(&MockOffline::new());
        assert_eq!(catalog.len(), 3);
        for (position, voice) in catalog.voices().iter().enumerate() {
            assert_eq!(voice.index, position);
        }
        assert_eq!(catalog.get(1).map(|v| v.gender), Some(VoiceGender::Female));
    }

    #[test]
    fn test_build_from_failing_engine_is_empty() {
        let catalog = VoiceCatalog::build(&MockOffline::with_failing_listing());
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
    }

    #[test]
    fn test_build_from_bare_engine_is_empty() {
        let catalog = VoiceCatalog::build(&MockOffline::with_voices(Vec::new()));
        assert!(catalog.is_empty());
        assert!(catalog.get(0).is_none());
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let voice = VoiceDescriptor {
            index: 0,
            id: "zira".to_string(),
            name: "Microsoft Zira Desktop".to_string(),
            gender: VoiceGender::Female,
            language: "en-US".to_string(),
        };
        let json = serde_json::to_value(&voice).unwrap();
        assert_eq!(json["gender"], "Female");
        assert_eq!(json["language"], "en-US");
        assert_eq!(json["index"], 0);
    }

    #[test]
    fn test_build_keeps_engine_order() {
        let mock = MockOffline::with_voices(vec![
            InstalledVoice {
                id: "b".to_string(),
                name: "Beta".to_string(),
                language: "en".to_string(),
            },
            InstalledVoice {
                id: "a".to_string(),
                name: "Alpha Female".to_string(),
                language: "en".to_string(),
            },
        ]);
        let catalog = VoiceCatalog::build(&mock);
        assert_eq!(catalog.get(0).map(|v| v.id.as_str()), Some("b"));
        assert_eq!(catalog.get(1).map(|v| v.gender), Some(VoiceGender::Female));
    }
}
