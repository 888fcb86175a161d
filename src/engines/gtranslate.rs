// Google Translate TTS cloud backend. This is the keyless endpoint behind
// the translate.google.com listen button; it returns MP3 and caps each
// request at 100 characters, so longer text is split and the segments
// concatenated.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::{CloudEngine, CloudSettings};
use crate::config::CloudConfig;

/// Per-request character limit imposed by the service.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Language/accent menu offered to the UI, in display order. Each entry is
/// `(label, region token)`; the token drives host and language selection.
pub const SUPPORTED_LANGUAGES: [(&str, &str); 25] = [
    ("English (US)", "en"),
    ("English (UK)", "co.uk"),
    ("English (Australia)", "com.au"),
    ("English (India)", "co.in"),
    ("Spanish (Spain)", "es"),
    ("Spanish (Mexico)", "com.mx"),
    ("French (France)", "fr"),
    ("French (Canada)", "ca"),
    ("German", "de"),
    ("Italian", "it"),
    ("Portuguese (Brazil)", "com.br"),
    ("Portuguese (Portugal)", "pt"),
    ("Russian", "ru"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Chinese (Mandarin)", "zh-cn"),
    ("Arabic", "ar"),
    ("Hindi", "hi"),
    ("Dutch", "nl"),
    ("Swedish", "sv"),
    ("Norwegian", "no"),
    ("Danish", "da"),
    ("Finnish", "fi"),
    ("Polish", "pl"),
    ("Turkish", "tr"),
];

pub struct GoogleTranslateTts {
    client: reqwest::Client,
    endpoint_override: Option<String>,
}

impl GoogleTranslateTts {
    pub fn new(config: &CloudConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(GoogleTranslateTts {
            client,
            endpoint_override: config.endpoint.clone(),
        })
    }

    /// A configured endpoint override wins (used to point at a stub). Only
    /// domain-qualified region tokens ("co.uk", "com.au") name a real google
    /// host; bare language tokens ("de", "ja") go to the default host, with
    /// the language carried by the `tl` query parameter.
    fn endpoint_for(&self, region: &str) -> String {
        match &self.endpoint_override {
            Some(base) => format!("{}/translate_tts", base.trim_end_matches('/')),
            None => {
                let tld = if region.contains('.') { region } else { "com" };
                format!("https://translate.google.{tld}/translate_tts")
            }
        }
    }
}

fn speed_param(slow: bool) -> &'static str {
    if slow {
        "0.24"
    } else {
        "1"
    }
}

/// Split text into chunks of at most `limit` characters, preferring to cut
/// after sentence punctuation, then at whitespace, and only then mid-word.
/// Chunks are trimmed and never empty.
pub(crate) fn split_text(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        if rest.chars().count() <= limit {
            chunks.push(rest.to_string());
            break;
        }

        // Byte offset just past the first `limit` characters.
        let window_end = rest
            .char_indices()
            .nth(limit)
            .map(|(offset, _)| offset)
            .unwrap_or_else(|| rest.len());
        let window = &rest[..window_end];

        let cut = window
            .rfind(['.', '!', '?', ';', ':'])
            .map(|offset| offset + 1)
            .or_else(|| window.rfind(char::is_whitespace))
            .unwrap_or(window_end);

        let (head, tail) = rest.split_at(cut);
        let head = head.trim();
        if !head.is_empty() {
            chunks.push(head.to_string());
        }
        rest = tail.trim_start();
    }

    chunks
}

#[async_trait]
impl CloudEngine for GoogleTranslateTts {
    fn name(&self) -> &str {
        "google-translate"
    }

    async fn synthesize(&self, text: &str, settings: &CloudSettings) -> Result<Vec<u8>> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        let url = self.endpoint_for(&settings.region);
        let total = chunks.len().to_string();
        let speed = speed_param(settings.slow);

        let mut audio = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            let idx = index.to_string();
            let textlen = chunk.chars().count().to_string();

            let response = self
                .client
                .get(&url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", settings.language.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                    ("client", "tw-ob"),
                    ("ttsspeed", speed),
                ])
                .send()
                .await
                .context("Cloud TTS request failed")?;

            if !response.status().is_success() {
                anyhow::bail!("Cloud TTS service returned {}", response.status());
            }

            let mut stream = response.bytes_stream();
            use futures_util::StreamExt;

            while let Some(chunk_result) = stream.next().await {
                let chunk = chunk_result.context("Failed to read audio chunk")?;
                audio.extend_from_slice(&chunk);
            }
        }

        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_short_text_single_chunk() {
        let chunks = split_text("Hello world", 100);
        assert_eq!(chunks, vec!["Hello world".to_string()]);
    }

    #[test]
    fn test_split_prefers_sentence_boundary() {
        let text = "First sentence ends here. Second sentence is also fairly long and continues on.";
        let chunks = split_text(text, 40);
        assert_eq!(chunks[0], "First sentence ends here.");
    }

    #[test]
    fn test_split_falls_back_to_whitespace() {
        let text = "no punctuation here just a long run of words that keeps going and going and going";
        let chunks = split_text(text, 30);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 30);
            assert!(!chunk.is_empty());
            assert!(!chunk.starts_with(' '));
            assert!(!chunk.ends_with(' '));
        }
        // No word is split in half
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_split_hard_cuts_unbroken_run() {
        let text = "a".repeat(250);
        let chunks = split_text(&text, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 100);
        assert_eq!(chunks[2].chars().count(), 50);
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        // Multibyte text must never be cut inside a character
        let text = "こんにちは世界 ".repeat(30);
        let chunks = split_text(&text, 100);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[test]
    fn test_split_empty_input() {
        assert!(split_text("   ", 100).is_empty());
        assert!(split_text("", 100).is_empty());
    }

    #[test]
    fn test_speed_param() {
        assert_eq!(speed_param(true), "0.24");
        assert_eq!(speed_param(false), "1");
    }

    #[test]
    fn test_supported_languages_table() {
        assert_eq!(SUPPORTED_LANGUAGES.len(), 25);
        assert_eq!(SUPPORTED_LANGUAGES[0], ("English (US)", "en"));
        assert_eq!(SUPPORTED_LANGUAGES[1], ("English (UK)", "co.uk"));
        assert_eq!(SUPPORTED_LANGUAGES[24], ("Turkish", "tr"));
        for (label, region) in SUPPORTED_LANGUAGES {
            assert!(!label.is_empty());
            assert!(!region.is_empty());
        }
    }

    #[test]
    fn test_endpoint_uses_region_host_for_qualified_tokens() {
        let engine = GoogleTranslateTts::new(&CloudConfig::default()).unwrap();
        assert_eq!(
            engine.endpoint_for("co.uk"),
            "https://translate.google.co.uk/translate_tts"
        );
        assert_eq!(
            engine.endpoint_for("com.br"),
            "https://translate.google.com.br/translate_tts"
        );
    }

    #[test]
    fn test_endpoint_defaults_for_bare_tokens() {
        // "en" and "ja" are language codes, not google domains
        let engine = GoogleTranslateTts::new(&CloudConfig::default()).unwrap();
        assert_eq!(
            engine.endpoint_for("en"),
            "https://translate.google.com/translate_tts"
        );
        assert_eq!(
            engine.endpoint_for("ja"),
            "https://translate.google.com/translate_tts"
        );
    }

    #[test]
    fn test_endpoint_override_wins() {
        let config = CloudConfig {
            endpoint: Some("http://127.0.0.1:9999/".to_string()),
            ..CloudConfig::default()
        };
        let engine = GoogleTranslateTts::new(&config).unwrap();
        assert_eq!(
            engine.endpoint_for("co.uk"),
            "http://127.0.0.1:9999/translate_tts"
        );
    }
}
