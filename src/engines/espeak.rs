// espeak-ng offline backend (Linux and most BSDs)

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::warn;

use super::{InstalledVoice, OfflineEngine, RenderSettings};

/// Offline backend driving the `espeak-ng` (or legacy `espeak`) CLI.
pub struct EspeakBackend {
    binary: PathBuf,
}

impl EspeakBackend {
    /// Find the espeak binary, preferring `espeak-ng` over plain `espeak`.
    /// A configured path wins but must exist.
    pub fn locate(configured: Option<PathBuf>) -> Option<Self> {
        let binary = match configured {
            Some(path) => {
                if path.exists() {
                    Some(path)
                } else {
                    warn!("Configured espeak binary {} does not exist", path.display());
                    None
                }
            }
            None => which::which("espeak-ng")
                .or_else(|_| which::which("espeak"))
                .ok(),
        }?;
        Some(EspeakBackend { binary })
    }

    /// Parse `espeak-ng --voices` output.
    ///
    /// Format: "Pty Language Age/Gender VoiceName File Other Languages"
    /// Example: " 5  en-gb           --/M      English_(Great_Britain) gmw/en"
    fn parse_voice_list(output: &str) -> Vec<InstalledVoice> {
        let mut voices = Vec::new();

        for line in output.lines().skip(1) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                continue;
            }

            // The language code is what `-v` accepts, so it doubles as the id.
            let language = fields[1].to_string();
            let name = fields[3].replace('_', " ");

            voices.push(InstalledVoice {
                id: language.clone(),
                name,
                language,
            });
        }

        voices
    }
}

#[async_trait]
impl OfflineEngine for EspeakBackend {
    fn name(&self) -> &str {
        "espeak"
    }

    fn list_voices(&self) -> Result<Vec<InstalledVoice>> {
        // Blocking command is fine here, this runs once at startup
        let output = std::process::Command::new(&self.binary)
            .arg("--voices")
            .output()
            .with_context(|| format!("Failed to run {} --voices", self.binary.display()))?;

        if !output.status.success() {
            anyhow::bail!("{} --voices failed", self.binary.display());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self::parse_voice_list(&stdout))
    }

    async fn render_to_file(
        &self,
        text: &str,
        settings: &RenderSettings,
        out_path: &Path,
    ) -> Result<()> {
        // espeak amplitude runs 0-200 with 100 as the normal level
        let amplitude = (settings.volume * 200.0).round() as u32;

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-s")
            .arg(settings.rate_wpm.to_string())
            .arg("-a")
            .arg(amplitude.to_string())
            .arg("-w")
            .arg(out_path);

        if let Some(voice) = &settings.voice_id {
            cmd.arg("-v").arg(voice);
        }

        // Read text from stdin to avoid argv length and quoting issues
        cmd.arg("--stdin");
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::null());
        cmd.stderr(std::process::Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.binary.display()))?;

        if let Some(mut stdin) = child.stdin.take() {
            use tokio::io::AsyncWriteExt;
            stdin
                .write_all(text.as_bytes())
                .await
                .context("Failed to write to espeak stdin")?;
        }

        let output = child
            .wait_with_output()
            .await
            .context("Failed to wait for espeak")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "espeak failed with status {}: {}",
                output.status,
                stderr.trim()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voice_list() {
        let output = r#"Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-gb           --/M      English_(Great_Britain) gmw/en
 5  en-us           --/M      English_(America)  gmw/en-US
 5  de              --/M      German             gmw/de
"#;
        let voices = EspeakBackend::parse_voice_list(output);
        assert_eq!(voices.len(), 4);
        assert_eq!(voices[0].id, "af");
        assert_eq!(voices[0].name, "Afrikaans");
        assert_eq!(voices[1].id, "en-gb");
        assert_eq!(voices[1].name, "English (Great Britain)");
        assert_eq!(voices[2].language, "en-us");
    }

    #[test]
    fn test_parse_voice_list_skips_short_lines() {
        let output = "Pty Language Age/Gender VoiceName File\n\n 5  de\n";
        let voices = EspeakBackend::parse_voice_list(output);
        assert!(voices.is_empty());
    }
}
