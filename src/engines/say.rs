// macOS say command offline backend

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::warn;

use super::{InstalledVoice, OfflineEngine, RenderSettings};

/// Offline backend driving the macOS `say` command.
pub struct SayBackend {
    binary: PathBuf,
}

impl SayBackend {
    pub fn locate(configured: Option<PathBuf>) -> Option<Self> {
        let binary = match configured {
            Some(path) => {
                if path.exists() {
                    Some(path)
                } else {
                    warn!("Configured say binary {} does not exist", path.display());
                    None
                }
            }
            None => which::which("say").ok(),
        }?;
        Some(SayBackend { binary })
    }

    /// Parse voice list output from `say -v ?`
    ///
    /// Format: "Name    language  # description"
    /// Example: "Alex    en_US     # Most people recognize me by my voice."
    /// Names may contain spaces ("Bad News"), so the language is taken as the
    /// last token before the comment.
    fn parse_voice_list(output: &str) -> Vec<InstalledVoice> {
        let mut voices = Vec::new();

        for line in output.lines() {
            let spec = line
                .split_once('#')
                .map(|(spec, _comment)| spec)
                .unwrap_or(line)
                .trim_end();
            if spec.is_empty() {
                continue;
            }

            let Some(language) = spec.split_whitespace().last() else {
                continue;
            };
            let name = spec[..spec.len() - language.len()].trim();
            if name.is_empty() {
                continue;
            }

            voices.push(InstalledVoice {
                id: name.to_string(),
                name: name.to_string(),
                language: language.to_string(),
            });
        }

        voices
    }
}

#[async_trait]
impl OfflineEngine for SayBackend {
    fn name(&self) -> &str {
        "macos-say"
    }

    fn list_voices(&self) -> Result<Vec<InstalledVoice>> {
        // Use blocking command for simplicity (called once at startup)
        let output = std::process::Command::new(&self.binary)
            .arg("-v")
            .arg("?")
            .output()
            .context("Failed to run say -v ?")?;

        if !output.status.success() {
            anyhow::bail!("say -v ? failed");
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
        let mut cmd = Command::new(&self.binary);

        if let Some(voice) = &settings.voice_id {
            cmd.arg("-v").arg(voice);
        }

        cmd.arg("-r").arg(settings.rate_wpm.to_string());

        // say defaults to AIFF; force a plain 16-bit WAV container
        cmd.arg("-o")
            .arg(out_path)
            .arg("--file-format=WAVE")
            .arg("--data-format=LEI16@22050");

        // Pass text via stdin to avoid shell escaping issues. There is no
        // volume flag, so volume rides along as an embedded speech command.
        let spoken = format!("[[volm {:.2}]] {}", settings.volume, text);
        cmd.stdin(std::process::Stdio::piped());

        let mut child = cmd.spawn().context("Failed to spawn say command")?;

        if let Some(mut stdin) = child.stdin.take() {
            use tokio::io::AsyncWriteExt;
            stdin
                .write_all(spoken.as_bytes())
                .await
                .context("Failed to write to say stdin")?;
        }

        let status = child.wait().await.context("Failed to wait for say")?;

        if !status.success() {
            anyhow::bail!("say command failed with status: {}", status);
        }

        Ok(())
    }
}
