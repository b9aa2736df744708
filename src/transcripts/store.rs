//! Flat-directory persistence for saved chat transcripts.
//!
//! Every transcript lives in `<dir>/<chat_id>.json`. The filename stem is the
//! transcript's `chat_id`, so saving under an existing id replaces the
//! previous document.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const MAX_CHAT_ID_LEN: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("transcript I/O failed: {0}")]
    Io(anyhow::Error),
}

/// A saved conversation, as written to and read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub chat_id: String,
    pub content: Value,
    /// Whatever the client sent, stored as-is. Missing becomes `null`.
    #[serde(default)]
    pub timestamp: Value,
}

pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the storage directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating transcript directory {}", self.dir.display()))
            .map_err(StoreError::Io)
    }

    /// Write `{chat_id, content, timestamp}`, replacing any transcript with the same id.
    pub async fn save(
        &self,
        chat_id: &str,
        content: Value,
        timestamp: Value,
    ) -> Result<(), StoreError> {
        validate_chat_id(chat_id)?;
        if is_blank(&content) {
            return Err(StoreError::Validation(
                "chat_id and chat_content are required".into(),
            ));
        }

        let transcript = Transcript {
            chat_id: chat_id.to_string(),
            content,
            timestamp,
        };
        let json = serde_json::to_vec(&transcript)
            .context("serializing transcript")
            .map_err(StoreError::Io)?;

        self.ensure_dir().await?;
        let path = self.path_for(chat_id);
        // Unique per write so overlapping saves of one id never share a temp file.
        let tmp = self.dir.join(format!(".{chat_id}.{}.tmp", temp_suffix()));
        write_replace(&tmp, &path, &json)
            .await
            .map_err(StoreError::Io)?;

        tracing::debug!(chat_id, path = %path.display(), "transcript saved");
        Ok(())
    }

    /// Read every `*.json` transcript in the directory, in directory order.
    ///
    /// A missing directory yields an empty list. Files that cannot be read
    /// or parsed are skipped with a warning so one bad file does not hide
    /// the rest.
    pub async fn list_all(&self) -> Result<Vec<Transcript>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io(anyhow::Error::new(e).context(format!(
                    "listing transcript directory {}",
                    self.dir.display()
                ))));
            }
        };

        let mut transcripts = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("reading transcript directory {}", self.dir.display()))
            .map_err(StoreError::Io)?
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match read_transcript(&path).await {
                Ok(t) => transcripts.push(t),
                Err(e) => tracing::warn!(path = %path.display(), "skipping transcript: {e:#}"),
            }
        }
        Ok(transcripts)
    }

    fn path_for(&self, chat_id: &str) -> PathBuf {
        self.dir.join(format!("{chat_id}.json"))
    }
}

/// Chat ids become filenames, so only a conservative character set is accepted.
fn validate_chat_id(chat_id: &str) -> Result<(), StoreError> {
    if chat_id.is_empty() {
        return Err(StoreError::Validation(
            "chat_id and chat_content are required".into(),
        ));
    }
    let safe = chat_id.len() <= MAX_CHAT_ID_LEN
        && !chat_id.starts_with('.')
        && chat_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !safe {
        return Err(StoreError::Validation(format!(
            "chat_id may only contain letters, digits, '-', '_' and '.' (max {MAX_CHAT_ID_LEN} chars)"
        )));
    }
    Ok(())
}

fn is_blank(content: &Value) -> bool {
    match content {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}

fn temp_suffix() -> String {
    let mut bytes = [0u8; 8];
    rand::RngExt::fill(&mut rand::rng(), &mut bytes);
    hex::encode(bytes)
}

async fn write_replace(tmp: &Path, dest: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    tokio::fs::write(tmp, bytes)
        .await
        .with_context(|| format!("writing transcript {}", tmp.display()))?;
    if let Err(e) = tokio::fs::rename(tmp, dest).await {
        let _ = tokio::fs::remove_file(tmp).await;
        return Err(anyhow::Error::new(e)
            .context(format!("replacing transcript {}", dest.display())));
    }
    Ok(())
}

async fn read_transcript(path: &Path) -> anyhow::Result<Transcript> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}
