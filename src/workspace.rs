use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub source: String,
    pub updated_at: DateTime<Utc>,
}

/// File-backed persistence for the editor draft, the localStorage analog.
pub struct DraftStore {
    path: PathBuf,
}

impl DraftStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("draft.json"),
        }
    }

    pub fn load(&self) -> Result<Option<Draft>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read draft file: {}", self.path.display()))?;
        let draft: Draft = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse draft file: {}", self.path.display()))?;
        Ok(Some(draft))
    }

    pub fn save(&self, source: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create data directory: {}", parent.display())
            })?;
        }
        let draft = Draft {
            source: source.to_string(),
            updated_at: Utc::now(),
        };
        let content =
            serde_json::to_string_pretty(&draft).context("failed to serialize draft")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write draft file: {}", self.path.display()))?;
        Ok(())
    }
}

/// The shared editable buffer and its collaborators.
///
/// The harness reads a snapshot at run start and never mutates the buffer.
/// Snippet insertion and voice transcripts are alternate writers; they only
/// supply text before a run is triggered.
pub struct Workspace {
    editor: RwLock<String>,
    transcript: RwLock<Option<String>>,
    drafts: DraftStore,
}

impl Workspace {
    pub fn new(drafts: DraftStore) -> Self {
        Self {
            editor: RwLock::new(String::new()),
            transcript: RwLock::new(None),
            drafts,
        }
    }

    /// Load a persisted draft into the editor. Returns whether one existed.
    pub async fn restore_draft(&self) -> Result<bool> {
        match self.drafts.load()? {
            Some(draft) => {
                *self.editor.write().await = draft.source;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Immutable copy of the current buffer for one run.
    pub async fn snapshot(&self) -> String {
        self.editor.read().await.clone()
    }

    pub async fn set_source(&self, source: String) -> Result<()> {
        *self.editor.write().await = source;
        let editor = self.editor.read().await;
        self.drafts.save(&editor)
    }

    /// Store a voice transcript and seed the editor with a starter script.
    pub async fn set_transcript(&self, text: String) -> Result<()> {
        let starter = format!("# Bot idea: {text}\nprint(\"Generated bot for: {text}\")");
        *self.transcript.write().await = Some(text);
        self.set_source(starter).await
    }

    pub async fn last_transcript(&self) -> Option<String> {
        self.transcript.read().await.clone()
    }
}
