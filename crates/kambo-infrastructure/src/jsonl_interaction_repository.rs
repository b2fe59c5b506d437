//! JSON-lines persistence for interactions and security events.

use async_trait::async_trait;
use kambo_core::error::{KamboError, Result};
use kambo_core::repository::{InteractionRecord, InteractionRecorder, SecurityEvent};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const CONVERSATIONS_FILE: &str = "conversations.jsonl";
const SECURITY_EVENTS_FILE: &str = "security_events.jsonl";

/// Append-only recorder writing one JSON object per line.
///
/// Directory structure:
/// ```text
/// base_dir/
/// ├── conversations.jsonl
/// └── security_events.jsonl
/// ```
pub struct JsonlInteractionRepository {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlInteractionRepository {
    /// Creates the repository, making sure `base_dir` exists.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await.map_err(|e| {
            KamboError::data_access(format!(
                "Failed to create data directory {}: {e}",
                base_dir.display()
            ))
        })?;

        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Reads every stored interaction, oldest first.
    pub async fn list_interactions(&self) -> Result<Vec<InteractionRecord>> {
        self.read_lines(CONVERSATIONS_FILE).await
    }

    /// Reads every stored security event, oldest first.
    pub async fn list_security_events(&self) -> Result<Vec<SecurityEvent>> {
        self.read_lines(SECURITY_EVENTS_FILE).await
    }

    async fn append<T: Serialize>(&self, file_name: &str, record: &T) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.base_dir.join(file_name))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_lines<T: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<T>> {
        let path = self.base_dir.join(file_name);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    file = file_name,
                    line = index + 1,
                    error = %e,
                    "[JsonlRepository] Skipping malformed line"
                ),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl InteractionRecorder for JsonlInteractionRepository {
    async fn record_interaction(&self, record: InteractionRecord) -> Result<()> {
        self.append(CONVERSATIONS_FILE, &record).await?;
        tracing::debug!(run_id = %record.run_id, "[JsonlRepository] Recorded interaction");
        Ok(())
    }

    async fn record_security_event(&self, event: SecurityEvent) -> Result<()> {
        self.append(SECURITY_EVENTS_FILE, &event).await?;
        tracing::debug!(event_type = event.event_type.as_str(), "[JsonlRepository] Recorded security event");
        Ok(())
    }
}
