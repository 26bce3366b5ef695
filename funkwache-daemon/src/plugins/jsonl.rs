//! JSON-lines archive plugin -- appends one JSON record per alarm.
//!
//! Stands in for external record sinks: every dispatched alarm is
//! appended to a file as a single JSON line, ready for ingestion by
//! whatever wants the history. The file is opened once at init and
//! flushed after every write so a crash loses at most the current
//! line.

use std::path::PathBuf;

use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use funkwache_core::error::{FunkwacheError, PluginError};
use funkwache_core::event::AlarmEvent;
use funkwache_core::plugin::{AlarmPlugin, PluginInfo, PluginKind};

/// One archive line.
#[derive(Serialize)]
struct ArchiveRecord<'a> {
    /// RFC 3339 rendering of the event timestamp.
    time: String,
    #[serde(flatten)]
    event: &'a AlarmEvent,
}

/// JSON-lines archive plugin.
pub struct JsonlPlugin {
    info: PluginInfo,
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonlPlugin {
    /// Create an archive plugin writing to `path`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            info: PluginInfo {
                name: name.into(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                description: format!("appends alarms to {}", path.display()),
                kind: PluginKind::Archive,
            },
            path,
            file: Mutex::new(None),
        }
    }
}

impl AlarmPlugin for JsonlPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    async fn init(&mut self) -> Result<(), FunkwacheError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        *self.file.lock().await = Some(file);
        tracing::debug!(path = %self.path.display(), "archive file opened");
        Ok(())
    }

    async fn deliver(&self, event: &AlarmEvent) -> Result<(), FunkwacheError> {
        let record = ArchiveRecord {
            time: chrono::DateTime::<chrono::Utc>::from(event.timestamp).to_rfc3339(),
            event,
        };
        let mut line = serde_json::to_string(&record).map_err(|e| {
            FunkwacheError::from(PluginError::DeliveryFailed {
                name: self.info.name.clone(),
                reason: format!("serialization failed: {e}"),
            })
        })?;
        line.push('\n');

        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or_else(|| {
            FunkwacheError::from(PluginError::DeliveryFailed {
                name: self.info.name.clone(),
                reason: "archive file not open (init not called?)".to_owned(),
            })
        })?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), FunkwacheError> {
        if let Some(mut file) = self.file.lock().await.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }
}
