//! JSONL file store for council sessions.
//!
//! Each save appends one JSON line with an RFC3339 timestamp envelope.
//! The file is append-only; re-saving a session id appends a new line and
//! readers keep the last occurrence. Thread-safe via
//! `Mutex<BufWriter<File>>`, flushed on every save.

use async_trait::async_trait;
use council_application::ports::session_store::{SessionStore, StoreError};
use council_domain::{CouncilSession, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// One line of the session file
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    timestamp: String,
    session: CouncilSession,
}

pub struct JsonlSessionStore {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlSessionStore {
    /// Open (or create) the session file, creating parent directories
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last saved version of every session in the file. Malformed lines
    /// are logged and skipped so one corrupt record cannot hide the rest.
    fn read_all(&self) -> Result<HashMap<SessionId, CouncilSession>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        let mut sessions = HashMap::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<SessionRecord>(line) {
                Ok(record) => {
                    sessions.insert(record.session.session_id, record.session);
                }
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Skipping malformed session record"
                    );
                }
            }
        }
        Ok(sessions)
    }
}

#[async_trait]
impl SessionStore for JsonlSessionStore {
    async fn save(&self, session: &CouncilSession) -> Result<(), StoreError> {
        let record = SessionRecord {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            session: session.clone(),
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Other("session writer poisoned".to_string()))?;
        writeln!(writer, "{line}").map_err(|e| StoreError::Io(e.to_string()))?;
        writer.flush().map_err(|e| StoreError::Io(e.to_string()))
    }

    async fn load(&self, session_id: SessionId) -> Result<CouncilSession, StoreError> {
        self.read_all()?
            .remove(&session_id)
            .ok_or(StoreError::NotFound(session_id))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CouncilSession>, StoreError> {
        let mut sessions: Vec<CouncilSession> = self.read_all()?.into_values().collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions.truncate(limit);
        Ok(sessions)
    }
}
