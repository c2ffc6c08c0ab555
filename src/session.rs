//! In-memory chat session: message history and uploaded transcripts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::{MAX_SESSION_TIMEOUT_MINUTES, SessionConfig, UploadConfig};
use crate::error::{Ready4UniError, Result};
use crate::id::generate_session_id;
use crate::llm::Message;

/// A transcript the user has handed to the assistant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedFile {
    pub name: String,
    /// Canonical absolute path
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Hex SHA-256 of the content
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedFile {
    /// Accept a file from disk, enforcing the upload rules.
    pub fn from_path(path: &Path, rules: &UploadConfig) -> Result<Self> {
        if !path.is_file() {
            return Err(Ready4UniError::Upload(format!("File not found: {}", path.display())));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !rules.allowed_extensions.iter().any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(&extension)) {
            return Err(Ready4UniError::Upload(format!(
                "Unsupported file type '{}' (allowed: {})",
                path.display(),
                rules.allowed_extensions.join(", ")
            )));
        }

        let content = std::fs::read(path)?;
        let size_bytes = content.len() as u64;
        if size_bytes == 0 {
            return Err(Ready4UniError::Upload(format!("File is empty: {}", path.display())));
        }
        if size_bytes > rules.max_size_bytes() {
            return Err(Ready4UniError::Upload(format!(
                "File too large: {:.1} MB (max {} MB)",
                size_bytes as f64 / (1024.0 * 1024.0),
                rules.max_size_mb
            )));
        }

        let path = path.canonicalize()?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            path,
            size_bytes,
            sha256: hex::encode(Sha256::digest(&content)),
            uploaded_at: Utc::now(),
        })
    }
}

/// One conversation with the assistant
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    history: Vec<Message>,
    uploads: Vec<UploadedFile>,
    timeout: Duration,
}

impl ChatSession {
    pub fn new(config: &SessionConfig) -> Self {
        let now = Utc::now();
        Self {
            id: generate_session_id(),
            created_at: now,
            last_active: now,
            history: Vec::new(),
            uploads: Vec::new(),
            timeout: Duration::minutes(config.timeout_minutes.clamp(1, MAX_SESSION_TIMEOUT_MINUTES)),
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.last_active > self.timeout
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Last `n` messages, oldest first
    pub fn recent_history(&self, n: usize) -> &[Message] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.history.push(Message::user(content));
        self.touch();
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.history.push(Message::assistant(content));
        self.touch();
    }

    pub fn uploads(&self) -> &[UploadedFile] {
        &self.uploads
    }

    /// Register an upload; a file with identical content replaces the earlier entry.
    pub fn add_upload(&mut self, file: UploadedFile) {
        self.uploads.retain(|f| f.sha256 != file.sha256);
        log::info!("Session {}: uploaded {} ({} bytes)", self.id, file.name, file.size_bytes);
        self.uploads.push(file);
        self.touch();
    }

    /// Drop history and uploads; the session id is kept
    pub fn clear(&mut self) {
        self.history.clear();
        self.uploads.clear();
        self.touch();
    }
}
