//! File-drop outbox.
//!
//! Each delivery is one JSON file named
//! `<YYYYMMDDTHHMMSSZ>-<12 hex nonce>.json`. A separate sender picks files up
//! and removes them; this side only ever creates new files.
//!
//! Files are written to a hidden `.tmp` sibling first and renamed into
//! place, so a reader never sees a partial message.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::models::HealthStatus;
use crate::error::{Result, StatusError};

static DELIVERY_COUNTER: AtomicU64 = AtomicU64::new(0);

const NONCE_LEN: usize = 12;

/// Message handed to the notification sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxMessage {
    /// File stem; unique per message.
    pub id: String,
    pub channel: String,
    pub chat_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    /// `text` or `json`: how `body` was rendered.
    pub format: String,
    pub health: HealthStatus,
    pub body: String,
}

/// Directory-backed drop queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    dir: PathBuf,
    channel: String,
    chat_id: Option<i64>,
}

impl Outbox {
    pub fn new(dir: impl Into<PathBuf>, channel: impl Into<String>, chat_id: Option<i64>) -> Self {
        Self {
            dir: dir.into(),
            channel: channel.into(),
            chat_id,
        }
    }

    /// Queue a rendered report. Returns the path of the new file.
    ///
    /// # Errors
    ///
    /// `DeliveryFailed` when the directory cannot be created, the file
    /// cannot be written, or the target name already exists.
    pub fn deliver(
        &self,
        body: &str,
        format: &str,
        health: HealthStatus,
        created_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let id = message_id(created_at);
        let message = OutboxMessage {
            id: id.clone(),
            channel: self.channel.clone(),
            chat_id: self.chat_id,
            created_at,
            format: format.to_string(),
            health,
            body: body.to_string(),
        };
        let content = serde_json::to_vec_pretty(&message)?;

        let target = self.dir.join(format!("{id}.json"));
        self.write_new(&target, &content)
            .map_err(|e| StatusError::DeliveryFailed {
                path: target.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %target.display(), channel = %self.channel, "report queued");
        Ok(target)
    }

    fn write_new(&self, target: &Path, content: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("message");
        let temp_path = self.dir.join(format!(".{file_name}.tmp"));

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)?;
            file.write_all(content)?;
            file.sync_all()?;
        }

        // link fails with AlreadyExists instead of replacing the target
        let linked = fs::hard_link(&temp_path, target);
        let _ = fs::remove_file(&temp_path);
        linked
    }
}

/// `<YYYYMMDDTHHMMSSZ>-<nonce>`.
#[must_use]
pub fn message_id(created_at: DateTime<Utc>) -> String {
    format!("{}-{}", created_at.format("%Y%m%dT%H%M%SZ"), nonce())
}

/// 12 hex characters from SHA-256 over the process id, a nanosecond clock
/// and a process-wide counter.
fn nonce() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    let counter = DELIVERY_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    hasher.update(counter.to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..NONCE_LEN].to_string()
}
