//! # Control Messages
//!
//! The message shapes of the control channel. Every inbound command carries
//! its own reply channel: a oneshot for single replies, an event stream for
//! the bulk playlist job. Reply payloads serialize to the JSON shapes the
//! application UI consumes.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

/// Single asynchronous reply to a control command
#[derive(Debug, Clone, Serialize)]
pub struct CommandReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Outcome of one bulk-job item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Cached,
    Failed,
}

/// Per-item breakdown attached to a bulk-job completion
#[derive(Debug, Clone, Serialize)]
pub struct JobDetails {
    #[serde(rename = "playlistId")]
    pub playlist_id: String,
    pub cached: Vec<String>,
    pub failed: Vec<String>,
}

/// Streamed reply of a bulk playlist job: zero or more progress events
/// followed by exactly one completion
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    #[serde(rename = "progress")]
    Progress {
        current: usize,
        total: usize,
        percent: u32,
        #[serde(rename = "currentItem")]
        current_item: String,
        status: ItemStatus,
    },
    #[serde(rename = "complete")]
    Complete {
        success: bool,
        metadata: bool,
        cached: usize,
        failed: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<JobDetails>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl JobEvent {
    /// Terminal completion for a job that never got to process items
    pub fn failure(error: impl Into<String>) -> Self {
        JobEvent::Complete {
            success: false,
            metadata: false,
            cached: 0,
            failed: 0,
            details: None,
            error: Some(error.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, JobEvent::Complete { .. })
    }
}

/// Operational commands accepted from the application UI
#[derive(Debug)]
pub enum Command {
    /// Force the lifecycle manager out of the waiting phase; no reply
    SkipWaiting,
    /// Delete all four stores
    ClearCache {
        reply: oneshot::Sender<CommandReply>,
    },
    /// Fetch and persist one resource into the audio store
    CacheAudio {
        url: String,
        reply: oneshot::Sender<CommandReply>,
    },
    /// Bulk-cache a playlist's metadata and audio; streams progress then
    /// exactly one completion
    CachePlaylist {
        playlist_id: String,
        audio_urls: Vec<String>,
        auth_token: Option<String>,
        events: mpsc::Sender<JobEvent>,
    },
    /// Drop a playlist's metadata entry and every listed audio URL
    RemovePlaylistCache {
        playlist_id: String,
        audio_urls: Vec<String>,
        reply: oneshot::Sender<CommandReply>,
    },
}
