//! Inbound status events pushed by the analysis service over the streaming channel.
use serde::Deserialize;
use thiserror::Error;

use crate::TaskId;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Sent once before the first chunk; announces the line and chunk totals.
    Start {
        task_id: TaskId,
        file_name: Option<String>,
        total_lines: Option<u64>,
        total_chunks: Option<u32>,
    },
    Chunk(ChunkProgress),
    Complete {
        task_id: TaskId,
        file_name: Option<String>,
        result: Option<serde_json::Value>,
    },
    Error {
        task_id: TaskId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkProgress {
    pub task_id: TaskId,
    pub file_name: Option<String>,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub processed_count: u64,
    pub total_lines: u64,
}

impl StreamEvent {
    pub fn task_id(&self) -> &TaskId {
        match self {
            StreamEvent::Start { task_id, .. }
            | StreamEvent::Complete { task_id, .. }
            | StreamEvent::Error { task_id, .. } => task_id,
            StreamEvent::Chunk(chunk) => &chunk.task_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Start { .. } => "START",
            StreamEvent::Chunk(_) => "CHUNK",
            StreamEvent::Complete { .. } => "COMPLETE",
            StreamEvent::Error { .. } => "ERROR",
        }
    }
}

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("invalid event payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event without task_id")]
    MissingTaskId,
    #[error("unknown event kind {0:?}")]
    UnknownEvent(Option<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(rename = "task_id")]
    task_id: Option<String>,
    event: Option<String>,
    file_name: Option<String>,
    chunk_index: Option<u32>,
    total_chunks: Option<u32>,
    processed_count: Option<u64>,
    total_lines: Option<u64>,
    result: Option<serde_json::Value>,
    message: Option<String>,
}

/// Decodes one text frame from the streaming channel.
pub fn decode_event(text: &str) -> Result<StreamEvent, EventDecodeError> {
    let wire: WireMessage = serde_json::from_str(text)?;
    let task_id = match wire.task_id {
        Some(id) if !id.is_empty() => TaskId::new(id),
        _ => return Err(EventDecodeError::MissingTaskId),
    };

    let event = match wire.event.as_deref() {
        Some("START") => StreamEvent::Start {
            task_id,
            file_name: wire.file_name,
            total_lines: wire.total_lines,
            total_chunks: wire.total_chunks,
        },
        Some("CHUNK") => StreamEvent::Chunk(ChunkProgress {
            task_id,
            file_name: wire.file_name,
            chunk_index: wire.chunk_index.unwrap_or(0),
            total_chunks: wire.total_chunks.unwrap_or(0),
            processed_count: wire.processed_count.unwrap_or(0),
            total_lines: wire.total_lines.unwrap_or(0),
        }),
        Some("COMPLETE") => StreamEvent::Complete {
            task_id,
            file_name: wire.file_name,
            result: wire.result,
        },
        Some("ERROR") => StreamEvent::Error {
            task_id,
            message: wire
                .message
                .unwrap_or_else(|| "analysis failed".to_string()),
        },
        _ => return Err(EventDecodeError::UnknownEvent(wire.event)),
    };
    Ok(event)
}
