//! Messages exchanged with the transport collaborator.

use serde::{Deserialize, Serialize};

use super::path::RelativePath;
use super::types::{BufferPosition, ChangeRecord, LinearOffset, SelectionSet};

/// Events emitted by the bridge for the transport to carry to peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeEvent {
    /// A local edit, or the synthetic activation change.
    ChangeFile {
        path: RelativePath,
        change: ChangeRecord,
    },
    /// The local participant's selection changed.
    ChangeSelection {
        path: RelativePath,
        selection: SelectionSet,
    },
}

/// Calls the transport makes into the bridge, in JSON-lines form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    Change {
        path: RelativePath,
        change: ChangeRecord,
    },
    CreateFile {
        path: RelativePath,
        #[serde(default)]
        content: String,
    },
    CreateDirectory {
        path: RelativePath,
    },
    DeleteFile {
        path: RelativePath,
    },
    Highlight {
        selections: Vec<SelectionSet>,
    },
    PosFromIndex {
        id: u64,
        path: RelativePath,
        offset: LinearOffset,
    },
    IndexFromPos {
        id: u64,
        path: RelativePath,
        position: BufferPosition,
    },
}

/// Answers to coordinate queries and reports of failed inbound calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QueryReply {
    Position { id: u64, position: BufferPosition },
    Offset { id: u64, offset: LinearOffset },
    Error { message: String },
}
