//! Wire data model shared by the bridge and its collaborators.

pub mod message;
pub mod path;
pub mod types;

pub use message::{BridgeEvent, InboundMessage, QueryReply};
pub use path::RelativePath;
pub use types::{
    BufferPosition, ChangeOrigin, ChangeRecord, LinearOffset, SelectionRange, SelectionSet,
    split_lines,
};
