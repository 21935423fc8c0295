pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod protocol;
pub mod session;
pub mod text;

pub use bridge::SessionBridge;
pub use config::{BridgeSettings, RenderMode};
pub use error::{BridgeError, BridgeResult};
pub use host::{
    BufferMaterializer, EditorBuffer, EditorHost, FsMaterializer, FsStorage, MemoryBuffer,
    MemoryHost, Storage,
};
pub use protocol::{
    BridgeEvent, BufferPosition, ChangeOrigin, ChangeRecord, InboundMessage, LinearOffset,
    QueryReply, RelativePath, SelectionRange, SelectionSet,
};
pub use session::run_session;
