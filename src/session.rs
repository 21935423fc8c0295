//! Headless JSON-lines session driver.
//!
//! Reads one [`InboundMessage`] per line, dispatches it to a [`SessionBridge`]
//! and writes outbound [`BridgeEvent`]s and [`QueryReply`]s as JSON lines.
//! Messages are handled one at a time, in arrival order.

use log::{debug, warn};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::bridge::SessionBridge;
use crate::error::{BridgeError, BridgeResult};
use crate::protocol::{BridgeEvent, InboundMessage, QueryReply};

const LOG_TARGET: &str = "editbridge::session";

/// Drive `bridge` from `input` until EOF.
///
/// Events emitted while a message is being handled are written before the
/// next message is read. Remaining events are flushed at EOF.
pub async fn run_session<R, W>(
    bridge: &SessionBridge,
    events: &mut UnboundedReceiver<BridgeEvent>,
    input: R,
    mut output: W,
) -> BridgeResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => write_line(&mut output, &event).await?,
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    handle_line(bridge, &line, &mut output).await?;
                    drain_events(events, &mut output).await?;
                }
                None => break,
            },
        }
    }

    drain_events(events, &mut output).await?;
    output.flush().await?;
    debug!(target: LOG_TARGET, "Input closed");
    Ok(())
}

async fn handle_line<W>(bridge: &SessionBridge, line: &str, output: &mut W) -> BridgeResult<()>
where
    W: AsyncWrite + Unpin,
{
    let message: InboundMessage = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(e) => {
            warn!(target: LOG_TARGET, "Malformed message: {}", e);
            return write_line(output, &error_reply(BridgeError::from(e))).await;
        }
    };

    if let Some(reply) = dispatch(bridge, message).await {
        write_line(output, &reply).await?;
    }
    Ok(())
}

/// Run one inbound message. Returns the reply to write, if any.
pub async fn dispatch(bridge: &SessionBridge, message: InboundMessage) -> Option<QueryReply> {
    let result = match message {
        InboundMessage::Change { path, change } => bridge.change(&path, &change).await,
        InboundMessage::CreateFile { path, content } => bridge.create_file(&path, &content).await,
        InboundMessage::CreateDirectory { path } => bridge.create_directory(&path).await,
        InboundMessage::DeleteFile { path } => bridge.delete_file(&path).await,
        InboundMessage::Highlight { selections } => {
            bridge.highlight(selections);
            Ok(())
        }
        InboundMessage::PosFromIndex { id, path, offset } => {
            return Some(match bridge.position_from_offset(&path, offset).await {
                Ok(position) => QueryReply::Position { id, position },
                Err(e) => error_reply(e),
            });
        }
        InboundMessage::IndexFromPos { id, path, position } => {
            return Some(match bridge.offset_from_position(&path, position).await {
                Ok(offset) => QueryReply::Offset { id, offset },
                Err(e) => error_reply(e),
            });
        }
    };
    result.err().map(error_reply)
}

fn error_reply(error: BridgeError) -> QueryReply {
    warn!(target: LOG_TARGET, "{}", error);
    QueryReply::Error {
        message: error.to_string(),
    }
}

async fn drain_events<W>(
    events: &mut UnboundedReceiver<BridgeEvent>,
    output: &mut W,
) -> BridgeResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Ok(event) = events.try_recv() {
        write_line(output, &event).await?;
    }
    Ok(())
}

async fn write_line<W, T>(output: &mut W, value: &T) -> BridgeResult<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    output.write_all(&line).await?;
    output.flush().await?;
    Ok(())
}
