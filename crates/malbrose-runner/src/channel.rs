//! JSON-lines channel between the UI layer and the bridge.
//!
//! One request object per input line, one reply object per output line.
//! A line that is not a request still gets a reply so the caller never
//! waits on a lost call.

use std::future::Future;

use malbrose_secure_storage::{ErrorCode, MethodCall, Reply, SecureStorageBridge};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Counters reported when the channel closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub requests: u64,
    pub failures: u64,
}

/// Handle one input line. Blank lines produce no reply.
pub fn handle_line(bridge: &SecureStorageBridge, line: &str) -> serde_json::Result<Option<String>> {
    respond(bridge, line)
        .map(|(id, reply)| reply.to_line(id.as_ref()))
        .transpose()
}

fn respond(bridge: &SecureStorageBridge, line: &str) -> Option<(Option<Value>, Reply)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match parse_call(line) {
        Ok(call) => {
            let reply = bridge.handle(&call);
            Some((call.id, reply))
        }
        Err((id, message)) => {
            warn!(%message, "rejecting malformed request");
            Some((id, Reply::error(ErrorCode::InvalidArguments, message)))
        }
    }
}

fn parse_call(line: &str) -> Result<MethodCall, (Option<Value>, String)> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| (None, format!("Malformed request: {e}")))?;
    let id = value.get("id").cloned().filter(|id| !id.is_null());
    serde_json::from_value(value).map_err(|e| (id, format!("Malformed request: {e}")))
}

/// Serve requests from `reader` until EOF, writing replies to `writer`.
///
/// Lines are read as raw bytes; a line that is not UTF-8 is answered with
/// `INVALID_ARGUMENTS` like any other malformed request.
pub async fn serve<R, W>(
    bridge: &SecureStorageBridge,
    mut reader: R,
    mut writer: W,
) -> anyhow::Result<ChannelStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = ChannelStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let response = match std::str::from_utf8(&buf) {
            Ok(line) => respond(bridge, line),
            Err(e) => {
                warn!(error = %e, "rejecting request that is not UTF-8");
                let message = format!("Malformed request: {e}");
                Some((None, Reply::error(ErrorCode::InvalidArguments, message)))
            }
        };
        let Some((id, reply)) = response else {
            continue;
        };
        stats.requests += 1;
        if !reply.is_success() {
            stats.failures += 1;
        }
        let reply = reply.to_line(id.as_ref())?;
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    debug!(requests = stats.requests, failures = stats.failures, "channel closed");
    Ok(stats)
}

/// How a served session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    InputClosed(ChannelStats),
    Interrupted,
}

/// [`serve`], stopped early when `interrupt` resolves.
///
/// An interrupted session may leave a read pending on `reader`.
pub async fn serve_until<R, W, F>(
    bridge: &SecureStorageBridge,
    reader: R,
    writer: W,
    interrupt: F,
) -> anyhow::Result<Shutdown>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    tokio::select! {
        stats = serve(bridge, reader, writer) => Ok(Shutdown::InputClosed(stats?)),
        () = interrupt => Ok(Shutdown::Interrupted),
    }
}
