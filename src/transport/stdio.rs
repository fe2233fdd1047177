//! Line-delimited stdio transport.
//!
//! One reader task, driven through the engine's `Hal`, blocks on
//! `tokio::io::stdin()` and hands each nonempty line to the protocol
//! engine as one message. Output is serialized through a single
//! `tokio::sync::Mutex<BufWriter<Stdout>>` so interleaved responses never
//! tear. EOF ends the reader task and resolves `run`.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::protocol::engine::{ConnectionHandle, ProtocolEngine};

pub const STDIO_CONNECTION_ID: &str = "stdio-0";

pub async fn run(engine: Arc<ProtocolEngine>) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::with_capacity(8192, stdin).lines();
    let stdout = Mutex::new(BufWriter::with_capacity(8192, tokio::io::stdout()));
    let conn = ConnectionHandle::new(STDIO_CONNECTION_ID);

    info!("stdio transport running");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(reply) = engine.handle_message(&line, &conn).await {
            let mut out = stdout.lock().await;
            if let Err(err) = out.write_all(reply.as_bytes()).await {
                error!(%err, "failed writing response to stdout");
                break;
            }
            if !reply.ends_with('\n') {
                let _ = out.write_all(b"\n").await;
            }
            if let Err(err) = out.flush().await {
                error!(%err, "failed flushing stdout");
                break;
            }
        }
    }

    info!("stdio transport reached EOF, shutting down");
    Ok(())
}
