use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{Transport, TransportError};
use crate::protocol::Message;

/// Newline-delimited JSON over a reader/writer pair, normally stdin/stdout
pub struct StdioTransport<R, W> {
    reader: Mutex<Lines<BufReader<R>>>,
    writer: Mutex<W>,
    closed: CancellationToken,
}

impl StdioTransport<tokio::io::Stdin, tokio::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(BufReader::new(reader).lines()),
            writer: Mutex::new(writer),
            closed: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl<R, W> Transport for StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn recv(&self) -> Result<Option<Message>, TransportError> {
        let mut lines = self.reader.lock().await;

        loop {
            let line = tokio::select! {
                biased;
                _ = self.closed.cancelled() => return Ok(None),
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }

            match Message::from_slice(line.as_bytes()) {
                Ok(msg) => return Ok(Some(msg)),
                Err(err) => warn!(error = %err, "skipping malformed message"),
            }
        }
    }

    async fn send(&self, msg: &Message) -> Result<(), TransportError> {
        let mut data = serde_json::to_vec(msg)?;
        data.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&data).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn close(&self) {
        self.closed.cancel();
    }
}
