use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(3);
pub const SILENCE_WINDOW: Duration = Duration::from_millis(300);

/// Raw WebSocket client standing in for a camera or viewer.
pub struct TestSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestSocket {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (stream, _) = connect_async(url)
            .await
            .with_context(|| format!("connecting to {url}"))?;
        Ok(Self { stream })
    }

    pub async fn send_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    pub async fn send_binary(&mut self, data: Vec<u8>) -> anyhow::Result<()> {
        self.stream.send(Message::binary(data)).await?;
        Ok(())
    }

    async fn next_data(&mut self, timeout: Duration) -> anyhow::Result<Option<Message>> {
        loop {
            let next = tokio::time::timeout(timeout, self.stream.next())
                .await
                .map_err(|_| anyhow!("timed out waiting for a message"))?;

            match next {
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(msg)) => return Ok(Some(msg)),
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    pub async fn recv_text(&mut self) -> anyhow::Result<String> {
        match self.next_data(RECV_TIMEOUT).await? {
            Some(Message::Text(text)) => Ok(text.as_str().to_owned()),
            other => bail!("expected text, got {other:?}"),
        }
    }

    pub async fn recv_json(&mut self) -> anyhow::Result<serde_json::Value> {
        let text = self.recv_text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn recv_binary(&mut self) -> anyhow::Result<Bytes> {
        match self.next_data(RECV_TIMEOUT).await? {
            Some(Message::Binary(data)) => Ok(data),
            other => bail!("expected binary, got {other:?}"),
        }
    }

    /// True when nothing but control frames arrives within the window.
    pub async fn is_silent(&mut self) -> bool {
        self.next_data(SILENCE_WINDOW).await.is_err()
    }

    /// True once the server closes the connection.
    pub async fn is_closed(&mut self) -> bool {
        matches!(self.next_data(RECV_TIMEOUT).await, Ok(None) | Err(_))
    }
}
