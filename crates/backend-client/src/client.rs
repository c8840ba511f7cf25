//! Line-protocol client for the remote data server.
//!
//! Request: one line `GETDATA: source=<id>&action=<name>[&k=v...]`.
//! Response: `OK: <n>` followed by `n` payload lines, or
//! `ERROR: <message>`. Payload lines are opaque to this module.
//!
//! A client that hits an I/O error is marked broken; the pool evicts
//! broken clients instead of reusing them.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tracing::debug;
use viz_common::{RequestParams, VizError, VizResult};

/// Object-safe transport bound; satisfied by TCP streams and by
/// in-memory duplex pipes in tests.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// One live connection to a remote data server.
pub struct BackendClient {
    stream: BufStream<Box<dyn Transport>>,
    broken: bool,
}

impl BackendClient {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            stream: BufStream::new(transport),
            broken: false,
        }
    }

    /// Whether this connection has seen an I/O failure and must not be
    /// returned to the available set.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Force-mark the connection broken (e.g. after a protocol-level
    /// violation that leaves the stream in an unknown state).
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    /// Issue one request and collect the ordered payload lines.
    pub async fn get_text(
        &mut self,
        source: &str,
        action: &str,
        params: &RequestParams,
    ) -> VizResult<Vec<String>> {
        let request = build_request_line(source, action, params);
        debug!(%source, %action, "backend request");

        match self.exchange(&request).await {
            Ok(Reply::Payload(lines)) => Ok(lines),
            // A backend-level refusal leaves the stream consistent:
            // the header was read and no payload follows. The
            // connection stays reusable.
            Ok(Reply::Refused(msg)) => Err(VizError::Transport(msg)),
            Err(e) => {
                self.broken = true;
                Err(e)
            }
        }
    }

    async fn exchange(&mut self, request: &str) -> VizResult<Reply> {
        self.stream.write_all(request.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;

        let mut header = String::new();
        let n = self.stream.read_line(&mut header).await?;
        if n == 0 {
            return Err(VizError::Transport("connection closed by backend".into()));
        }
        let header = header.trim_end();

        if let Some(msg) = header.strip_prefix("ERROR:") {
            return Ok(Reply::Refused(msg.trim().to_string()));
        }
        let count: usize = header
            .strip_prefix("OK:")
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| {
                VizError::Transport(format!("unexpected response header: {:?}", header))
            })?;

        let mut lines = Vec::with_capacity(count);
        for _ in 0..count {
            let mut line = String::new();
            let n = self.stream.read_line(&mut line).await?;
            if n == 0 {
                return Err(VizError::Transport(
                    "backend closed mid-response".into(),
                ));
            }
            lines.push(line.trim_end().to_string());
        }
        Ok(Reply::Payload(lines))
    }
}

/// Outcome of one request/response exchange that did not disturb the
/// stream: either the payload or a backend-level refusal.
enum Reply {
    Payload(Vec<String>),
    Refused(String),
}

/// Build the request line; extra parameters are sorted by key so the
/// wire form is deterministic.
fn build_request_line(source: &str, action: &str, params: &RequestParams) -> String {
    let mut line = format!("GETDATA: source={}&action={}", source, action);
    let mut extras: Vec<(&str, &str)> = params.iter().collect();
    extras.sort_by_key(|(k, _)| *k);
    for (k, v) in extras {
        line.push('&');
        line.push_str(k);
        line.push('=');
        line.push_str(v);
    }
    line
}

/// Creates fresh connections for a pool; the pool reconnects lazily
/// through this after evicting a broken client.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> VizResult<BackendClient>;
}

/// Connects over TCP to a configured backend endpoint.
pub struct TcpConnector {
    host: String,
    port: u16,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> VizResult<BackendClient> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                VizError::Transport(format!("connect {}:{}: {}", self.host, self.port, e))
            })?;
        stream.set_nodelay(true).ok();
        Ok(BackendClient::new(Box::new(stream)))
    }
}
