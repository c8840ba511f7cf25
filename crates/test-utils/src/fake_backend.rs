//! In-process fake data server.
//!
//! Accepts TCP connections on a loopback port, parses GETDATA request
//! lines, and replies with scripted responses keyed by (source,
//! action). Records a hit count per key so tests can assert which
//! remote calls a code path issued (including "none").

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Scripted reply for one (source, action) pair.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// `OK: n` followed by the lines.
    Lines(Vec<String>),
    /// `ERROR: message`.
    Error(String),
    /// Close the connection without replying.
    Hangup,
}

#[derive(Default)]
struct Script {
    responses: HashMap<(String, String), FakeResponse>,
    hits: HashMap<(String, String), u64>,
    requests: HashMap<(String, String), Vec<String>>,
}

/// Handle to a running fake backend.
pub struct FakeBackend {
    addr: SocketAddr,
    script: Arc<Mutex<Script>>,
}

impl FakeBackend {
    /// Bind a loopback port and start serving.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let script = Arc::new(Mutex::new(Script::default()));

        let serve_script = Arc::clone(&script);
        tokio::spawn(async move {
            loop {
                let Ok((conn, _)) = listener.accept().await else {
                    break;
                };
                let script = Arc::clone(&serve_script);
                tokio::spawn(async move {
                    let _ = serve_connection(conn, script).await;
                });
            }
        });

        Ok(Self { addr, script })
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Script the reply for a (source, action) pair.
    pub fn respond(&self, source: &str, action: &str, response: FakeResponse) {
        self.script
            .lock()
            .unwrap()
            .responses
            .insert((source.to_string(), action.to_string()), response);
    }

    /// Requests seen for a (source, action) pair.
    pub fn hits(&self, source: &str, action: &str) -> u64 {
        self.script
            .lock()
            .unwrap()
            .hits
            .get(&(source.to_string(), action.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Requests seen across all keys.
    pub fn total_hits(&self) -> u64 {
        self.script.lock().unwrap().hits.values().sum()
    }

    /// Raw request lines seen for a (source, action) pair, in order.
    pub fn requests(&self, source: &str, action: &str) -> Vec<String> {
        self.script
            .lock()
            .unwrap()
            .requests
            .get(&(source.to_string(), action.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

async fn serve_connection(conn: TcpStream, script: Arc<Mutex<Script>>) -> std::io::Result<()> {
    let (read_half, mut write_half) = conn.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        let Some((source, action)) = parse_request(&line) else {
            write_half.write_all(b"ERROR: bad request\n").await?;
            continue;
        };

        let response = {
            let mut script = script.lock().unwrap();
            let key = (source.clone(), action.clone());
            *script.hits.entry(key.clone()).or_insert(0) += 1;
            script.requests.entry(key.clone()).or_default().push(line.clone());
            script.responses.get(&key).cloned()
        };

        match response {
            Some(FakeResponse::Lines(payload)) => {
                write_half
                    .write_all(format!("OK: {}\n", payload.len()).as_bytes())
                    .await?;
                for line in &payload {
                    write_half.write_all(line.as_bytes()).await?;
                    write_half.write_all(b"\n").await?;
                }
            }
            Some(FakeResponse::Error(msg)) => {
                write_half
                    .write_all(format!("ERROR: {}\n", msg).as_bytes())
                    .await?;
            }
            Some(FakeResponse::Hangup) | None => {
                // Unknown key also hangs up, which surfaces in tests as
                // a transport error rather than a silent empty reply.
                break;
            }
        }
    }
    Ok(())
}

/// Extract (source, action) from a GETDATA request line.
fn parse_request(line: &str) -> Option<(String, String)> {
    let query = line.strip_prefix("GETDATA: ")?;
    let mut source = None;
    let mut action = None;
    for pair in query.split('&') {
        let (k, v) = pair.split_once('=')?;
        match k {
            "source" => source = Some(v.to_string()),
            "action" => action = Some(v.to_string()),
            _ => {}
        }
    }
    Some((source?, action?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let (s, a) =
            parse_request("GETDATA: source=hvo_seismic&action=channels&west=-156").unwrap();
        assert_eq!(s, "hvo_seismic");
        assert_eq!(a, "channels");
        assert!(parse_request("HELLO").is_none());
    }

    #[tokio::test]
    async fn test_scripted_roundtrip() {
        let backend = FakeBackend::start().await.unwrap();
        backend.respond(
            "s",
            "channels",
            FakeResponse::Lines(vec!["1:AAA:10:20".into()]),
        );

        let conn = TcpStream::connect((backend.host(), backend.port()))
            .await
            .unwrap();
        let (read_half, mut write_half) = conn.into_split();
        write_half
            .write_all(b"GETDATA: source=s&action=channels\n")
            .await
            .unwrap();

        let mut lines = BufReader::new(read_half).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "OK: 1");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "1:AAA:10:20");
        assert_eq!(backend.hits("s", "channels"), 1);
    }
}
