use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;

use super::client;
use super::types::WsInMessage;

/// Control surface HTML. Debug builds prefer the on-disk copy so the page
/// can be edited without rebuilding; release builds always use the embedded
/// copy.
fn control_page() -> String {
    #[cfg(debug_assertions)]
    {
        let path = crate::assets::assets_dir().join("web/control.html");
        if let Ok(content) = std::fs::read_to_string(&path) {
            return content;
        }
    }
    include_str!("../../../../assets/web/control.html").to_string()
}

/// Spawn the accept loop thread. Returns the thread handle.
pub fn spawn_accept_loop(
    port: u16,
    inbound_tx: Sender<WsInMessage>,
    clients: Arc<Mutex<Vec<Sender<String>>>>,
    latest_state: Arc<Mutex<String>>,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<JoinHandle<()>> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    log::info!("Web control server listening on http://0.0.0.0:{port}");

    let client_counter = Arc::new(AtomicUsize::new(0));

    let handle = thread::Builder::new()
        .name("zenith-web".into())
        .spawn(move || {
            // Non-blocking accept so the shutdown flag gets checked
            let _ = listener.set_nonblocking(true);

            while !shutdown.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((stream, addr)) => {
                        log::debug!("Web connection from {addr}");
                        let _ = stream.set_nonblocking(false);
                        handle_connection(
                            stream,
                            &inbound_tx,
                            &clients,
                            &latest_state,
                            &shutdown,
                            &client_counter,
                        );
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(50));
                    }
                    Err(e) => {
                        if !shutdown.load(Ordering::Relaxed) {
                            log::error!("Web accept error: {e}");
                        }
                        break;
                    }
                }
            }
            log::info!("Web accept thread shutting down");
        })?;

    Ok(handle)
}

fn handle_connection(
    mut stream: TcpStream,
    inbound_tx: &Sender<WsInMessage>,
    clients: &Arc<Mutex<Vec<Sender<String>>>>,
    latest_state: &Arc<Mutex<String>>,
    shutdown: &Arc<AtomicBool>,
    client_counter: &Arc<AtomicUsize>,
) {
    // Read the head of the request to tell a WebSocket upgrade apart from
    // plain HTTP.
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

    let mut buf = [0u8; 4096];
    let n = match stream.read(&mut buf) {
        Ok(n) if n > 0 => n,
        _ => return,
    };

    let request = String::from_utf8_lossy(&buf[..n]).into_owned();

    if is_websocket_upgrade(&request) {
        // Short read timeout so the client loop can interleave reads and
        // outbound broadcasts.
        let _ = stream.set_read_timeout(Some(Duration::from_millis(50)));
        // The handshake bytes were already consumed; replay them ahead of
        // the live stream for tungstenite.
        let prefixed = PrefixedStream::new(buf[..n].to_vec(), stream);
        match tungstenite::accept(prefixed) {
            Ok(ws) => {
                let client_id = client_counter.fetch_add(1, Ordering::Relaxed);
                let (outbound_tx, outbound_rx) = crossbeam_channel::bounded(256);

                // Latest state for initial sync
                let state = latest_state.lock().unwrap().clone();

                clients.lock().unwrap().push(outbound_tx);

                let tx = inbound_tx.clone();
                let flag = shutdown.clone();

                thread::Builder::new()
                    .name(format!("zenith-web-client-{client_id}"))
                    .spawn(move || {
                        client::run_client(ws, tx, outbound_rx, state, flag, client_id);
                    })
                    .ok();
            }
            Err(e) => {
                log::debug!("WebSocket handshake failed: {e}");
            }
        }
    } else {
        serve_http(&mut stream, &request);
    }
}

/// Header-based upgrade detection: look for an `Upgrade:` header whose value
/// is `websocket`, per RFC 6455, rather than substring-scanning the request.
fn is_websocket_upgrade(request: &str) -> bool {
    request
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_once(':'))
        .any(|(name, value)| {
            name.trim().eq_ignore_ascii_case("upgrade")
                && value.trim().eq_ignore_ascii_case("websocket")
        })
}

fn serve_http(stream: &mut TcpStream, request: &str) {
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    let (status, content_type, body) = match path {
        "/" | "/index.html" | "/control" => {
            ("200 OK", "text/html; charset=utf-8", control_page())
        }
        _ => ("404 Not Found", "text/plain", "not found".to_string()),
    };

    let response = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Cache-Control: no-cache\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body.as_bytes());
    let _ = stream.flush();
}

/// Replays already-consumed bytes ahead of the live stream.
struct PrefixedStream {
    prefix: Vec<u8>,
    pos: usize,
    stream: TcpStream,
}

impl PrefixedStream {
    fn new(prefix: Vec<u8>, stream: TcpStream) -> Self {
        Self {
            prefix,
            pos: 0,
            stream,
        }
    }
}

impl Read for PrefixedStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pos < self.prefix.len() {
            let remaining = &self.prefix[self.pos..];
            let n = remaining.len().min(buf.len());
            buf[..n].copy_from_slice(&remaining[..n]);
            self.pos += n;
            Ok(n)
        } else {
            self.stream.read(buf)
        }
    }
}

impl Write for PrefixedStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_websocket_upgrade() {
        let req = "GET / HTTP/1.1\r\nHost: x\r\nUpgrade: websocket\r\n\r\n";
        assert!(is_websocket_upgrade(req));
        let req = "GET / HTTP/1.1\r\nHost: x\r\nupgrade:WebSocket\r\n\r\n";
        assert!(is_websocket_upgrade(req));
        let req = "GET / HTTP/1.1\r\nHost: x\r\n\r\n";
        assert!(!is_websocket_upgrade(req));
        // The word in a body or URL must not trigger an upgrade.
        let req = "GET /upgrade-websocket HTTP/1.1\r\nHost: x\r\n\r\n";
        assert!(!is_websocket_upgrade(req));
    }
}
