//! One-shot loopback listener for the OAuth redirect
//!
//! Launchpad redirects the browser to `http://127.0.0.1:<port>/?code=...`.
//! We only look at the request line, take the code and hang up. Nothing is
//! ever written back to the browser.

use std::net::{Ipv4Addr, SocketAddr};

use oauth2::AuthorizationCode;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use super::AuthError;

/// Upper bound on how much of a request line we are willing to buffer.
const MAX_REQUEST_LINE: u64 = 8 * 1024;

const CODE_PREFIX: &str = "GET /?code=";

/// Extract the authorization code from an HTTP request line of the form
/// `GET /?code=<code> HTTP/1.1`. Anything else yields `None`.
pub fn parse_code(request_line: &str) -> Option<String> {
    let rest = request_line.trim_end().strip_prefix(CODE_PREFIX)?;
    let (target, version) = rest.split_once(' ')?;
    if !version.starts_with("HTTP/") {
        return None;
    }

    let code = target.split('&').next().unwrap_or_default();
    if code.is_empty() {
        return None;
    }
    Some(code.to_string())
}

/// A bound redirect listener. Consumed by [`RedirectListener::wait_for_code`],
/// so it can hand out at most one code.
pub struct RedirectListener {
    listener: TcpListener,
    port: u16,
}

impl RedirectListener {
    /// Bind `127.0.0.1:<port>`. Port 0 picks a free port.
    pub async fn bind(port: u16) -> Result<Self, AuthError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AuthError::Listener { port, source })?;
        let port = listener
            .local_addr()
            .map_err(|source| AuthError::Listener { port, source })?
            .port();

        tracing::debug!("Redirect listener bound on 127.0.0.1:{}", port);
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Accept connections until one carries an authorization code.
    ///
    /// Each connection's request line is read on its own task so an idle
    /// pre-connect from the browser can't hold up the real redirect. When a
    /// code arrives the listener and any outstanding connections are dropped.
    pub async fn wait_for_code(self) -> Result<AuthorizationCode, AuthError> {
        let mut pending: JoinSet<Option<String>> = JoinSet::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.map_err(|source| AuthError::Listener {
                        port: self.port,
                        source,
                    })?;
                    tracing::debug!("Redirect connection from {}", peer);
                    pending.spawn(read_code(stream));
                }
                Some(joined) = pending.join_next(), if !pending.is_empty() => {
                    if let Ok(Some(code)) = joined {
                        tracing::info!("Authorization code received");
                        return Ok(AuthorizationCode::new(code));
                    }
                }
            }
        }
    }
}

/// Read the request line off one connection and close it.
async fn read_code(stream: TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream.take(MAX_REQUEST_LINE));
    let mut line = String::new();
    if let Err(e) = reader.read_line(&mut line).await {
        tracing::debug!("Failed to read redirect request: {}", e);
        return None;
    }

    match parse_code(&line) {
        Some(code) => Some(code),
        None => {
            // Favicon fetches and other stray requests are dropped unanswered.
            tracing::debug!("Ignoring redirect request: {:?}", line.trim_end());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn send(port: u16, request: &str) -> TcpStream {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        stream
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(
            parse_code("GET /?code=ABC123 HTTP/1.1\r\n").as_deref(),
            Some("ABC123")
        );
        assert_eq!(
            parse_code("GET /?code=abc&state=xyz HTTP/1.1").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_parse_code_ignores_other_requests() {
        assert_eq!(parse_code("GET /favicon.ico HTTP/1.1\r\n"), None);
        assert_eq!(parse_code("GET /?error=access_denied HTTP/1.1"), None);
        assert_eq!(parse_code("POST /?code=ABC123 HTTP/1.1"), None);
        assert_eq!(parse_code("GET /?code= HTTP/1.1"), None);
        assert_eq!(parse_code("GET /?code=ABC123"), None);
        assert_eq!(parse_code(""), None);
    }

    #[tokio::test]
    async fn test_receives_code() {
        let listener = RedirectListener::bind(0).await.unwrap();
        let port = listener.port();
        let waiter = tokio::spawn(listener.wait_for_code());

        let _client = send(port, "GET /?code=ABC123 HTTP/1.1\r\nHost: x\r\n\r\n").await;
        let code = waiter.await.unwrap().unwrap();
        assert_eq!(code.secret(), "ABC123");
    }

    #[tokio::test]
    async fn test_stray_request_is_closed_without_response() {
        let listener = RedirectListener::bind(0).await.unwrap();
        let port = listener.port();
        let waiter = tokio::spawn(listener.wait_for_code());

        let mut favicon = send(port, "GET /favicon.ico HTTP/1.1\r\n\r\n").await;
        let mut reply = Vec::new();
        // EOF or reset, either way nothing comes back
        let _ = favicon.read_to_end(&mut reply).await;
        assert!(reply.is_empty());
        assert!(!waiter.is_finished());

        let _client = send(port, "GET /?code=XYZ HTTP/1.1\r\n\r\n").await;
        let code = waiter.await.unwrap().unwrap();
        assert_eq!(code.secret(), "XYZ");
    }

    #[tokio::test]
    async fn test_idle_connection_does_not_block_redirect() {
        let listener = RedirectListener::bind(0).await.unwrap();
        let port = listener.port();
        let waiter = tokio::spawn(listener.wait_for_code());

        let _idle = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let _client = send(port, "GET /?code=LATE HTTP/1.1\r\n\r\n").await;
        let code = waiter.await.unwrap().unwrap();
        assert_eq!(code.secret(), "LATE");
    }

    #[tokio::test]
    async fn test_stops_listening_after_code() {
        let listener = RedirectListener::bind(0).await.unwrap();
        let port = listener.port();
        let waiter = tokio::spawn(listener.wait_for_code());

        let _client = send(port, "GET /?code=ONCE HTTP/1.1\r\n\r\n").await;
        waiter.await.unwrap().unwrap();

        assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
    }
}
