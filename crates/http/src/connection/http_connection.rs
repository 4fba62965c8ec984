use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::buf::BufferPool;
use crate::codec::body::chunked;
use crate::codec::{DEFAULT_RESPONSE_CAPACITY, RequestParser, ResponseBuilder};
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError, Request, SendError};

/// Default size of the pooled receive buffer.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 8 * 1024;

const BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
const INTERNAL_SERVER_ERROR: &[u8] = b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

/// Per-connection limits and timeouts.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub receive_buffer_size: usize,
    pub response_capacity: usize,
    /// How long to wait for the first bytes of the request.
    pub receive_timeout: Duration,
    /// How long each follow-up read waits for delayed segments of the same request.
    pub trailing_read_timeout: Duration,
    pub parser: RequestParser,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            response_capacity: DEFAULT_RESPONSE_CAPACITY,
            receive_timeout: Duration::from_secs(30),
            trailing_read_timeout: Duration::from_millis(100),
            parser: RequestParser::new(),
        }
    }
}

/// Serves exactly one request on a stream.
///
/// The lifecycle is strictly sequential:
/// - receive the request into a pooled buffer, with short follow-up reads while
///   the message is visibly incomplete
/// - parse it, answering `400 Bad Request` when it is malformed
/// - hand it to the [`Handler`], answering `500` when the handler fails
/// - write the response and shut the write half down
///
/// There is no keep-alive: the caller drops the stream afterwards.
pub struct HttpConnection<S> {
    stream: S,
    pool: Arc<BufferPool>,
    options: ConnectionOptions,
}

impl<S> fmt::Debug for HttpConnection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection").field("options", &self.options).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageState {
    Complete,
    Incomplete { expects_continue: bool },
}

impl<S> HttpConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, pool: Arc<BufferPool>, options: ConnectionOptions) -> Self {
        Self { stream, pool, options }
    }

    pub async fn process<H>(mut self, handler: &H) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        let mut buf = self.pool.rent(self.options.receive_buffer_size);
        let received = self.receive(&mut buf).await?;
        if received == 0 {
            info!("connection closed before a request was received");
            return Ok(());
        }

        let result = self.respond(&buf[..received], handler).await;

        if let Err(e) = self.stream.shutdown().await {
            debug!(cause = %e, "failed to shut down the connection");
        }
        result
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, ParseError> {
        let mut received = match timeout(self.options.receive_timeout, self.stream.read(buf)).await {
            Ok(read) => read.map_err(ParseError::io)?,
            Err(_) => return Err(ParseError::io(io::Error::from(io::ErrorKind::TimedOut))),
        };
        if received == 0 {
            return Ok(0);
        }

        let mut continue_sent = false;
        loop {
            match self.message_state(&buf[..received]) {
                MessageState::Complete => return Ok(received),
                MessageState::Incomplete { expects_continue } if expects_continue && !continue_sent => {
                    self.stream.write_all(CONTINUE).await.map_err(ParseError::io)?;
                    self.stream.flush().await.map_err(ParseError::io)?;
                    continue_sent = true;
                    info!("receive expect request header, sent continue response");
                }
                MessageState::Incomplete { .. } => {}
            }

            if received == buf.len() {
                warn!(received, "receive buffer is full, the request may be truncated");
                return Ok(received);
            }

            match timeout(self.options.trailing_read_timeout, self.stream.read(&mut buf[received..])).await {
                Ok(Ok(0)) => return Ok(received),
                Ok(Ok(read)) => received += read,
                Ok(Err(e)) => return Err(ParseError::io(e)),
                Err(_) => {
                    warn!(received, "timed out waiting for the rest of the request");
                    return Ok(received);
                }
            }
        }
    }

    /// Decides whether more bytes of the same request are still expected.
    fn message_state(&self, buf: &[u8]) -> MessageState {
        let parser = &self.options.parser;
        if parser.body_offset(buf).is_none() {
            return MessageState::Incomplete { expects_continue: false };
        }

        // a malformed head is answered as it is
        let Ok(request) = parser.parse(buf) else {
            return MessageState::Complete;
        };
        if !request.method().has_body() {
            return MessageState::Complete;
        }

        let body = request.body();
        let complete = if chunked::has_chunked_body(&request) {
            chunked::decoded_len(body).is_ok()
        } else {
            request.content_length().is_none_or(|length| body.len() >= length)
        };

        if complete {
            MessageState::Complete
        } else {
            MessageState::Incomplete { expects_continue: body.is_empty() && expects_continue(&request) }
        }
    }

    async fn respond<H>(&mut self, bytes: &[u8], handler: &H) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        let mut request = match self.options.parser.parse(bytes) {
            Ok(request) => request,
            Err(e) => {
                warn!(cause = %e, "received malformed request");
                self.send(BAD_REQUEST).await?;
                return Err(e.into());
            }
        };

        let mut response = ResponseBuilder::with_pool(&self.pool, self.options.response_capacity);
        if let Err(e) = handler.call(&mut request, &mut response) {
            error!(cause = %e, path = %String::from_utf8_lossy(request.path()), "handler failed");
            self.send(INTERNAL_SERVER_ERROR).await?;
            return Err(HttpError::handler(e));
        }

        self.send(response.as_bytes()).await?;
        debug!(method = %request.method(), bytes = response.len(), "response sent");
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        self.stream.write_all(bytes).await.map_err(SendError::io)?;
        self.stream.flush().await.map_err(SendError::io)
    }
}

fn expects_continue(request: &Request<'_>) -> bool {
    request.header(b"Expect").is_some_and(|value| value.eq_ignore_ascii_case(b"100-continue"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LineEnding;
    use crate::handler::{HandlerError, make_handler};
    use crate::protocol::StatusCode;
    use indoc::indoc;
    use tokio::io::{DuplexStream, duplex};

    fn echo_path(request: &mut Request<'_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
        let body = [request.path(), b":".as_slice(), request.body()].concat();
        response.append_response(request, StatusCode::OK, Some(b"text/plain".as_slice()), &body);
        Ok(())
    }

    async fn round_trip(options: ConnectionOptions, parts: &[&str]) -> (String, Result<(), HttpError>) {
        let (mut client, server): (DuplexStream, DuplexStream) = duplex(64 * 1024);
        let connection = HttpConnection::new(server, Arc::new(BufferPool::new()), options);
        let handler = make_handler(echo_path);

        let serve = tokio::spawn(async move { connection.process(&handler).await });

        for part in parts {
            client.write_all(part.as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        (String::from_utf8(response).unwrap(), serve.await.unwrap())
    }

    #[tokio::test]
    async fn test_simple_get() {
        let (response, result) = round_trip(ConnectionOptions::default(), &["GET /hello HTTP/1.1\r\nHost: a\r\n\r\n"]).await;

        result.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("\r\n\r\n/hello:"));
    }

    #[tokio::test]
    async fn test_body_split_across_segments() {
        let (response, result) = round_trip(
            ConnectionOptions::default(),
            &["POST /items HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello", " world"],
        )
        .await;

        result.unwrap();
        assert!(response.ends_with("/items:hello world"));
    }

    #[tokio::test]
    async fn test_chunked_body_waits_for_terminal_chunk() {
        let (response, result) = round_trip(
            ConnectionOptions::default(),
            &["POST /c HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n", "0\r\n\r\n"],
        )
        .await;

        result.unwrap();
        assert!(response.ends_with("/c:4\r\nWiki\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_expect_continue() {
        let (response, result) = round_trip(
            ConnectionOptions::default(),
            &["PUT /up HTTP/1.1\r\nExpect: 100-continue\r\nContent-Length: 2\r\n\r\n", "ok"],
        )
        .await;

        result.unwrap();
        assert!(response.starts_with("HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("/up:ok"));
    }

    #[tokio::test]
    async fn test_malformed_request() {
        let (response, result) = round_trip(ConnectionOptions::default(), &["GARBAGE\r\n\r\n"]).await;

        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(matches!(result, Err(HttpError::RequestError { .. })));
    }

    #[tokio::test]
    async fn test_handler_error() {
        let (mut client, server) = duplex(4096);
        let connection = HttpConnection::new(server, Arc::new(BufferPool::new()), ConnectionOptions::default());
        let handler = make_handler(|_request, _response| Err("boom".into()));

        client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
        let result = connection.process(&handler).await;

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert!(response.starts_with(b"HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(matches!(result, Err(HttpError::HandlerError { .. })));
    }

    #[tokio::test]
    async fn test_lf_only_client() {
        let options = ConnectionOptions { parser: RequestParser::new().with_line_ending(LineEnding::Lf), ..ConnectionOptions::default() };
        let request = indoc! {r##"
        GET /lf HTTP/1.1
        Host: a

        "##};

        let (response, result) = round_trip(options, &[request]).await;

        result.unwrap();
        assert!(response.ends_with("/lf:"));
    }

    #[tokio::test]
    async fn test_client_closes_without_request() {
        let (client, server) = duplex(1024);
        drop(client);

        let connection = HttpConnection::new(server, Arc::new(BufferPool::new()), ConnectionOptions::default());
        let handler = make_handler(echo_path);
        connection.process(&handler).await.unwrap();
    }
}
