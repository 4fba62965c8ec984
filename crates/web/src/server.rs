use crate::encoding::{encode_into, negotiate_request};
use crate::handler::RequestHandler;
use crate::logging::{self, LogLevel};
use crate::router::{RouteLookup, RouteParams, Router};
use crate::static_files::StaticFileResolver;
use crate::RequestContext;
use memchr::memmem;
use quill_http::buf::BufferPool;
use quill_http::codec::{LineEnding, ResponseBuilder};
use quill_http::connection::{ConnectionOptions, HttpConnection};
use quill_http::handler::{Handler, HandlerError};
use quill_http::protocol::{CompressionMethod, Method, Request, StatusCode};
use std::any::Any;
use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("router must be set")]
    MissingRouter,
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: String },
    #[error("invalid option `{option}`: {reason}")]
    InvalidOption { option: &'static str, reason: &'static str },
}

pub struct ServerBuilder {
    router: Option<Router>,
    address: Option<io::Result<Vec<SocketAddr>>>,
    connection: ConnectionOptions,
    supported_compression: CompressionMethod,
    wildcard_encoding: CompressionMethod,
    max_connections: usize,
    log_level: LogLevel,
    static_files: Option<Box<dyn StaticFileResolver>>,
    fallback_handler: Option<Box<dyn RequestHandler>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            router: None,
            address: None,
            connection: ConnectionOptions::default(),
            supported_compression: CompressionMethod::ALL,
            wildcard_encoding: CompressionMethod::GZIP,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_level: LogLevel::default(),
            static_files: None,
            fallback_handler: None,
        }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// The codecs responses may be compressed with. Defaults to all of them.
    pub fn supported_compression(mut self, supported: CompressionMethod) -> Self {
        self.supported_compression = supported;
        self
    }

    /// The codec chosen for `Accept-Encoding: *`. Defaults to gzip;
    /// [`CompressionMethod::NONE`] ignores the wildcard. Anything else must be
    /// exactly one codec.
    pub fn wildcard_encoding(mut self, wildcard: CompressionMethod) -> Self {
        self.wildcard_encoding = wildcard;
        self
    }

    pub fn receive_buffer_size(mut self, size: usize) -> Self {
        self.connection.receive_buffer_size = size;
        self
    }

    pub fn response_capacity(mut self, capacity: usize) -> Self {
        self.connection.response_capacity = capacity;
        self
    }

    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.connection.receive_timeout = timeout;
        self
    }

    pub fn trailing_read_timeout(mut self, timeout: Duration) -> Self {
        self.connection.trailing_read_timeout = timeout;
        self
    }

    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.connection.parser = self.connection.parser.with_line_ending(line_ending);
        self
    }

    pub fn max_headers(mut self, max_headers: usize) -> Self {
        self.connection.parser = self.connection.parser.with_max_headers(max_headers);
        self
    }

    /// Upper bound on connections served at the same time.
    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// The subscriber level installed by [`Server::start`].
    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Serves files for `GET` and `HEAD` requests no route matches.
    pub fn static_files(mut self, resolver: impl StaticFileResolver + 'static) -> Self {
        self.static_files = Some(Box::new(resolver));
        self
    }

    /// Answers requests that neither a route nor a static file matches.
    pub fn fallback_handler(mut self, handler: impl RequestHandler + 'static) -> Self {
        self.fallback_handler = Some(Box::new(handler));
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let router = self.router.ok_or(ServerBuildError::MissingRouter)?;
        let address = self
            .address
            .ok_or(ServerBuildError::MissingAddress)?
            .map_err(|e| ServerBuildError::InvalidAddress { reason: e.to_string() })?;
        if address.is_empty() {
            return Err(ServerBuildError::InvalidAddress { reason: "resolved to no socket address".to_owned() });
        }

        let connection = self.connection;
        let positive = [
            ("receive_buffer_size", connection.receive_buffer_size),
            ("response_capacity", connection.response_capacity),
            ("max_headers", connection.parser.max_headers()),
            ("max_connections", self.max_connections),
        ];
        if let Some((option, _)) = positive.into_iter().find(|(_, value)| *value == 0) {
            return Err(ServerBuildError::InvalidOption { option, reason: "must be greater than zero" });
        }
        if connection.receive_timeout.is_zero() {
            return Err(ServerBuildError::InvalidOption { option: "receive_timeout", reason: "must not be zero" });
        }
        if !self.wildcard_encoding.is_none() && !self.wildcard_encoding.is_single() {
            return Err(ServerBuildError::InvalidOption { option: "wildcard_encoding", reason: "must be a single codec or none" });
        }
        if self.max_connections > Semaphore::MAX_PERMITS {
            return Err(ServerBuildError::InvalidOption { option: "max_connections", reason: "exceeds the semaphore limit" });
        }

        Ok(Server {
            router,
            address,
            connection,
            supported_compression: self.supported_compression,
            wildcard_encoding: self.wildcard_encoding,
            max_connections: self.max_connections,
            log_level: self.log_level,
            static_files: self.static_files,
            fallback_handler: self.fallback_handler,
        })
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("router", &self.router)
            .field("address", &self.address)
            .field("connection", &self.connection)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

/// An HTTP server dispatching requests to a [`Router`].
///
/// Every accepted connection serves exactly one request. `Server` is also a
/// [`Handler`], so it can be driven by any [`HttpConnection`].
pub struct Server {
    router: Router,
    address: Vec<SocketAddr>,
    connection: ConnectionOptions,
    supported_compression: CompressionMethod,
    wildcard_encoding: CompressionMethod,
    max_connections: usize,
    log_level: LogLevel,
    static_files: Option<Box<dyn StaticFileResolver>>,
    fallback_handler: Option<Box<dyn RequestHandler>>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The live route table; routes may be added or removed while serving.
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    /// Installs logging, binds the configured address and serves until Ctrl-C.
    pub async fn start(self) -> io::Result<()> {
        logging::init(self.log_level);

        info!(address = ?self.address, "start listening");
        let listener = TcpListener::bind(self.address.as_slice())
            .await
            .inspect_err(|e| error!(cause = %e, "bind server error"))?;

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("received ctrl-c, shutting down");
                    trigger.cancel();
                }
                Err(e) => error!(cause = %e, "failed to listen for ctrl-c"),
            }
        });

        Arc::new(self).serve(listener, shutdown).await
    }

    /// Accepts connections from `listener` until `shutdown` is cancelled.
    ///
    /// Connections already accepted are served to completion.
    pub async fn serve(self: Arc<Self>, listener: TcpListener, shutdown: CancellationToken) -> io::Result<()> {
        let limiter = Arc::new(Semaphore::new(self.max_connections));
        let pool = BufferPool::shared();
        info!(local_addr = %listener.local_addr()?, max_connections = self.max_connections, "accepting connections");

        loop {
            let permit = tokio::select! {
                () = shutdown.cancelled() => break,
                permit = Arc::clone(&limiter).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!(cause = %e, "connection limiter closed");
                        break;
                    }
                },
            };

            let (tcp_stream, remote_addr) = tokio::select! {
                () = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                },
            };

            let server = Arc::clone(&self);
            let connection = HttpConnection::new(tcp_stream, Arc::clone(&pool), self.connection.clone());
            tokio::spawn(async move {
                let _permit = permit;
                match connection.process(server.as_ref()).await {
                    Ok(()) => debug!(%remote_addr, "finished process, connection shutdown"),
                    Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
                }
            });
        }

        info!("stopped accepting connections");
        Ok(())
    }

    /// Runs a route handler, turning an error or a panic into a `500`.
    fn invoke(&self, handler: &dyn RequestHandler, params: RouteParams<'_, '_>, request: &mut Request<'_>, response: &mut ResponseBuilder) {
        let outcome = {
            let context = RequestContext::new(request, params);
            panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(&context, response)))
        };

        let reason = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        error!(cause = %reason, path = %String::from_utf8_lossy(request.path()), "request handler failed");

        response.clear();
        request.set_compression(CompressionMethod::NONE);
        response.append_headers(request, StatusCode::INTERNAL_SERVER_ERROR, None, 0);
    }

    fn not_found(&self, request: &mut Request<'_>, response: &mut ResponseBuilder) {
        let readable = matches!(request.method(), Method::Get | Method::Head);
        let file = self.static_files.as_ref().filter(|_| readable).and_then(|resolver| resolver.resolve(request.path()));
        if let Some(file) = file {
            response.append_response(request, StatusCode::OK, Some(file.mime.as_ref().as_bytes()), &file.content);
            return;
        }

        match &self.fallback_handler {
            Some(handler) => self.invoke(handler.as_ref(), RouteParams::empty(), request, response),
            None => response.append_headers(request, StatusCode::NOT_FOUND, None, 0),
        }
    }

    /// Compresses the content region in place when the headers announced a
    /// `Content-Encoding`.
    fn compress(response: &mut ResponseBuilder) -> io::Result<()> {
        let method = response.content_encoding();
        let Some(start) = response.content_start() else {
            return Ok(());
        };
        if method.is_none() {
            return Ok(());
        }

        let scratch = ResponseBuilder::with_capacity(response.content().len() / 2 + 64);
        let encoded = encode_into(method, response.content(), scratch)?;
        debug!(?method, from = response.content().len(), to = encoded.len(), "response compressed");

        response.truncate(start);
        response.append(encoded.as_bytes());
        Ok(())
    }
}

impl Handler for Server {
    fn call(&self, request: &mut Request<'_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
        let compression = negotiate_request(request, self.supported_compression, self.wildcard_encoding);
        request.set_compression(compression);

        let table = self.router.table();
        match table.lookup(request.method(), request.path()) {
            RouteLookup::Found(entry) => {
                let params = RouteParams::new(entry.pattern().as_bytes(), request.path());
                self.invoke(entry.handler(), params, request, response);
            }
            RouteLookup::MethodNotAllowed => response.append_headers(request, StatusCode::METHOD_NOT_ALLOWED, None, 0),
            RouteLookup::NotFound => self.not_found(request, response),
        }

        Self::compress(response)?;

        if request.method() == Method::Head {
            let header_end = response
                .content_start()
                .or_else(|| memmem::find(response.as_bytes(), b"\r\n\r\n").map(|idx| idx + 4));
            if let Some(end) = header_end {
                response.truncate(end);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("router", &self.router)
            .field("address", &self.address)
            .field("supported_compression", &self.supported_compression)
            .field("wildcard_encoding", &self.wildcard_encoding)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_owned()
    }
}
