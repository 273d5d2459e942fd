//! Per-connection transaction engine.
//!
//! A transaction owns one accepted connection for exactly one request: it
//! parses the request off the stream, applies the routing policy, invokes the
//! matched handler, frames the reply, and closes the connection. Each
//! transaction runs on its own coroutine; failures are reported to the
//! server's error observers and never escape to the accept loop.

use std::io::{BufReader, BufWriter, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use may::coroutine;
use may::net::TcpStream;
use tracing::{debug, error, warn};

use crate::codec::{self, ParseOutcome, ParsedRequest};
use crate::error::ServerError;
use crate::protocol::{ContentType, Reply, HTTP_VERSION};
use crate::server::{RunConfig, ServerCore};

/// Lifecycle of a transaction.
///
/// `Errored` absorbs any failure during processing; the connection is still
/// closed (`Closed`) afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Constructed, not yet started.
    Created,
    /// Coroutine spawned; parsing, dispatching, or responding.
    Started,
    /// Processing failed; the failure was reported to error observers.
    Errored,
    /// Streams flushed and closed. Terminal.
    Closed,
}

/// One accepted connection being driven through parse → dispatch → respond.
pub struct Transaction {
    core: Arc<ServerCore>,
    config: Arc<RunConfig>,
    peer: SocketAddr,
    state: Mutex<TransactionState>,
    stream: Mutex<Option<TcpStream>>,
    reader: Mutex<Option<BufReader<TcpStream>>>,
    writer: Mutex<Option<BufWriter<TcpStream>>>,
}

impl Transaction {
    pub(crate) fn new(
        core: Arc<ServerCore>,
        config: Arc<RunConfig>,
        stream: TcpStream,
    ) -> std::io::Result<Self> {
        let peer = stream.peer_addr()?;
        Ok(Transaction {
            core,
            config,
            peer,
            state: Mutex::new(TransactionState::Created),
            stream: Mutex::new(Some(stream)),
            reader: Mutex::new(None),
            writer: Mutex::new(None),
        })
    }

    /// Start processing the request on a dedicated coroutine.
    ///
    /// Applies the configured read timeout, wraps the connection in a
    /// buffered reader, and spawns the transaction coroutine. The stream
    /// becomes the buffered writer once parsing is done, since the two
    /// phases never overlap. Starting a transaction twice is a lifecycle
    /// error, not retried.
    pub fn start(self: &Arc<Self>) -> Result<(), ServerError> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != TransactionState::Created {
                return Err(ServerError::TransactionInProgress);
            }
            let Some(stream) = self.stream.lock().unwrap().take() else {
                return Err(ServerError::TransactionInProgress);
            };
            stream.set_read_timeout(Some(self.config.read_timeout))?;
            *self.reader.lock().unwrap() = Some(BufReader::new(stream));
            *state = TransactionState::Started;
        }

        let this = Arc::clone(self);
        // SAFETY: coroutine::Builder::spawn is unsafe because stack sizing is
        // the caller's responsibility; the transaction body holds a bounded
        // set of buffers and Arcs within the configured stack size.
        let spawned = unsafe {
            coroutine::Builder::new()
                .name("transaction".to_string())
                .stack_size(self.config.stack_size)
                .spawn(move || this.run())
        };
        // The coroutine detaches; the transaction closes its own connection.
        let _ = spawned?;
        Ok(())
    }

    /// Close the connection, flushing buffered reply bytes to the peer
    /// before the stream drops. Stopping an already-stopped transaction is a
    /// lifecycle error.
    pub fn stop(&self) -> Result<(), ServerError> {
        {
            let mut state = self.state.lock().unwrap();
            match *state {
                TransactionState::Started | TransactionState::Errored => {
                    *state = TransactionState::Closed;
                }
                TransactionState::Created | TransactionState::Closed => {
                    return Err(ServerError::TransactionFinished);
                }
            }
        }
        if let Some(mut writer) = self.writer.lock().unwrap().take() {
            writer.flush()?;
        }
        self.reader.lock().unwrap().take();
        Ok(())
    }

    /// Address of the connected peer.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        *self.state.lock().unwrap()
    }

    /// Coroutine body: process the request, then close the connection.
    /// Failures on either step go to the error observers.
    fn run(&self) {
        if let Err(err) = self.process() {
            *self.state.lock().unwrap() = TransactionState::Errored;
            self.core.notify_error(&err);
        }
        if let Err(err) = self.stop() {
            self.core.notify_error(&err);
        }
    }

    /// Parse strictly before dispatch strictly before respond.
    fn process(&self) -> Result<(), ServerError> {
        let mut reader = self
            .reader
            .lock()
            .unwrap()
            .take()
            .ok_or(ServerError::TransactionFinished)?;
        let outcome = codec::read_request(&mut reader)?;

        let (reply, content_type, body) = match outcome {
            ParseOutcome::Malformed => {
                warn!(peer = %self.peer, "Malformed request line");
                reject(Reply::BAD_REQUEST)
            }
            ParseOutcome::Complete(request) => self.dispatch(&request),
        };

        // Reading is over; the stream turns into the buffered write side.
        let mut writer = BufWriter::new(reader.into_inner());
        codec::write_reply(&mut writer, &reply, &content_type, &body)?;
        *self.writer.lock().unwrap() = Some(writer);
        Ok(())
    }

    /// Routing policy, first match wins: size limits, protocol version,
    /// route existence, method match, then the handler itself.
    fn dispatch(&self, request: &ParsedRequest) -> (Reply, ContentType, String) {
        let config = &self.config;
        if request.arguments.len() > config.max_arguments
            || request.headers.len() > config.max_headers
            || request.fields.len() > config.max_post
        {
            warn!(peer = %self.peer, resource = %request.resource, "Request exceeds configured limits");
            return reject(Reply::REQUEST_TOO_LARGE);
        }
        if request.version != HTTP_VERSION {
            return reject(Reply::VERSION_NOT_SUPPORTED);
        }
        let Some(definition) = self.core.registry.get(&request.resource) else {
            return reject(Reply::NOT_FOUND);
        };
        if definition.method().as_str() != request.method {
            return reject(Reply::METHOD_NOT_ALLOWED);
        }

        let arguments = request.argument_map();
        match definition.invoke(&arguments, &request.headers, &request.fields) {
            Ok(body) => {
                debug!(
                    peer = %self.peer,
                    method = %request.method,
                    resource = %request.resource,
                    "Request handled"
                );
                (Reply::OK, definition.content_type().clone(), body)
            }
            Err(err) => {
                error!(
                    peer = %self.peer,
                    resource = %request.resource,
                    error = %err,
                    "Handler failed"
                );
                self.core.notify_error(&ServerError::Handler(err));
                reject(Reply::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

/// A policy rejection: the reply plus its generated `text/html` document.
fn reject(reply: Reply) -> (Reply, ContentType, String) {
    let body = codec::error_document(&reply);
    (reply, ContentType::TEXT_HTML, body)
}
