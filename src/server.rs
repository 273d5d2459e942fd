//! Listener loop and server lifecycle.
//!
//! The server owns the accept socket, the route registry, and the observer
//! sets. While running, a dedicated coroutine blocks on accept and spawns one
//! transaction per connection; any single connection's failure is reported to
//! error observers and never terminates the loop.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use may::coroutine::{self, JoinHandle};
use may::net::{TcpListener, TcpStream};
use tracing::{error, info};

use crate::error::ServerError;
use crate::listeners::{ErrorListener, TransactionListener};
use crate::registry::{Definition, Registry};
use crate::runtime_config::RuntimeConfig;
use crate::transaction::Transaction;

/// Default cap on parsed query arguments per request.
pub const DEFAULT_MAX_ARGUMENTS: usize = 16;
/// Default cap on parsed headers per request.
pub const DEFAULT_MAX_HEADERS: usize = 32;
/// Default cap on parsed body fields per request.
pub const DEFAULT_MAX_POST: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    Stopped,
    Running,
}

/// Per-run settings snapshotted by `start`. The accept loop and every
/// transaction it spawns keep the snapshot they started with, so setter
/// calls on a running server only apply to subsequent runs.
#[derive(Debug, Clone)]
pub(crate) struct RunConfig {
    pub max_arguments: usize,
    pub max_headers: usize,
    pub max_post: usize,
    pub read_timeout: Duration,
    pub stack_size: usize,
}

/// State shared between the server handle, the accept loop, and transactions:
/// the registry and the observer sets. Unlike the run config, these apply
/// immediately, including to in-flight connections.
pub(crate) struct ServerCore {
    pub registry: Registry,
    transaction_listeners: RwLock<Vec<Arc<dyn TransactionListener>>>,
    error_listeners: RwLock<Vec<Arc<dyn ErrorListener>>>,
}

impl ServerCore {
    fn new() -> Self {
        ServerCore {
            registry: Registry::new(),
            transaction_listeners: RwLock::new(Vec::new()),
            error_listeners: RwLock::new(Vec::new()),
        }
    }

    /// Notify transaction observers from a snapshot of the set, so add and
    /// remove can race with an in-flight notification.
    pub fn notify_transaction(&self, transaction: &Transaction) {
        let snapshot: Vec<_> = self.transaction_listeners.read().unwrap().clone();
        for listener in snapshot {
            listener.transaction_created(transaction);
        }
    }

    /// Notify error observers from a snapshot of the set.
    pub fn notify_error(&self, error: &ServerError) {
        let snapshot: Vec<_> = self.error_listeners.read().unwrap().clone();
        for listener in snapshot {
            listener.error(error);
        }
    }
}

/// An embeddable HTTP server: link paths to definitions, start, and the
/// accept loop serves one request per connection until stopped.
pub struct Server {
    port: u16,
    max_arguments: usize,
    max_headers: usize,
    max_post: usize,
    core: Arc<ServerCore>,
    state: ServerState,
    accept_handle: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl Server {
    /// Create a stopped server that will bind the given port on `start`.
    /// Port `0` binds an ephemeral port, readable from `local_addr` once
    /// running.
    #[must_use]
    pub fn new(port: u16) -> Self {
        Server {
            port,
            max_arguments: DEFAULT_MAX_ARGUMENTS,
            max_headers: DEFAULT_MAX_HEADERS,
            max_post: DEFAULT_MAX_POST,
            core: Arc::new(ServerCore::new()),
            state: ServerState::Stopped,
            accept_handle: None,
            local_addr: None,
        }
    }

    /// Bind the listening socket and start the accept loop on its own
    /// coroutine. Fails with [`ServerError::AlreadyRunning`] if running.
    pub fn start(&mut self) -> Result<(), ServerError> {
        if self.state == ServerState::Running {
            return Err(ServerError::AlreadyRunning);
        }

        let runtime = RuntimeConfig::from_env();
        let config = Arc::new(RunConfig {
            max_arguments: self.max_arguments,
            max_headers: self.max_headers,
            max_post: self.max_post,
            read_timeout: runtime.read_timeout,
            stack_size: runtime.stack_size,
        });

        let listener = TcpListener::bind(("0.0.0.0", self.port))?;
        let local_addr = listener.local_addr()?;
        let core = Arc::clone(&self.core);

        // SAFETY: coroutine::Builder::spawn is unsafe because stack sizing is
        // the caller's responsibility; the accept loop holds the listener and
        // a handful of Arcs, well within the configured stack size.
        let handle = unsafe {
            coroutine::Builder::new()
                .name("listener".to_string())
                .stack_size(config.stack_size)
                .spawn(move || accept_loop(&listener, &core, &config))
        }?;

        self.accept_handle = Some(handle);
        self.local_addr = Some(local_addr);
        self.state = ServerState::Running;
        info!(addr = %local_addr, "Server started");
        Ok(())
    }

    /// Stop accepting connections: cancel the accept coroutine (unblocking
    /// the pending accept) and join it. In-flight transactions are not
    /// cancelled; they complete or hit the read timeout on their own. Fails
    /// with [`ServerError::NotRunning`] if stopped.
    pub fn stop(&mut self) -> Result<(), ServerError> {
        if self.state != ServerState::Running {
            return Err(ServerError::NotRunning);
        }
        if let Some(handle) = self.accept_handle.take() {
            // SAFETY: cancelling the accept coroutine is the shutdown path;
            // it unwinds the blocked accept and drops the listener with the
            // coroutine's stack.
            unsafe {
                handle.coroutine().cancel();
            }
            let _ = handle.join();
        }
        self.state = ServerState::Stopped;
        self.local_addr = None;
        info!("Server stopped");
        Ok(())
    }

    /// Whether the accept loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == ServerState::Running
    }

    /// The bound address while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Wait for the server to accept connections.
    ///
    /// Polls the bound address by attempting TCP connections until one
    /// succeeds. Useful in tests to ensure the accept loop is up before
    /// sending requests.
    pub fn wait_ready(&self) -> io::Result<()> {
        let addr = self.local_addr.ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "server not started")
        })?;
        for _ in 0..50 {
            if std::net::TcpStream::connect(addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Link a resource path to a definition; replaces any existing link.
    /// Effective immediately, including for in-flight connections.
    pub fn link(&self, path: impl Into<String>, definition: Definition) {
        self.core.registry.link(path, definition);
    }

    /// Remove the link for a resource path.
    pub fn unlink(&self, path: &str) {
        self.core.registry.unlink(path);
    }

    /// Whether a definition is linked for this path.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.core.registry.contains(path)
    }

    /// The definition linked for this path, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Arc<Definition>> {
        self.core.registry.get(path)
    }

    pub fn add_transaction_listener(&self, listener: Arc<dyn TransactionListener>) {
        self.core.transaction_listeners.write().unwrap().push(listener);
    }

    pub fn remove_transaction_listener(&self, listener: &Arc<dyn TransactionListener>) {
        self.core
            .transaction_listeners
            .write()
            .unwrap()
            .retain(|registered| !Arc::ptr_eq(registered, listener));
    }

    pub fn add_error_listener(&self, listener: Arc<dyn ErrorListener>) {
        self.core.error_listeners.write().unwrap().push(listener);
    }

    pub fn remove_error_listener(&self, listener: &Arc<dyn ErrorListener>) {
        self.core
            .error_listeners
            .write()
            .unwrap()
            .retain(|registered| !Arc::ptr_eq(registered, listener));
    }

    /// Set the port for the next run. No effect on a running accept loop.
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Cap on query arguments per request, applied from the next run.
    pub fn set_max_arguments(&mut self, max: usize) {
        self.max_arguments = max;
    }

    #[must_use]
    pub fn max_arguments(&self) -> usize {
        self.max_arguments
    }

    /// Cap on headers per request, applied from the next run.
    pub fn set_max_headers(&mut self, max: usize) {
        self.max_headers = max;
    }

    #[must_use]
    pub fn max_headers(&self) -> usize {
        self.max_headers
    }

    /// Cap on body fields per request, applied from the next run.
    pub fn set_max_post(&mut self, max: usize) {
        self.max_post = max;
    }

    #[must_use]
    pub fn max_post(&self) -> usize {
        self.max_post
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.state == ServerState::Running {
            let _ = self.stop();
        }
    }
}

/// Accept connections until the coroutine is cancelled by `stop`. A failed
/// accept or transaction start is reported and the loop keeps serving.
fn accept_loop(listener: &TcpListener, core: &Arc<ServerCore>, config: &Arc<RunConfig>) {
    loop {
        match listener.accept() {
            Ok((stream, _peer)) => {
                if let Err(err) = start_transaction(stream, core, config) {
                    core.notify_error(&err);
                }
            }
            Err(err) => {
                error!(error = %err, "Accept failed");
                core.notify_error(&ServerError::Io(err));
            }
        }
    }
}

fn start_transaction(
    stream: TcpStream,
    core: &Arc<ServerCore>,
    config: &Arc<RunConfig>,
) -> Result<(), ServerError> {
    let transaction = Arc::new(Transaction::new(
        Arc::clone(core),
        Arc::clone(config),
        stream,
    )?);
    transaction.start()?;
    core.notify_transaction(&transaction);
    Ok(())
}
