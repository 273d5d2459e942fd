//! # Restling
//!
//! A minimal embeddable HTTP server: a long-running process links resource
//! paths to handler definitions, and the server answers one request per
//! accepted connection, then closes it.
//!
//! ## Architecture
//!
//! - **[`registry`]** - resource path → definition map, shared by every
//!   in-flight connection
//! - **[`codec`]** - stateless request parsing and reply framing
//! - **[`transaction`]** - per-connection state machine driving
//!   parse → dispatch → respond on its own coroutine
//! - **[`server`]** - accept loop, lifecycle, and the registration surface
//! - **[`listeners`]** - transaction and error observer interfaces
//! - **[`protocol`]** - content types, the reply catalog, and identity constants
//!
//! Built on the `may` coroutine runtime: one coroutine for the accept loop
//! and one per accepted connection, all blocking-style. Handlers run on the
//! connection's coroutine and should avoid operations that block outside the
//! runtime.
//!
//! ## Quick Start
//!
//! ```no_run
//! use http::Method;
//! use restling::registry::Fields;
//! use restling::{ContentType, Definition, HandlerResult, Server};
//!
//! fn hello(_arguments: &Fields, _headers: &Fields, _fields: &Fields) -> HandlerResult {
//!     Ok("hello".to_string())
//! }
//!
//! let mut server = Server::new(8080);
//! server.link("/hello", Definition::new(Method::GET, ContentType::TEXT_PLAIN, hello));
//! server.start().expect("start server");
//! ```
//!
//! Requests outside the linked surface get catalog replies: 404 for unknown
//! paths, 405 for a method mismatch, 413 past the configured size limits,
//! 505 for a foreign protocol version, and 400 for an unparseable request
//! line. Handler failures are answered with 500 and forwarded to registered
//! error listeners.

pub mod codec;
pub mod error;
pub mod listeners;
pub mod protocol;
pub mod registry;
pub mod runtime_config;
pub mod server;
pub mod transaction;

pub use error::ServerError;
pub use listeners::{ErrorListener, TransactionListener};
pub use protocol::{ContentType, Reply, HTTP_VERSION, SERVER_NAME};
pub use registry::{Definition, Handler, HandlerResult, Registry};
pub use server::Server;
pub use transaction::{Transaction, TransactionState};
