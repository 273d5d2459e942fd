//! Error taxonomy for the server, its transactions, and error observers.

use std::error::Error;
use std::fmt;
use std::io;

/// Errors raised by lifecycle misuse, transport failures, and handlers.
///
/// Policy rejections (missing route, wrong method, oversized request, version
/// mismatch) and malformed request lines are *not* errors: they are ordinary
/// dispatch branches that produce a reply. Everything that reaches a
/// registered [`ErrorListener`](crate::listeners::ErrorListener) is one of
/// these variants.
#[derive(Debug)]
pub enum ServerError {
    /// `start` was called on a server that is already running.
    AlreadyRunning,
    /// `stop` was called on a server that is not running.
    NotRunning,
    /// `start` was called on a transaction that has already started.
    TransactionInProgress,
    /// `stop` was called on a transaction that has already finished.
    TransactionFinished,
    /// Transport failure on accept, read, flush, or close.
    Io(io::Error),
    /// Failure raised by a registered handler; answered with 500.
    Handler(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::AlreadyRunning => write!(f, "server already started"),
            ServerError::NotRunning => write!(f, "server already stopped"),
            ServerError::TransactionInProgress => write!(f, "transaction already in progress"),
            ServerError::TransactionFinished => write!(f, "transaction not in progress"),
            ServerError::Io(err) => write!(f, "transport failure: {}", err),
            ServerError::Handler(err) => write!(f, "handler failure: {}", err),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ServerError::Io(err) => Some(err),
            ServerError::Handler(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ServerError {
    fn from(err: io::Error) -> Self {
        ServerError::Io(err)
    }
}
