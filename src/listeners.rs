//! Observer interfaces notified by the accept loop and by transactions.
//!
//! Callbacks run synchronously on the coroutine that raised the event: the
//! accept loop for new transactions and accept failures, a transaction's own
//! coroutine for its failures. A slow listener therefore stalls that
//! coroutine - a caller obligation, not something the server guards against.

use crate::error::ServerError;
use crate::transaction::Transaction;

/// Notified whenever the accept loop creates and starts a transaction.
pub trait TransactionListener: Send + Sync {
    fn transaction_created(&self, transaction: &Transaction);
}

/// Notified whenever the server or one of its transactions fails.
pub trait ErrorListener: Send + Sync {
    fn error(&self, error: &ServerError);
}
