//! Route registry: resource paths linked to handler definitions.
//!
//! The registry is the only shared mutable structure between the embedding
//! process and in-flight transactions. Linking and unlinking are atomic with
//! respect to concurrent lookups; a transaction either sees the old
//! definition or the new one, never a partial state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use http::Method;
use tracing::{info, warn};

use crate::protocol::ContentType;

/// Argument, header, and body-field maps as handlers receive them.
pub type Fields = HashMap<String, String>;

/// Result type returned by handlers. Any error is opaque to the core and is
/// answered with 500.
pub type HandlerResult = Result<String, Box<dyn std::error::Error + Send + Sync>>;

/// User-supplied logic behind a linked resource path.
///
/// Implemented for any matching `Fn` closure or function, so state-free
/// handlers register directly; stateful handlers implement the trait on their
/// own type and carry whatever they need.
pub trait Handler: Send + Sync {
    /// Map query arguments, headers, and body fields to the response body.
    fn handle(&self, arguments: &Fields, headers: &Fields, fields: &Fields) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&Fields, &Fields, &Fields) -> HandlerResult + Send + Sync,
{
    fn handle(&self, arguments: &Fields, headers: &Fields, fields: &Fields) -> HandlerResult {
        self(arguments, headers, fields)
    }
}

/// A linked route: the method it answers, the content type of its output,
/// and the handler producing that output. Immutable once linked; re-linking
/// a path replaces the whole definition.
#[derive(Clone)]
pub struct Definition {
    method: Method,
    content_type: ContentType,
    handler: Arc<dyn Handler>,
}

impl Definition {
    /// Bind a method, content type, and handler into one definition.
    pub fn new(method: Method, content_type: ContentType, handler: impl Handler + 'static) -> Self {
        Definition {
            method,
            content_type,
            handler: Arc::new(handler),
        }
    }

    /// Method this definition answers.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Content type of the handler's output.
    #[must_use]
    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Invoke the handler.
    pub fn invoke(&self, arguments: &Fields, headers: &Fields, fields: &Fields) -> HandlerResult {
        self.handler.handle(arguments, headers, fields)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("method", &self.method)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Concurrent path → definition map shared by the accept loop and every
/// in-flight transaction.
#[derive(Debug, Default)]
pub struct Registry {
    map: DashMap<String, Arc<Definition>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Registry::default()
    }

    /// Link a resource path to a definition, replacing any existing link for
    /// the same path wholesale.
    pub fn link(&self, path: impl Into<String>, definition: Definition) {
        let path = path.into();
        if self.map.insert(path.clone(), Arc::new(definition)).is_some() {
            warn!(path = %path, "Replaced existing route definition");
        } else {
            info!(path = %path, "Route linked");
        }
    }

    /// Remove the link for a resource path, if any.
    pub fn unlink(&self, path: &str) {
        if self.map.remove(path).is_some() {
            info!(path = %path, "Route unlinked");
        }
    }

    /// Whether a definition is linked for this path.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.map.contains_key(path)
    }

    /// The definition linked for this path, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Arc<Definition>> {
        self.map.get(path).map(|entry| Arc::clone(entry.value()))
    }
}
