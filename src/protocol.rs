//! Protocol constant tables shared by the codec and the transaction engine:
//! the content type pair, the reply catalog, and the server identity.

use std::borrow::Cow;
use std::fmt;

/// Protocol version accepted from clients and emitted in every status line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Identity sent in the `Server` response header and rendered into generated
/// error documents.
pub const SERVER_NAME: &str = "Restling Server";

/// A `type/subtype` content type pair.
///
/// The core only emits [`ContentType::TEXT_PLAIN`] and
/// [`ContentType::TEXT_HTML`]; embedders can construct any other pair for
/// their own definitions with [`ContentType::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    kind: Cow<'static, str>,
    subtype: Cow<'static, str>,
}

impl ContentType {
    /// `text/plain`
    pub const TEXT_PLAIN: ContentType = ContentType::from_static("text", "plain");
    /// `text/html`
    pub const TEXT_HTML: ContentType = ContentType::from_static("text", "html");

    /// Build a content type from static parts, usable in `const` context.
    pub const fn from_static(kind: &'static str, subtype: &'static str) -> Self {
        ContentType {
            kind: Cow::Borrowed(kind),
            subtype: Cow::Borrowed(subtype),
        }
    }

    /// Build a content type from arbitrary parts.
    pub fn new(kind: impl Into<Cow<'static, str>>, subtype: impl Into<Cow<'static, str>>) -> Self {
        ContentType {
            kind: kind.into(),
            subtype: subtype.into(),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

/// One entry of the fixed reply catalog: numeric code, status phrase, and the
/// description rendered verbatim into generated error documents.
///
/// Process-wide constant data; replies are never built at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    phrase: &'static str,
    description: &'static str,
}

impl Reply {
    pub const OK: Reply = Reply::new(200, "OK", "The resource was found and processed successfully.");
    pub const MOVED_PERMANENTLY: Reply = Reply::new(
        301,
        "Moved Permanently",
        "The resource has permanently been moved to a different location.",
    );
    pub const BAD_REQUEST: Reply = Reply::new(
        400,
        "Bad Request",
        "A malformed request was sent for the specified resource.",
    );
    pub const ACCESS_DENIED: Reply = Reply::new(
        403,
        "Access Denied",
        "You do not have permission to view this resource.",
    );
    pub const NOT_FOUND: Reply = Reply::new(
        404,
        "Not Found",
        "The specified resource was not found on this server.",
    );
    pub const METHOD_NOT_ALLOWED: Reply = Reply::new(
        405,
        "Method Not Allowed",
        "The method used is not allowed for the specified resource.",
    );
    pub const REQUEST_TOO_LARGE: Reply = Reply::new(
        413,
        "Request Entity Too Large",
        "The request sent was larger than this server is willing to process.",
    );
    pub const INTERNAL_SERVER_ERROR: Reply = Reply::new(
        500,
        "Internal Server Error",
        "The requested resource could not be processed successfully on this server.",
    );
    pub const VERSION_NOT_SUPPORTED: Reply = Reply::new(
        505,
        "HTTP Version Not Supported",
        "The HTTP version used is not supported by this server.",
    );

    const fn new(code: u16, phrase: &'static str, description: &'static str) -> Self {
        Reply {
            code,
            phrase,
            description,
        }
    }

    /// Numeric status code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Status phrase, e.g. `"Not Found"`.
    #[must_use]
    pub const fn phrase(&self) -> &'static str {
        self.phrase
    }

    /// Human readable description used in generated error documents.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Code and phrase as they appear on the status line, e.g. `"200 OK"`.
    #[must_use]
    pub fn status(&self) -> String {
        format!("{} {}", self.code, self.phrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_status() {
        assert_eq!(Reply::OK.status(), "200 OK");
        assert_eq!(Reply::NOT_FOUND.status(), "404 Not Found");
        assert_eq!(Reply::VERSION_NOT_SUPPORTED.code(), 505);
    }

    #[test]
    fn test_content_type_rendering() {
        assert_eq!(ContentType::TEXT_PLAIN.to_string(), "text/plain");
        assert_eq!(ContentType::new("application", "json").to_string(), "application/json");
    }
}
