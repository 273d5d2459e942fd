//! Stateless protocol codec: parses one request off a buffered byte stream
//! and frames one reply back onto it.
//!
//! Parsing never raises for bad input it can classify - a request line that
//! does not split into its three tokens comes back as
//! [`ParseOutcome::Malformed`] so the caller can answer 400 without touching
//! the header section. Only genuine transport failures surface as
//! `io::Error`.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};

use crate::protocol::{ContentType, Reply, HTTP_VERSION, SERVER_NAME};

/// One fully parsed request, local to a single transaction.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedRequest {
    /// Request verb exactly as sent, e.g. `"GET"`.
    pub method: String,
    /// Resource path with the argument section stripped.
    pub resource: String,
    /// Protocol version token, e.g. `"HTTP/1.1"`.
    pub version: String,
    /// Query arguments in order of appearance; duplicates are preserved.
    pub arguments: Vec<(String, String)>,
    /// Header fields; a later header with the same key overwrites the earlier.
    pub headers: HashMap<String, String>,
    /// Body fields decoded from `key=value` pairs.
    pub fields: HashMap<String, String>,
}

impl ParsedRequest {
    /// Query arguments collapsed to a map, later duplicates winning.
    #[must_use]
    pub fn argument_map(&self) -> HashMap<String, String> {
        self.arguments.iter().cloned().collect()
    }
}

/// Outcome of reading one request off the wire.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Request line, headers and body were read successfully.
    Complete(ParsedRequest),
    /// The request line did not split into method, resource and version.
    /// Headers and body were left unread.
    Malformed,
}

/// Read and decode one request from `reader`.
///
/// The reader must wrap a stream carrying at most one request; body bytes
/// without a `Content-Length` header are taken from the reader's buffer only,
/// never from a blocking read.
pub fn read_request<R: Read>(reader: &mut BufReader<R>) -> io::Result<ParseOutcome> {
    let line = read_line(reader)?.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before a request line was sent",
        )
    })?;

    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() < 3 {
        return Ok(ParseOutcome::Malformed);
    }
    let method = tokens[0].trim().to_string();
    let version = tokens[2].trim().to_string();
    let (resource, arguments) = split_resource(tokens[1].trim());

    let headers = read_headers(reader)?;
    let body = read_body(reader, &headers)?;
    let fields = parse_pairs(&body).into_iter().collect();

    Ok(ParseOutcome::Complete(ParsedRequest {
        method,
        resource,
        version,
        arguments,
        headers,
        fields,
    }))
}

/// Strip the argument section from a resource and decode it.
fn split_resource(raw: &str) -> (String, Vec<(String, String)>) {
    match raw.split_once('?') {
        Some((path, section)) => (path.to_string(), parse_pairs(section)),
        None => (raw.to_string(), Vec::new()),
    }
}

/// Decode an `&`-separated section of `key=value` fields, trimming both
/// sides. A field without `=` is skipped, not an error.
fn parse_pairs(section: &str) -> Vec<(String, String)> {
    section
        .split('&')
        .filter_map(|field| {
            let (key, value) = field.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Read header lines until the blank terminator or end of stream.
fn read_headers<R: Read>(reader: &mut BufReader<R>) -> io::Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    while let Some(line) = read_line(reader)? {
        if line.is_empty() {
            break;
        }
        // A line without a colon is skipped rather than rejected.
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    Ok(headers)
}

/// Read the request body.
///
/// With a `Content-Length` header the read is bounded to exactly that many
/// bytes; the connection's read timeout caps a peer that declared more than
/// it sends. Without one, only bytes that arrived together with the head of
/// the request (already sitting in the reader's buffer) are taken, so an
/// empty body never blocks.
fn read_body<R: Read>(
    reader: &mut BufReader<R>,
    headers: &HashMap<String, String>,
) -> io::Result<String> {
    let declared = headers.get("Content-Length").and_then(|v| v.parse::<usize>().ok());
    let length = match declared {
        Some(length) => length,
        None => reader.buffer().len(),
    };
    if length == 0 {
        return Ok(String::new());
    }
    let mut raw = vec![0u8; length];
    reader.read_exact(&mut raw)?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// Read one `\r\n`- or `\n`-terminated line, without its terminator.
/// Returns `None` at end of stream.
fn read_line<R: Read>(reader: &mut BufReader<R>) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

/// Frame a reply onto `writer`.
///
/// The header order is fixed for wire compatibility: status line,
/// `Content-Type`, `Content-Length`, `Cache-Control`, `Connection`, `Server`,
/// blank line, body bytes verbatim.
pub fn write_reply<W: Write>(
    writer: &mut W,
    reply: &Reply,
    content_type: &ContentType,
    body: &str,
) -> io::Result<()> {
    write!(writer, "{} {}\r\n", HTTP_VERSION, reply.status())?;
    write!(writer, "Content-Type: {}\r\n", content_type)?;
    write!(writer, "Content-Length: {}\r\n", body.len())?;
    write!(writer, "Cache-Control: no-cache\r\n")?;
    write!(writer, "Connection: close\r\n")?;
    write!(writer, "Server: {}\r\n", SERVER_NAME)?;
    write!(writer, "\r\n")?;
    writer.write_all(body.as_bytes())
}

/// Frame an error reply: the reply's generated document with content type
/// `text/html`.
pub fn write_error<W: Write>(writer: &mut W, reply: &Reply) -> io::Result<()> {
    let page = error_document(reply);
    write_reply(writer, reply, &ContentType::TEXT_HTML, &page)
}

/// Render the minimal document used as the body of generated error replies:
/// title and heading carry the status, the paragraph carries the catalog
/// description, the trailer names the server.
#[must_use]
pub fn error_document(reply: &Reply) -> String {
    let title = reply.status();
    let description = reply.description();
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         \t<head>\n\
         \t\t<title>{title}</title>\n\
         \t</head>\n\
         \t<body>\n\
         \t\t<h1>{title}</h1>\n\
         \t\t<p>{description}</p>\n\
         \t\t<hr />\n\
         \t\t<i>{SERVER_NAME}</i>\n\
         \t</body>\n\
         </html>\n"
    )
}
