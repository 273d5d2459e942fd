//! Tests for the protocol codec: request parsing and reply framing.
//!
//! # Test Coverage
//!
//! - Request-line tokenization and the malformed short-circuit
//! - Query argument, header, and body field decoding
//! - `Content-Length`-bounded and buffered-only body reads
//! - Reply framing: status line, fixed header order, `Content-Length`
//! - Generated error documents

use std::io::BufReader;

use restling::codec::{error_document, read_request, write_error, write_reply, ParseOutcome, ParsedRequest};
use restling::protocol::{ContentType, Reply, SERVER_NAME};

fn parse(raw: &[u8]) -> ParseOutcome {
    let mut reader = BufReader::new(raw);
    read_request(&mut reader).expect("read request")
}

fn parse_complete(raw: &[u8]) -> ParsedRequest {
    match parse(raw) {
        ParseOutcome::Complete(request) => request,
        ParseOutcome::Malformed => panic!("expected a complete request"),
    }
}

#[test]
fn test_request_line_and_arguments() {
    let request = parse_complete(b"GET /path?a=1&b=2&junk HTTP/1.1\r\nHost: local\r\n\r\n");
    assert_eq!(request.method, "GET");
    assert_eq!(request.resource, "/path");
    assert_eq!(request.version, "HTTP/1.1");
    assert_eq!(
        request.arguments,
        vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
    );
    assert_eq!(request.headers.get("Host").map(String::as_str), Some("local"));
    assert!(request.fields.is_empty());
}

#[test]
fn test_resource_without_arguments() {
    let request = parse_complete(b"GET /plain HTTP/1.1\r\n\r\n");
    assert_eq!(request.resource, "/plain");
    assert!(request.arguments.is_empty());
}

#[test]
fn test_duplicate_arguments_preserved_in_order() {
    let request = parse_complete(b"GET /r?x=1&x=2 HTTP/1.1\r\n\r\n");
    assert_eq!(request.arguments.len(), 2);
    // Collapsing to a map keeps the later value.
    assert_eq!(request.argument_map().get("x").map(String::as_str), Some("2"));
}

#[test]
fn test_request_line_with_fewer_than_three_tokens_is_malformed() {
    assert_eq!(parse(b"GARBAGE\r\nHost: local\r\n\r\n"), ParseOutcome::Malformed);
    assert_eq!(parse(b"GET /only-two\r\n\r\n"), ParseOutcome::Malformed);
}

#[test]
fn test_header_without_colon_skipped_and_duplicate_overwritten() {
    let request = parse_complete(b"GET / HTTP/1.1\r\nX: 1\r\nno colon here\r\nX: 2\r\n\r\n");
    assert_eq!(request.headers.len(), 1);
    assert_eq!(request.headers.get("X").map(String::as_str), Some("2"));
}

#[test]
fn test_header_key_and_value_trimmed() {
    let request = parse_complete(b"GET / HTTP/1.1\r\n  Key  :   padded value  \r\n\r\n");
    assert_eq!(request.headers.get("Key").map(String::as_str), Some("padded value"));
}

#[test]
fn test_body_read_bounded_by_content_length() {
    let request =
        parse_complete(b"POST /p HTTP/1.1\r\nContent-Length: 7\r\n\r\na=1&b=2");
    assert_eq!(request.fields.len(), 2);
    assert_eq!(request.fields.get("a").map(String::as_str), Some("1"));
    assert_eq!(request.fields.get("b").map(String::as_str), Some("2"));
}

#[test]
fn test_body_without_content_length_drains_buffered_bytes() {
    let request = parse_complete(b"POST /p HTTP/1.1\r\n\r\na=1&b=2");
    assert_eq!(request.fields.len(), 2);
}

#[test]
fn test_absent_body_is_empty() {
    let request = parse_complete(b"GET /p HTTP/1.1\r\nHost: local\r\n\r\n");
    assert!(request.fields.is_empty());
}

#[test]
fn test_body_field_without_equals_is_skipped() {
    let request =
        parse_complete(b"POST /p HTTP/1.1\r\nContent-Length: 13\r\n\r\na=1&junk&b=2x");
    assert_eq!(request.fields.len(), 2);
    assert_eq!(request.fields.get("b").map(String::as_str), Some("2x"));
}

#[test]
fn test_body_fields_trimmed() {
    let request =
        parse_complete(b"POST /p HTTP/1.1\r\nContent-Length: 11\r\n\r\n a = 1 &b=2");
    assert_eq!(request.fields.get("a").map(String::as_str), Some("1"));
}

#[test]
fn test_empty_stream_is_a_transport_error() {
    let mut reader = BufReader::new(&b""[..]);
    assert!(read_request(&mut reader).is_err());
}

const CATALOG: [Reply; 9] = [
    Reply::OK,
    Reply::MOVED_PERMANENTLY,
    Reply::BAD_REQUEST,
    Reply::ACCESS_DENIED,
    Reply::NOT_FOUND,
    Reply::METHOD_NOT_ALLOWED,
    Reply::REQUEST_TOO_LARGE,
    Reply::INTERNAL_SERVER_ERROR,
    Reply::VERSION_NOT_SUPPORTED,
];

#[test]
fn test_reply_framing_for_every_catalog_entry() {
    for reply in CATALOG {
        let mut out = Vec::new();
        write_reply(&mut out, &reply, &ContentType::TEXT_PLAIN, "body!").expect("write reply");
        let raw = String::from_utf8(out).expect("utf8 response");

        let head = raw.split("\r\n\r\n").next().expect("header section");
        let lines: Vec<&str> = head.split("\r\n").collect();
        assert_eq!(lines[0], format!("HTTP/1.1 {} {}", reply.code(), reply.phrase()));
        assert_eq!(lines[1], "Content-Type: text/plain");
        assert_eq!(lines[2], "Content-Length: 5");
        assert_eq!(lines[3], "Cache-Control: no-cache");
        assert_eq!(lines[4], "Connection: close");
        assert_eq!(lines[5], format!("Server: {SERVER_NAME}"));
        assert_eq!(lines.len(), 6);
        assert!(raw.ends_with("\r\n\r\nbody!"));
    }
}

#[test]
fn test_status_line_round_trip() {
    let mut out = Vec::new();
    write_reply(&mut out, &Reply::OK, &ContentType::TEXT_PLAIN, "hi").expect("write reply");
    let raw = String::from_utf8(out).expect("utf8 response");
    assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
}

#[test]
fn test_error_document_contents() {
    let page = error_document(&Reply::NOT_FOUND);
    assert!(page.contains("<title>404 Not Found</title>"));
    assert!(page.contains("<h1>404 Not Found</h1>"));
    assert!(page.contains(Reply::NOT_FOUND.description()));
    assert!(page.contains(SERVER_NAME));
}

#[test]
fn test_write_error_frames_html_document() {
    let mut out = Vec::new();
    write_error(&mut out, &Reply::ACCESS_DENIED).expect("write error");
    let raw = String::from_utf8(out).expect("utf8 response");
    let page = error_document(&Reply::ACCESS_DENIED);
    assert!(raw.starts_with("HTTP/1.1 403 Access Denied\r\n"));
    assert!(raw.contains("Content-Type: text/html\r\n"));
    assert!(raw.contains(&format!("Content-Length: {}\r\n", page.len())));
    assert!(raw.ends_with(&page));
}
