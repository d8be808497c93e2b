//! Outbound header construction.
//!
//! [`build_forwarded_headers`] replays the client's headers to a
//! destination. Everything is passed through verbatim (including `Host`)
//! except connection-scoped hop-by-hop headers and `content-length`, which
//! is recomputed from the captured body.

use std::sync::LazyLock;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use super::body::CapturedBody;

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    ["connection", "keep-alive", "transfer-encoding", "te", "trailer", "upgrade"]
        .iter()
        .filter_map(|name| name.parse::<HeaderName>().ok())
        .collect()
});

#[must_use]
pub fn build_forwarded_headers(original: &HeaderMap, body: &CapturedBody) -> HeaderMap {
    let mut headers = original.clone();

    // The body is re-framed from a buffer on a fresh connection
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }

    // The client's content-length cannot be trusted to match the replay
    match body {
        CapturedBody::Absent => {
            headers.remove(header::CONTENT_LENGTH);
        }
        CapturedBody::Bytes(bytes) => {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn client_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("host", "proxy.local:8080".parse().unwrap());
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer token".parse().unwrap());
        headers.insert("content-length", "999".parse().unwrap());
        headers
    }

    #[test]
    fn passes_client_headers_through() {
        let result = build_forwarded_headers(&client_headers(), &CapturedBody::Absent);

        assert_eq!(result.get("host").unwrap(), "proxy.local:8080");
        assert_eq!(result.get("content-type").unwrap(), "application/json");
        assert_eq!(result.get("authorization").unwrap(), "Bearer token");
    }

    #[test]
    fn absent_body_drops_content_length() {
        let result = build_forwarded_headers(&client_headers(), &CapturedBody::Absent);
        assert!(result.get("content-length").is_none());
    }

    #[test]
    fn content_length_matches_captured_bytes() {
        let body = CapturedBody::Bytes(Bytes::from_static(br#"{"a":1}"#));
        let result = build_forwarded_headers(&client_headers(), &body);
        assert_eq!(result.get("content-length").unwrap(), "7");
    }

    #[test]
    fn strips_hop_by_hop() {
        let mut original = client_headers();
        original.insert("connection", "keep-alive".parse().unwrap());
        original.insert("transfer-encoding", "chunked".parse().unwrap());

        let result = build_forwarded_headers(&original, &CapturedBody::Absent);

        assert!(result.get("connection").is_none());
        assert!(result.get("transfer-encoding").is_none());
        assert!(result.get("content-type").is_some());
    }

    #[test]
    fn repeated_headers_survive() {
        let mut original = HeaderMap::new();
        original.append("x-tag", "a".parse().unwrap());
        original.append("x-tag", "b".parse().unwrap());

        let result = build_forwarded_headers(&original, &CapturedBody::Absent);
        let values: Vec<_> = result.get_all("x-tag").iter().collect();
        assert_eq!(values, vec!["a", "b"]);
    }
}
