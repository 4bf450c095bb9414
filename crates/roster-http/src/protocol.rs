//! Minimal HTTP/1.1 framing: one request in, one response out, then close.

use http::header::{HeaderName, HeaderValue, CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{Method, Request, Response, Version};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::trace;

pub const MAX_HEADER_BYTES: usize = 16 * 1024;

#[derive(Error, Debug)]
pub enum HttpProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),
    #[error("Invalid request line: {0}")]
    InvalidRequestLine(String),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("Unsupported HTTP version: {0}")]
    UnsupportedVersion(String),
    #[error("Request headers exceed {MAX_HEADER_BYTES} bytes")]
    HeadersTooLarge,
    #[error("Request body of {length} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { length: u64, limit: u64 },
    #[error("Connection closed")]
    ConnectionClosed,
}

impl HttpProtocolError {
    /// Whether the peer sent something we can answer with a 4xx, as opposed
    /// to the connection having failed underneath us.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::ConnectionClosed)
    }
}

const EXCERPT_BYTES: usize = 120;

/// Reads one request: the request line, headers up to the blank line, and a
/// body of exactly `Content-Length` bytes (empty when the header is absent).
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
    max_body_bytes: u64,
) -> Result<Request<Vec<u8>>, HttpProtocolError> {
    let mut header_bytes = 0usize;

    let raw = read_head_line(reader, &mut header_bytes).await?;
    let request_line = std::str::from_utf8(&raw)
        .map_err(|_| HttpProtocolError::InvalidRequestLine(excerpt(&raw)))?;
    let invalid_line = || HttpProtocolError::InvalidRequestLine(excerpt(request_line.as_bytes()));

    let mut parts = request_line.split(' ');
    let (method, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(t), Some(v), None) if !m.is_empty() && !t.is_empty() => (m, t, v),
        _ => return Err(invalid_line()),
    };

    let method = Method::from_bytes(method.as_bytes()).map_err(|_| invalid_line())?;
    let version = match version {
        "HTTP/1.1" => Version::HTTP_11,
        "HTTP/1.0" => Version::HTTP_10,
        other => return Err(HttpProtocolError::UnsupportedVersion(excerpt(other.as_bytes()))),
    };

    let mut builder = Request::builder().method(method).uri(target).version(version);
    let mut content_length: Option<u64> = None;

    loop {
        let raw = read_head_line(reader, &mut header_bytes).await?;
        if raw.is_empty() {
            break;
        }

        let invalid_header = || HttpProtocolError::InvalidHeader(excerpt(&raw));
        let header_line = std::str::from_utf8(&raw).map_err(|_| invalid_header())?;

        let (name, value) = header_line.split_once(':').ok_or_else(invalid_header)?;
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid_header())?;
        let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid_header())?;

        if name == CONTENT_LENGTH {
            let length = value
                .to_str()
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .ok_or_else(invalid_header)?;
            if content_length.is_some_and(|existing| existing != length) {
                return Err(invalid_header());
            }
            content_length = Some(length);
        } else if name == TRANSFER_ENCODING {
            return Err(HttpProtocolError::InvalidHeader(format!(
                "{} (only Content-Length bodies are accepted)",
                excerpt(&raw)
            )));
        }

        builder = builder.header(name, value);
    }

    let length = content_length.unwrap_or(0);
    if length > max_body_bytes {
        return Err(HttpProtocolError::PayloadTooLarge {
            length,
            limit: max_body_bytes,
        });
    }

    let mut body = vec![0u8; length as usize];
    reader.read_exact(&mut body).await?;
    trace!("Read request with {} header bytes and {} body bytes", header_bytes, length);

    Ok(builder.body(body)?)
}

/// Reads one line of the request head, without its terminator. The read is
/// capped at what is left of `MAX_HEADER_BYTES`, so a line that never ends
/// cannot grow past the header budget.
async fn read_head_line<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
    header_bytes: &mut usize,
) -> Result<Vec<u8>, HttpProtocolError> {
    let remaining = MAX_HEADER_BYTES.saturating_sub(*header_bytes);
    let mut line = Vec::new();
    let bytes_read = (&mut *reader)
        .take(remaining as u64 + 1)
        .read_until(b'\n', &mut line)
        .await?;
    if bytes_read == 0 {
        return Err(HttpProtocolError::ConnectionClosed);
    }

    *header_bytes += bytes_read;
    if *header_bytes > MAX_HEADER_BYTES {
        return Err(HttpProtocolError::HeadersTooLarge);
    }
    if line.last() != Some(&b'\n') {
        return Err(HttpProtocolError::ConnectionClosed);
    }

    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
    Ok(line)
}

/// A short, printable prefix of a rejected line for errors and logs.
fn excerpt(bytes: &[u8]) -> String {
    let cut = &bytes[..bytes.len().min(EXCERPT_BYTES)];
    let mut text = String::from_utf8_lossy(cut).into_owned();
    if bytes.len() > EXCERPT_BYTES {
        text.push_str("...");
    }
    text
}

/// Serializes a response with `Content-Length` and `Connection: close` set.
pub fn encode_response(response: &Response<Vec<u8>>) -> Vec<u8> {
    let status = response.status();
    let mut head = format!(
        "HTTP/1.1 {} {}\r\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );

    for (name, value) in response.headers() {
        if name == CONTENT_LENGTH || name == CONNECTION {
            continue;
        }
        head.push_str(name.as_str());
        head.push_str(": ");
        head.push_str(&String::from_utf8_lossy(value.as_bytes()));
        head.push_str("\r\n");
    }
    head.push_str(&format!("content-length: {}\r\n", response.body().len()));
    head.push_str("connection: close\r\n\r\n");

    let mut result = head.into_bytes();
    result.extend_from_slice(response.body());
    result
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response<Vec<u8>>,
) -> Result<(), HttpProtocolError> {
    writer.write_all(&encode_response(response)).await?;
    writer.flush().await?;
    Ok(())
}
