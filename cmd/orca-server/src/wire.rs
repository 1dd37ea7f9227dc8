//! HTTP/1.1 framing over a byte buffer.
//!
//! Requests are parsed into `http::Request<Vec<u8>>` once the header block
//! and the `Content-Length` body are fully buffered. Requests carrying
//! `Transfer-Encoding` or more than one `Content-Length` are rejected.

use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderName, HeaderValue, Request, Response, Version};

use crate::ServerError;

/// Result of looking at the bytes read so far.
#[derive(Debug)]
pub enum Parsed {
    /// A full request and the number of bytes it used.
    Complete(Request<Vec<u8>>, usize),
    /// More bytes are needed.
    Partial,
}

pub fn parse_request(buf: &[u8], max: usize) -> Result<Parsed, ServerError> {
    let Some(head_len) = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4) else {
        if buf.len() >= max {
            return Err(ServerError::TooLarge(max));
        }
        return Ok(Parsed::Partial);
    };

    let head = std::str::from_utf8(&buf[..head_len - 4])
        .map_err(|_| ServerError::Malformed("header block is not UTF-8".to_string()))?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ServerError::Malformed(format!("bad request line `{}`", request_line)));
    };
    let version = match version {
        "HTTP/1.1" => Version::HTTP_11,
        "HTTP/1.0" => Version::HTTP_10,
        other => return Err(ServerError::Malformed(format!("unsupported version `{}`", other))),
    };

    let mut builder = Request::builder().method(method).uri(target).version(version);
    let mut content_length: Option<usize> = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            return Err(ServerError::Malformed(format!("bad header `{}`", line)));
        };
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| ServerError::Malformed(e.to_string()))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| ServerError::Malformed(e.to_string()))?;
        if name == TRANSFER_ENCODING {
            return Err(ServerError::Malformed("transfer-encoding is not supported".to_string()));
        }
        if name == CONTENT_LENGTH {
            if content_length.is_some() {
                return Err(ServerError::Malformed("repeated content-length".to_string()));
            }
            let len = value
                .to_str()
                .ok()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| ServerError::Malformed("bad content-length".to_string()))?;
            content_length = Some(len);
        }
        builder = builder.header(name, value);
    }

    let total = head_len
        .checked_add(content_length.unwrap_or(0))
        .filter(|&t| t <= max)
        .ok_or(ServerError::TooLarge(max))?;
    if buf.len() < total {
        return Ok(Parsed::Partial);
    }

    let req = builder
        .body(buf[head_len..total].to_vec())
        .map_err(|e| ServerError::Malformed(e.to_string()))?;
    Ok(Parsed::Complete(req, total))
}

/// `false` when the client asked to close, or spoke HTTP/1.0 without
/// asking to keep the connection.
pub fn keep_alive<B>(req: &Request<B>) -> bool {
    let connection = req
        .headers()
        .get(CONNECTION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase);
    match connection.as_deref() {
        Some("close") => false,
        Some("keep-alive") => true,
        _ => req.version() != Version::HTTP_10,
    }
}

/// Serialize a response with `Content-Length` framing.
pub fn encode_response(resp: &Response<Vec<u8>>, keep_alive: bool) -> Vec<u8> {
    let status = resp.status();
    let mut out = format!(
        "HTTP/1.1 {} {}\r\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    for (name, value) in resp.headers() {
        if *name == CONTENT_LENGTH || *name == CONNECTION {
            continue;
        }
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push_str("\r\n");
    }
    out.push_str(&format!(
        "Content-Length: {}\r\n\
         Connection: {}\r\n\
         Server: orca-server\r\n\
         \r\n",
        resp.body().len(),
        if keep_alive { "keep-alive" } else { "close" }
    ));

    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(resp.body());
    bytes
}
