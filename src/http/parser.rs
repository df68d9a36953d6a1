use std::fmt;

use crate::http::request::Request;

/// Upper bound on bytes buffered while looking for the line terminator.
pub const MAX_REQUEST_LINE: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The stream ended before a `\n` was seen.
    MissingLineTerminator,
    /// No `\n` within `MAX_REQUEST_LINE` bytes.
    LineTooLong,
    InvalidUtf8,
    /// The line did not split into exactly three tokens.
    TokenCount(usize),
    /// Bad percent-escape in the path.
    InvalidEscape,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingLineTerminator => f.write_str("no line terminator in request"),
            ParseError::LineTooLong => write!(f, "request line exceeds {MAX_REQUEST_LINE} bytes"),
            ParseError::InvalidUtf8 => f.write_str("request line is not valid UTF-8"),
            ParseError::TokenCount(n) => write!(f, "expected 3 tokens in request line, got {n}"),
            ParseError::InvalidEscape => f.write_str("invalid URL encoding in path"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Returns the length of the first line in `buf`, terminator included.
pub fn find_line_end(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|pos| pos + 1)
}

/// Parses a request line such as `GET /index.html HTTP/1.1\r\n`.
///
/// Tokens are separated by single spaces. The version token is returned as
/// received, so it keeps its `\r\n`.
pub fn parse_request_line(line: &[u8]) -> Result<Request, ParseError> {
    if find_line_end(line).is_none() {
        return Err(ParseError::MissingLineTerminator);
    }

    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidUtf8)?;

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, raw_path, version] = parts.as_slice() else {
        return Err(ParseError::TokenCount(parts.len()));
    };

    let path = percent_decode(raw_path)?;

    Ok(Request {
        method: method.to_string(),
        path,
        version: version.to_string(),
    })
}

/// Strict percent-decoding of a URL path: every `%` must be followed by two
/// hex digits, `+` stays literal, and the result must be UTF-8.
pub fn percent_decode(raw: &str) -> Result<String, ParseError> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|&b| hex_value(b));
            let lo = bytes.get(i + 2).and_then(|&b| hex_value(b));
            match (hi, lo) {
                (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                _ => return Err(ParseError::InvalidEscape),
            }
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).map_err(|_| ParseError::InvalidUtf8)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = parse_request_line(b"GET / HTTP/1.1\r\n").unwrap();

        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/");
        assert_eq!(req.version, "HTTP/1.1\r\n");
    }

    #[test]
    fn hex_digits() {
        assert_eq!(hex_value(b'0'), Some(0));
        assert_eq!(hex_value(b'f'), Some(15));
        assert_eq!(hex_value(b'F'), Some(15));
        assert_eq!(hex_value(b'g'), None);
    }
}
