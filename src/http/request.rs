use std::fmt;
use std::io;

use crate::http::parser::ParseError;
use crate::http::response::StatusCode;

/// The only method the server answers.
pub const GET: &str = "GET";

/// Represents a parsed HTTP request line.
///
/// Built once from the first line read off a connection and never mutated.
/// No headers or body are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Method token as received (e.g. "GET")
    pub method: String,
    /// Percent-decoded request path (e.g. "/docs/read me.txt")
    pub path: String,
    /// Version token as received, including the trailing line terminator
    /// (e.g. "HTTP/1.1\r\n")
    pub version: String,
}

/// Reasons a request never reaches resolution.
#[derive(Debug)]
pub enum RequestError {
    /// The request line could not be parsed.
    Malformed(ParseError),
    /// Reading the request line failed, including deadline expiry.
    Io(io::Error),
    /// Method other than GET.
    UnsupportedMethod(String),
    /// Version token not starting with "HTTP".
    UnsupportedVersion(String),
}

impl Request {
    /// Version token with the line terminator stripped, for logging.
    pub fn version_token(&self) -> &str {
        self.version.trim_end_matches(['\r', '\n'])
    }

    /// Enforces the supported subset: a GET over some HTTP version.
    ///
    /// The version is checked first, so `POST / FTP/1.0` reports the version.
    pub fn validate(&self) -> Result<(), RequestError> {
        if !self.version.starts_with("HTTP") {
            return Err(RequestError::UnsupportedVersion(
                self.version_token().to_string(),
            ));
        }

        if self.method != GET {
            return Err(RequestError::UnsupportedMethod(self.method.clone()));
        }

        Ok(())
    }
}

impl RequestError {
    /// Every request-level failure is a client error.
    pub fn status(&self) -> StatusCode {
        StatusCode::BadRequest
    }

    /// Text sent as the body of the error response.
    pub fn reason(&self) -> &'static str {
        match self {
            RequestError::Malformed(_) | RequestError::Io(_) => "Bad Request",
            RequestError::UnsupportedMethod(_) => "method not allowed",
            RequestError::UnsupportedVersion(_) => "invalid HTTP version",
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Malformed(e) => write!(f, "malformed request: {e}"),
            RequestError::Io(e) => write!(f, "failed to read request: {e}"),
            RequestError::UnsupportedMethod(m) => write!(f, "unsupported method {m:?}"),
            RequestError::UnsupportedVersion(v) => write!(f, "unsupported version {v:?}"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Malformed(e) => Some(e),
            RequestError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for RequestError {
    fn from(e: ParseError) -> Self {
        RequestError::Malformed(e)
    }
}

impl From<io::Error> for RequestError {
    fn from(e: io::Error) -> Self {
        RequestError::Io(e)
    }
}
