use std::io;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, info, warn};

use crate::fs::{ResolvedResource, Resolver, render_listing};
use crate::http::parser::{MAX_REQUEST_LINE, ParseError, find_line_end, parse_request_line};
use crate::http::request::{Request, RequestError};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;

/// Handles exactly one request on one connection, then closes it.
///
/// Every read and write is bounded by `deadline`, which is armed when the
/// connection is accepted.
pub struct Connection<S> {
    stream: S,
    deadline: Instant,
    resolver: Arc<Resolver>,
    buffer: BytesMut,
    state: ConnectionState,
}

pub enum ConnectionState {
    Accepted,
    Parsed(Request),
    Validated(Request),
    Resolved(Request, ResolvedResource),
    Served,
    Errored(StatusCode, String),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, deadline: Instant, resolver: Arc<Resolver>) -> Self {
        Self {
            stream,
            deadline,
            resolver,
            buffer: BytesMut::with_capacity(1024),
            state: ConnectionState::Accepted,
        }
    }

    /// Drives the connection to `Closed` and returns the status of the
    /// response that was sent, or attempted.
    ///
    /// Consumes the connection, so the stream is closed exactly once on
    /// every path.
    pub async fn run(mut self) -> StatusCode {
        let mut status = StatusCode::Ok;

        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);
            self.state = match state {
                ConnectionState::Accepted => match self.read_request().await {
                    Ok(req) => {
                        info!(
                            method = %req.method,
                            path = %req.path,
                            version = %req.version_token(),
                            "New request"
                        );
                        ConnectionState::Parsed(req)
                    }
                    Err(e) => {
                        warn!(error = %e, "Error parsing request");
                        ConnectionState::Errored(e.status(), e.reason().to_string())
                    }
                },

                ConnectionState::Parsed(req) => match req.validate() {
                    Ok(()) => ConnectionState::Validated(req),
                    Err(e) => {
                        warn!(error = %e, "Rejected request");
                        ConnectionState::Errored(e.status(), e.reason().to_string())
                    }
                },

                ConnectionState::Validated(req) => {
                    let resolved = self.resolver.resolve(&req.path).await;
                    match resolved {
                        ResolvedResource::Missing => error_state(StatusCode::NotFound),
                        ResolvedResource::Unreadable => {
                            error_state(StatusCode::InternalServerError)
                        }
                        resource => ConnectionState::Resolved(req, resource),
                    }
                }

                ConnectionState::Resolved(req, resource) => {
                    match build_response(&req, resource).await {
                        Ok(response) => {
                            status = response.status;
                            self.send(response).await;
                            ConnectionState::Served
                        }
                        Err(e) => {
                            error!(path = %req.path, error = %e, "Failed to open resource");
                            error_state(StatusCode::InternalServerError)
                        }
                    }
                }

                ConnectionState::Errored(code, message) => {
                    status = code;
                    self.send(Response::error(code, &message)).await;
                    ConnectionState::Closed
                }

                ConnectionState::Served => ConnectionState::Closed,

                ConnectionState::Closed => break,
            };
        }

        self.close().await;
        status
    }

    /// Reads up to and including the first `\n`, then parses that line.
    pub async fn read_request(&mut self) -> Result<Request, RequestError> {
        let line_len = match timeout_at(self.deadline, self.fill_line()).await {
            Ok(res) => res?,
            Err(_) => return Err(RequestError::Io(deadline_exceeded())),
        };

        Ok(parse_request_line(&self.buffer[..line_len])?)
    }

    async fn fill_line(&mut self) -> Result<usize, RequestError> {
        loop {
            if let Some(len) = find_line_end(&self.buffer) {
                return Ok(len);
            }

            if self.buffer.len() >= MAX_REQUEST_LINE {
                return Err(ParseError::LineTooLong.into());
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                // Client closed before finishing the line
                return Err(ParseError::MissingLineTerminator.into());
            }
        }
    }

    /// Best effort: failures are logged, the connection is closed either way.
    async fn send(&mut self, response: Response) {
        let status = response.status.as_u16();
        let mut writer = ResponseWriter::new(response);

        let result = timeout_at(self.deadline, writer.write_to_stream(&mut self.stream)).await;
        match result {
            Ok(Ok(written)) => debug!(status, bytes = written, "Response sent"),
            Ok(Err(e)) => warn!(
                status,
                bytes = writer.written(),
                error = %e,
                "Failed to write response"
            ),
            Err(_) => warn!(
                status,
                bytes = writer.written(),
                "Connection deadline exceeded while writing"
            ),
        }
    }

    async fn close(mut self) {
        if let Ok(Err(e)) = timeout_at(self.deadline, self.stream.shutdown()).await {
            debug!(error = %e, "Shutdown failed");
        }
    }
}

fn error_state(code: StatusCode) -> ConnectionState {
    ConnectionState::Errored(code, code.reason_phrase().to_string())
}

fn deadline_exceeded() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "connection deadline exceeded")
}

async fn build_response(req: &Request, resource: ResolvedResource) -> io::Result<Response> {
    match resource {
        ResolvedResource::File {
            path,
            size,
            content_type,
        } => {
            let file = tokio::fs::File::open(&path).await?;
            Ok(Response::file(file, size, &content_type))
        }
        ResolvedResource::Directory { entries, .. } => {
            Ok(Response::html(render_listing(&req.path, &entries)))
        }
        ResolvedResource::Missing | ResolvedResource::Unreadable => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "resource was not resolved to a file or directory",
        )),
    }
}
