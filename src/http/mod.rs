//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.0-style exchange: one request line per
//! connection, no request headers or bodies, no keep-alive.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection handler implementing the state machine below
//! - **`parser`**: Reads and percent-decodes the request line
//! - **`request`**: Request representation and validation
//! - **`response`**: Response representation with builder pattern
//! - **`writer`**: Serializes and writes responses, streaming file bodies
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │  Accepted   │ ← Read the request line
//!        └──────┬──────┘
//!               │ parse ok           (parse fails → Errored 400)
//!               ▼
//!        ┌─────────────┐
//!        │   Parsed    │
//!        └──────┬──────┘
//!               │ GET + HTTP*        (otherwise → Errored 400)
//!               ▼
//!        ┌─────────────┐
//!        │  Validated  │
//!        └──────┬──────┘
//!               │ file / directory   (missing → 404, unreadable → 500)
//!               ▼
//!        ┌─────────────┐
//!        │  Resolved   │ ← Stream file or listing
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐        ┌─────────────┐
//!        │   Served    │        │   Errored   │ ← Send error response
//!        └──────┬──────┘        └──────┬──────┘
//!               └──────────┬───────────┘
//!                          ▼
//!                   ┌─────────────┐
//!                   │   Closed    │
//!                   └─────────────┘
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
