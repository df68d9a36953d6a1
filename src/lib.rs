//! dirserve - minimal static file server
//!
//! Accepts raw TCP connections, parses a single HTTP request line and answers
//! with a file body or a generated directory listing. One request per
//! connection.

pub mod cli;
pub mod config;
pub mod fs;
pub mod http;
pub mod server;
