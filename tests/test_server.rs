//! End-to-end tests over loopback TCP.

use dirserve::config::Config;
use dirserve::server::listener;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn start(root: &std::path::Path, workers: usize) -> SocketAddr {
    let mut cfg = Config::default();
    cfg.static_files.root = root.to_path_buf();
    cfg.server.workers = workers;
    cfg.validate().unwrap();

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    tokio::spawn(listener::serve(tcp, Arc::new(cfg)));
    addr
}

async fn http_get(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

fn example_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "hello world").unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    dir
}

#[tokio::test]
async fn test_example_root_listing() {
    let dir = example_root();
    let addr = start(dir.path(), 2).await;

    let response = http_get(addr, "GET / HTTP/1.1\r\n").await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n"));
    assert!(response.contains("href=\"/index.html\""));
    assert!(response.contains("href=\"/docs\""));
}

#[tokio::test]
async fn test_example_file() {
    let dir = example_root();
    let addr = start(dir.path(), 2).await;

    let response = http_get(addr, "GET /index.html HTTP/1.1\r\n").await;

    assert_eq!(
        response,
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: 11\r\n\r\nhello world"
    );
}

#[tokio::test]
async fn test_example_errors() {
    let dir = example_root();
    let addr = start(dir.path(), 2).await;

    let missing = http_get(addr, "GET /missing.txt HTTP/1.1\r\n").await;
    assert!(missing.starts_with("HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\n"));

    let post = http_get(addr, "POST / HTTP/1.1\r\n").await;
    assert!(post.starts_with("HTTP/1.1 400 "));

    let bad_proto = http_get(addr, "GET / BADPROTO\r\n").await;
    assert!(bad_proto.starts_with("HTTP/1.1 400 "));
}

#[tokio::test]
async fn test_no_extra_headers() {
    let dir = example_root();
    let addr = start(dir.path(), 1).await;

    let response = http_get(addr, "GET /index.html HTTP/1.0\r\n").await;
    let (head, _) = response.split_once("\r\n\r\n").unwrap();

    assert_eq!(head.lines().count(), 3);
    assert!(!head.contains("Connection:"));
    assert!(!head.contains("Date:"));
    assert!(!head.contains("Server:"));
}

#[tokio::test]
async fn test_many_clients_with_few_workers() {
    let dir = example_root();
    let addr = start(dir.path(), 2).await;

    let clients: Vec<_> = (0..16)
        .map(|_| tokio::spawn(http_get(addr, "GET /index.html HTTP/1.1\r\n")))
        .collect();

    for client in clients {
        let response = client.await.unwrap();
        assert!(response.ends_with("\r\n\r\nhello world"));
    }
}

#[tokio::test]
async fn test_client_closing_early_does_not_stop_server() {
    let dir = example_root();
    let addr = start(dir.path(), 1).await;

    // connect and hang up without sending anything
    drop(TcpStream::connect(addr).await.unwrap());

    let response = http_get(addr, "GET /index.html HTTP/1.1\r\n").await;
    assert!(response.ends_with("hello world"));
}

#[tokio::test]
async fn test_shutdown_stops_accepting_and_returns() {
    let dir = example_root();
    let mut cfg = Config::default();
    cfg.static_files.root = dir.path().to_path_buf();
    cfg.server.workers = 2;

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(listener::serve_until(tcp, Arc::new(cfg), async {
        let _ = stop_rx.await;
    }));

    let response = http_get(addr, "GET /index.html HTTP/1.1\r\n").await;
    assert!(response.ends_with("hello world"));

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(std::time::Duration::from_secs(2), server)
        .await
        .expect("server stops after shutdown")
        .unwrap();
    assert!(result.is_ok());

    // listener is gone with the accept loop
    assert!(TcpStream::connect(addr).await.is_err());
}
