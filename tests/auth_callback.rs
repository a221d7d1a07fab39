use std::time::Duration;

use inbox::auth::callback::wait_for_callback;
use inbox::error::AppError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("addr").port()
}

/// Send one raw request to the callback listener, retrying until it is bound.
async fn send(port: u16, request: &str) -> String {
    let mut stream = None;
    for _ in 0..50 {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(connected) => {
                stream = Some(connected);
                break;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    let mut stream = stream.expect("callback listener never came up");

    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    response
}

#[tokio::test]
async fn captures_code_from_redirect() {
    let port = free_port().await;
    let redirect_uri = format!("http://127.0.0.1:{port}/callback");

    let waiter = tokio::spawn(async move {
        wait_for_callback(&redirect_uri, "state-1", Duration::from_secs(5)).await
    });
    let response = send(
        port,
        "GET /callback?code=abc&state=state-1 HTTP/1.1\r\nHost: localhost\r\n\r\n",
    )
    .await;

    let callback = waiter.await.expect("join").expect("callback");
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("login complete"));
    assert_eq!(callback.code.as_deref(), Some("abc"));
    assert_eq!(callback.state, "state-1");
}

#[tokio::test]
async fn answers_bad_request_on_state_mismatch() {
    let port = free_port().await;
    let redirect_uri = format!("http://127.0.0.1:{port}/callback");

    let waiter = tokio::spawn(async move {
        wait_for_callback(&redirect_uri, "expected", Duration::from_secs(5)).await
    });
    let response = send(
        port,
        "GET /callback?code=abc&state=<forged> HTTP/1.1\r\nHost: localhost\r\n\r\n",
    )
    .await;

    let error = waiter.await.expect("join").expect_err("state mismatch");
    assert!(matches!(error, AppError::Auth(_)));
    assert!(response.starts_with("HTTP/1.1 400 Bad Request"));
    assert!(!response.contains("<forged>"));
}

#[tokio::test]
async fn rejects_non_get_requests() {
    let port = free_port().await;
    let redirect_uri = format!("http://127.0.0.1:{port}/callback");

    let waiter = tokio::spawn(async move {
        wait_for_callback(&redirect_uri, "state-1", Duration::from_secs(5)).await
    });
    let response = send(
        port,
        "POST /callback?code=abc&state=state-1 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n",
    )
    .await;

    assert!(waiter.await.expect("join").is_err());
    assert!(response.starts_with("HTTP/1.1 405"));
}

#[tokio::test]
async fn requires_http_redirect() {
    let error = wait_for_callback(
        "https://127.0.0.1:8787/callback",
        "state",
        Duration::from_millis(10),
    )
    .await
    .expect_err("https is not served locally");
    assert!(matches!(error, AppError::Config(_)));
}

#[tokio::test]
async fn times_out_without_redirect() {
    let port = free_port().await;
    let error = wait_for_callback(
        &format!("http://127.0.0.1:{port}/callback"),
        "state",
        Duration::from_millis(50),
    )
    .await
    .expect_err("nobody calls back");
    assert!(error.to_string().contains("timed out"));
}
