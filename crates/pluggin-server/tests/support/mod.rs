// SPDX-License-Identifier: Apache-2.0
#![allow(dead_code)]

use pluggin_server::{build_router, AppState};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub async fn spawn_app(state: AppState) -> SocketAddr {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    addr
}

pub async fn http_request(addr: SocketAddr, raw: String) -> String {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    stream.write_all(raw.as_bytes()).await.expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    response
}

pub async fn get(addr: SocketAddr, path: &str) -> String {
    let raw = format!(
        "GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"
    );
    http_request(addr, raw).await
}

pub async fn get_auth(addr: SocketAddr, path: &str, token: &str) -> String {
    let raw = format!(
        "GET {path} HTTP/1.1\r\nHost: {addr}\r\nAuthorization: Bearer {token}\r\nConnection: close\r\n\r\n"
    );
    http_request(addr, raw).await
}

pub async fn post_json(addr: SocketAddr, path: &str, body: &str) -> String {
    let raw = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    http_request(addr, raw).await
}

pub async fn request_json_auth(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: &str,
    token: &str,
) -> String {
    let raw = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nAuthorization: Bearer {token}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    http_request(addr, raw).await
}

/// Body of a non-chunked HTTP/1.1 response as JSON.
pub fn json_body(response: &str) -> serde_json::Value {
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b)
        .unwrap_or_default();
    serde_json::from_str(body.trim()).unwrap_or_else(|e| panic!("invalid json body: {e}: {body}"))
}

pub fn status_line(response: &str) -> &str {
    response.lines().next().unwrap_or_default()
}

/// First run of exactly six consecutive ASCII digits, i.e. the login code
/// embedded in an email body.
pub fn extract_login_code(html: &str) -> String {
    let bytes = html.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if bytes[start].is_ascii_digit() {
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end - start == 6 {
                return html[start..end].to_string();
            }
            start = end;
        } else {
            start += 1;
        }
    }
    panic!("no 6-digit code found in email body: {html}");
}
