//
// Copyright 2017-2026 Honeytel Contributors. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! End-to-end tests driving a real `TelnetServer` over a real loopback
//! socket: option handshake, a full login + command round trip, and a
//! failed login that exhausts `max_auth_attempts`.

use honeytel_service::config::HoneypotConfig;
use honeytel_service::server::TelnetServer;
use honeytel_service::{HttpRetriever, LogSink, OutputRewriter, StaticCredentials};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const IAC: u8 = 255;
const WILL: u8 = 251;
const WONT: u8 = 252;
const DO: u8 = 253;
const DONT: u8 = 254;

fn test_config(dir: &std::path::Path, max_auth_attempts: usize) -> HoneypotConfig {
    HoneypotConfig {
        auth_username: Some("testuser".to_string()),
        auth_password: Some("testpass".to_string()),
        max_auth_attempts,
        listen_address: "127.0.0.1".to_string(),
        listen_port: 0,
        use_busybox: false,
        check_chroot: false,
        log_path: dir.join("honeytel.log"),
        samples_dir: dir.join("samples"),
        fake_hostname: "prodigy".to_string(),
        fake_architecture: "MIPS".to_string(),
        busybox_fake_banner: "BusyBox v1.18.4 (2012-04-17 18:58:31 CST)".to_string(),
        replacements: Vec::new(),
    }
}

async fn spawn_server(config: HoneypotConfig) -> std::net::SocketAddr {
    spawn_server_with(
        config,
        Arc::new(OutputRewriter::new()),
        Arc::from("Enter 'help' for a list of built-in commands.\n"),
    )
    .await
}

async fn spawn_server_with(
    config: HoneypotConfig,
    rewriter: Arc<OutputRewriter>,
    welcome: Arc<str>,
) -> std::net::SocketAddr {
    let server = TelnetServer::bind(
        Arc::new(config.clone()),
        rewriter,
        Arc::new(StaticCredentials::new(config.auth_username.clone(), config.auth_password.clone())),
        Arc::new(HttpRetriever::new()),
        Arc::new(LogSink::new(config.log_path.clone())),
        welcome,
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

/// Reads from `stream` in a loop until `pattern` appears in the accumulated
/// buffer or `budget` elapses, returning whatever was read.
async fn read_until(stream: &mut TcpStream, pattern: &[u8], budget: Duration) -> Vec<u8> {
    let mut acc = Vec::new();
    let deadline = tokio::time::Instant::now() + budget;
    loop {
        if acc.windows(pattern.len().max(1)).any(|w| w == pattern) {
            return acc;
        }
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return acc;
        }
        let mut buf = [0u8; 4096];
        match tokio::time::timeout(remaining, stream.read(&mut buf)).await {
            Ok(Ok(0)) => return acc,
            Ok(Ok(n)) => acc.extend_from_slice(&buf[..n]),
            _ => return acc,
        }
    }
}

#[tokio::test]
async fn option_handshake_is_sent_unsolicited_in_stable_order() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(test_config(dir.path(), 3)).await;
    let mut client = TcpStream::connect(addr).await.unwrap();

    let mut buf = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_millis(500), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        &buf[..n],
        &[
            IAC, WILL, 1, // ECHO
            IAC, WILL, 3, // SGA
            IAC, WONT, 39, // NEW-ENVIRON
            IAC, DONT, 1, // ECHO
            IAC, DO, 3, // SGA
            IAC, DONT, 31, // NAWS
            IAC, DO, 24, // TTYPE
            IAC, DONT, 34, // LINEMODE
            IAC, DO, 39, // NEW-ENVIRON
        ][..]
    );
}

#[tokio::test]
async fn successful_login_reaches_shell_prompt_and_runs_a_command() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(test_config(dir.path(), 3)).await;
    let mut client = TcpStream::connect(addr).await.unwrap();

    read_until(&mut client, b"Username: ", Duration::from_secs(2)).await;
    client.write_all(b"testuser\r\n").await.unwrap();

    read_until(&mut client, b"Password: ", Duration::from_secs(2)).await;
    client.write_all(b"testpass\r\n").await.unwrap();

    let after_login = read_until(&mut client, b"# ", Duration::from_secs(2)).await;
    assert!(after_login.windows(4).any(|w| w == b"help"));

    client.write_all(b"echo marker_value\r\n").await.unwrap();
    let output = read_until(&mut client, b"marker_value", Duration::from_secs(2)).await;
    assert!(output.windows(b"marker_value".len()).any(|w| w == b"marker_value"));
}

#[tokio::test]
async fn failed_login_exhausts_attempts_and_closes_connection() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(test_config(dir.path(), 1)).await;
    let mut client = TcpStream::connect(addr).await.unwrap();

    read_until(&mut client, b"Username: ", Duration::from_secs(2)).await;
    client.write_all(b"testuser\r\n").await.unwrap();

    read_until(&mut client, b"Password: ", Duration::from_secs(2)).await;
    client.write_all(b"wrongpass\r\n").await.unwrap();

    let mut buf = [0u8; 16];
    let result = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf)).await;
    match result {
        Ok(Ok(0)) => {}
        Ok(Err(_)) => {}
        other => panic!("expected connection to close after exhausting attempts, got {other:?}"),
    }

    let log = std::fs::read_to_string(dir.path().join("honeytel.log")).unwrap();
    assert!(log.contains("AUTH: testuser:wrongpass"));
}

#[tokio::test]
async fn welcome_banner_is_rewritten_before_it_reaches_the_client() {
    let dir = tempfile::tempdir().unwrap();
    let real_banner = "BusyBox v1.22.1 (Debian 1:1.22.0-9+deb8u1)";
    let fake_banner = "BusyBox v1.18.4 (2012-04-17 18:58:31 CST)";
    let mut rewriter = OutputRewriter::new();
    rewriter.push(real_banner, fake_banner);
    let welcome: Arc<str> =
        Arc::from(format!("{real_banner} built-in shell (ash)\nEnter 'help' for a list of built-in commands.\n"));

    let addr = spawn_server_with(test_config(dir.path(), 3), Arc::new(rewriter), welcome).await;
    let mut client = TcpStream::connect(addr).await.unwrap();

    read_until(&mut client, b"Username: ", Duration::from_secs(2)).await;
    client.write_all(b"testuser\r\n").await.unwrap();
    read_until(&mut client, b"Password: ", Duration::from_secs(2)).await;
    client.write_all(b"testpass\r\n").await.unwrap();

    let after_login = read_until(&mut client, b"# ", Duration::from_secs(2)).await;
    assert!(
        after_login.windows(fake_banner.len()).any(|w| w == fake_banner.as_bytes()),
        "expected fake banner in welcome, got {:?}",
        String::from_utf8_lossy(&after_login)
    );
    assert!(!after_login.windows(real_banner.len()).any(|w| w == real_banner.as_bytes()));
}

#[tokio::test]
async fn peer_confirming_an_offered_option_gets_no_redundant_reply() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(test_config(dir.path(), 3)).await;
    let mut client = TcpStream::connect(addr).await.unwrap();

    // Drain the unsolicited handshake.
    let mut buf = [0u8; 64];
    tokio::time::timeout(Duration::from_millis(500), client.read(&mut buf)).await.unwrap().unwrap();

    // Peer confirms exactly what we already offered: DO ECHO (we sent WILL
    // ECHO) and WILL SGA (we sent DO SGA). Neither should provoke a reply,
    // since our recorded state already matches.
    client.write_all(&[IAC, DO, 1, IAC, WILL, 3]).await.unwrap();

    let mut probe = [0u8; 16];
    let result = tokio::time::timeout(Duration::from_millis(300), client.read(&mut probe)).await;
    assert!(result.is_err(), "expected no redundant reply, got {result:?}");
}
