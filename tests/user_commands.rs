//! Integration tests for direct messages, renames, and error replies.

mod common;

use common::{TestClient, TestServer};
use std::time::Duration;

#[tokio::test]
async fn test_private_message_delivery() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = TestClient::registered(server.addr(), "alice").await.unwrap();
    let mut bob = TestClient::registered(server.addr(), "bob").await.unwrap();

    alice.send_raw("PRIVMSG Bob :hello there").await.unwrap();
    assert_eq!(
        bob.recv().await.unwrap(),
        ":alice!alice@127.0.0.1 PRIVMSG Bob :hello there"
    );
    alice
        .expect_silence(Duration::from_millis(200))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_nick_gets_401() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = TestClient::registered(server.addr(), "alice").await.unwrap();

    alice.send_raw("PRIVMSG ghost :anyone?").await.unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        ":test.server 401 alice ghost :No such nick/channel"
    );
}

#[tokio::test]
async fn test_channel_errors() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = TestClient::registered(server.addr(), "alice").await.unwrap();
    let mut bob = TestClient::registered(server.addr(), "bob").await.unwrap();

    alice.send_raw("JOIN lobby").await.unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        ":test.server 403 alice lobby :No such channel"
    );

    alice.send_raw("PART #nowhere").await.unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        ":test.server 403 alice #nowhere :No such channel"
    );

    alice.send_raw("PRIVMSG #nowhere :hi").await.unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        ":test.server 403 alice #nowhere :No such channel"
    );

    bob.join("#bob").await.unwrap();
    alice.send_raw("PART #bob").await.unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        ":test.server 442 alice #bob :You're not on that channel"
    );
}

#[tokio::test]
async fn test_join_list_and_duplicate_join() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = TestClient::registered(server.addr(), "alice").await.unwrap();

    alice.send_raw("JOIN #a,#b").await.unwrap();
    alice.expect(" 366 alice #a ").await.unwrap();
    alice.expect(" 366 alice #b ").await.unwrap();

    // Already a member: no second echo.
    alice.send_raw("JOIN #A").await.unwrap();
    alice
        .expect_silence(Duration::from_millis(200))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_nick_change_rules() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = TestClient::registered(server.addr(), "alice").await.unwrap();
    let _bob = TestClient::registered(server.addr(), "bob").await.unwrap();

    alice.send_raw("NICK BOB").await.unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        ":test.server 433 alice BOB :Nickname is already in use."
    );

    // Case-only change of one's own nick is allowed.
    alice.send_raw("NICK Alice").await.unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        ":alice!alice@127.0.0.1 NICK Alice"
    );

    // Old nick stays reserved under its new casing.
    let mut other = TestClient::connect(server.addr(), "ALICE").await.unwrap();
    let lines = other.register_once().await.unwrap();
    assert!(lines.last().unwrap().contains(" 433 "));
}

#[tokio::test]
async fn test_overlong_nick_gets_432_and_may_retry() {
    let server = TestServer::spawn().await.unwrap();
    let long = "n".repeat(480);

    let mut client = TestClient::connect(server.addr(), "shorter").await.unwrap();
    client.send_raw(&format!("NICK {long}")).await.unwrap();
    client.send_raw("USER shorter 0 * :Shorter").await.unwrap();
    assert_eq!(
        client.expect(" 432 ").await.unwrap(),
        format!(":test.server 432 * {long} :Erroneous nickname")
    );

    client.send_raw("NICK shorter").await.unwrap();
    client.expect("PING :12345").await.unwrap();

    client.send_raw(&format!("NICK {long}")).await.unwrap();
    assert_eq!(
        client.recv().await.unwrap(),
        format!(":test.server 432 shorter {long} :Erroneous nickname")
    );
}

#[tokio::test]
async fn test_unknown_commands_are_ignored() {
    let server = TestServer::spawn().await.unwrap();
    let mut alice = TestClient::registered(server.addr(), "alice").await.unwrap();

    alice.send_raw("WHOIS bob").await.unwrap();
    alice.send_raw("privmsg #x :lowercase").await.unwrap();
    alice.send_raw("PING :still-alive").await.unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        ":test.server PONG :still-alive"
    );
}
