use super::helpers::{NAMES_LINE_BUDGET, names_replies};
use super::*;
use crate::network::{ConnectionHandle, ConnectionId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;

struct Peer {
    member: Member,
    rx: mpsc::Receiver<Arc<str>>,
}

impl Peer {
    fn new(id: ConnectionId, nick: &str) -> Self {
        let (handle, rx) = ConnectionHandle::new(id, "127.0.0.1:7000".parse().unwrap(), 64);
        Self {
            member: Member {
                id,
                nick: nick.to_string(),
                hostmask: format!("{nick}!{nick}@host"),
                handle,
            },
            rx,
        }
    }

    async fn recv(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for line")
            .expect("mailbox closed")
            .to_string()
    }

    /// Skip lines until one contains `needle`.
    async fn recv_until(&mut self, needle: &str) -> String {
        loop {
            let line = self.recv().await;
            if line.contains(needle) {
                return line;
            }
        }
    }

    fn assert_idle(&mut self) {
        assert!(self.rx.try_recv().is_err(), "unexpected pending line");
    }
}

fn spawn(name: &str) -> mpsc::Sender<ChannelEvent> {
    ChannelActor::spawn(name.to_string(), Arc::from("irc.test"), 64)
}

fn delivery(conn: ConnectionId) -> DeliverySet {
    Arc::new(Mutex::new(HashSet::from([conn])))
}

#[tokio::test]
async fn joiner_gets_echo_and_names() {
    let tx = spawn("#test");
    let mut alice = Peer::new(1, "alice");

    tx.send(ChannelEvent::Join {
        member: alice.member.clone(),
    })
    .await
    .unwrap();

    assert_eq!(alice.recv().await, ":alice!alice@host JOIN :#test");
    assert_eq!(alice.recv().await, ":irc.test 353 alice = #test :alice");
    assert_eq!(
        alice.recv().await,
        ":irc.test 366 alice #test :End of /NAMES list"
    );
}

#[tokio::test]
async fn existing_members_see_join_and_names_keep_order() {
    let tx = spawn("#test");
    let mut alice = Peer::new(1, "alice");
    let mut bob = Peer::new(2, "bob");

    for member in [alice.member.clone(), bob.member.clone()] {
        tx.send(ChannelEvent::Join { member }).await.unwrap();
    }

    assert_eq!(
        alice.recv_until("JOIN").await,
        ":alice!alice@host JOIN :#test"
    );
    assert_eq!(alice.recv_until("bob").await, ":bob!bob@host JOIN :#test");
    assert_eq!(
        bob.recv_until(" 353 ").await,
        ":irc.test 353 bob = #test :alice bob"
    );
}

#[tokio::test]
async fn part_echoes_to_leaver_and_remaining() {
    let tx = spawn("#test");
    let mut alice = Peer::new(1, "alice");
    let mut bob = Peer::new(2, "bob");

    for member in [alice.member.clone(), bob.member.clone()] {
        tx.send(ChannelEvent::Join { member }).await.unwrap();
    }
    tx.send(ChannelEvent::Part { conn: 2 }).await.unwrap();

    assert_eq!(alice.recv_until("PART").await, ":bob!bob@host PART :#test");
    assert_eq!(bob.recv_until("PART").await, ":bob!bob@host PART :#test");
}

#[tokio::test]
async fn message_skips_sender() {
    let tx = spawn("#test");
    let mut alice = Peer::new(1, "alice");
    let mut bob = Peer::new(2, "bob");

    for member in [alice.member.clone(), bob.member.clone()] {
        tx.send(ChannelEvent::Join { member }).await.unwrap();
    }
    tx.send(ChannelEvent::Message {
        conn: 2,
        line: Arc::from(":bob!bob@host PRIVMSG #test :hi"),
    })
    .await
    .unwrap();

    assert_eq!(
        alice.recv_until("PRIVMSG").await,
        ":bob!bob@host PRIVMSG #test :hi"
    );

    // Bob's queue ends with the 366 from his join.
    bob.recv_until(" 366 ").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    bob.assert_idle();
}

#[tokio::test]
async fn quit_notice_is_delivered_once_across_channels() {
    let first = spawn("#one");
    let second = spawn("#two");
    let mut alice = Peer::new(1, "alice");
    let bob = Peer::new(2, "bob");

    for tx in [&first, &second] {
        for member in [alice.member.clone(), bob.member.clone()] {
            tx.send(ChannelEvent::Join { member }).await.unwrap();
        }
    }

    let line: Arc<str> = Arc::from(":bob!bob@host QUIT :Leaving");
    let delivered = delivery(2);
    for tx in [&first, &second] {
        tx.send(ChannelEvent::Quit {
            conn: 2,
            line: line.clone(),
            delivered: delivered.clone(),
        })
        .await
        .unwrap();
    }

    // Marker after the QUIT in the second channel.
    let carol = Peer::new(3, "carol");
    second
        .send(ChannelEvent::Join {
            member: carol.member.clone(),
        })
        .await
        .unwrap();

    let mut quits = 0;
    loop {
        let line = alice.recv().await;
        if line.contains("QUIT") {
            quits += 1;
        }
        if line.contains("carol") {
            break;
        }
    }
    assert_eq!(quits, 1);
}

#[tokio::test]
async fn nick_change_updates_names() {
    let tx = spawn("#test");
    let mut alice = Peer::new(1, "alice");
    let mut bob = Peer::new(2, "bob");

    for member in [alice.member.clone(), bob.member.clone()] {
        tx.send(ChannelEvent::Join { member }).await.unwrap();
    }
    tx.send(ChannelEvent::NickChange {
        conn: 2,
        nick: "robert".into(),
        hostmask: "robert!bob@host".into(),
        line: Arc::from(":bob!bob@host NICK robert"),
        delivered: delivery(2),
    })
    .await
    .unwrap();

    assert_eq!(
        alice.recv_until("NICK").await,
        ":bob!bob@host NICK robert"
    );

    let carol = Peer::new(3, "carol");
    let mut carol_rx = carol.rx;
    tx.send(ChannelEvent::Join {
        member: carol.member,
    })
    .await
    .unwrap();
    let mut names = None;
    while names.is_none() {
        let line = tokio::time::timeout(Duration::from_secs(2), carol_rx.recv())
            .await
            .unwrap()
            .unwrap();
        if line.contains(" 353 ") {
            names = Some(line.to_string());
        }
    }
    assert_eq!(
        names.unwrap(),
        ":irc.test 353 carol = #test :alice robert carol"
    );
}

#[tokio::test]
async fn actor_stops_when_empty() {
    let tx = spawn("#test");
    let alice = Peer::new(1, "alice");

    tx.send(ChannelEvent::Join {
        member: alice.member.clone(),
    })
    .await
    .unwrap();
    tx.send(ChannelEvent::Part { conn: 1 }).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), tx.closed())
        .await
        .expect("actor did not stop");
}

#[test]
fn names_fit_one_line_when_short() {
    let replies = names_replies("irc.test", "alice", "#test", ["alice", "bob"]);
    assert_eq!(replies.len(), 2);
    assert_eq!(
        replies[0].to_string(),
        ":irc.test 353 alice = #test :alice bob"
    );
    assert_eq!(
        replies[1].to_string(),
        ":irc.test 366 alice #test :End of /NAMES list"
    );
}

#[test]
fn names_paginate_within_budget() {
    let nicks: Vec<String> = (0..40).map(|i| format!("member_with_long_nick_{i:02}")).collect();
    let replies = names_replies("irc.test", "joiner", "#big", nicks.iter().map(String::as_str));

    let (names, end) = replies.split_at(replies.len() - 1);
    assert!(names.len() > 1, "expected pagination");
    assert!(end[0].to_string().contains(" 366 "));

    let mut seen = Vec::new();
    for reply in names {
        let line = reply.to_string();
        assert!(line.len() <= NAMES_LINE_BUDGET, "{} > budget", line.len());
        let (_, list) = line.split_once(" :").unwrap();
        seen.extend(list.split(' ').map(str::to_string));
    }
    assert_eq!(seen, nicks);
}

#[test]
fn names_fit_at_default_name_limits() {
    let limits = crate::config::LimitsConfig::default();
    let client = "c".repeat(limits.max_nick_len);
    let channel = format!("#{}", "x".repeat(limits.max_channel_len - 1));
    let nicks: Vec<String> = (0..60)
        .map(|i| format!("{i:02}{}", "n".repeat(limits.max_nick_len - 2)))
        .collect();

    let replies = names_replies(
        "irc.example.net",
        &client,
        &channel,
        nicks.iter().map(String::as_str),
    );
    for reply in &replies[..replies.len() - 1] {
        let line = reply.to_string();
        assert!(line.len() <= NAMES_LINE_BUDGET, "353 line is {} bytes", line.len());
    }
}

#[test]
fn empty_channel_names_is_just_terminator() {
    let replies = names_replies("irc.test", "alice", "#test", std::iter::empty());
    assert_eq!(replies.len(), 1);
    assert!(replies[0].to_string().contains(" 366 "));
}
