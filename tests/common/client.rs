//! Test chat client.
//!
//! Sends raw lines and asserts on the raw lines received back.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A test client speaking raw lines.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    nick: String,
}

#[allow(dead_code)]
impl TestClient {
    /// Connect to a test server.
    pub async fn connect(addr: SocketAddr, nick: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            nick: nick.to_string(),
        })
    }

    /// Connect and complete registration.
    pub async fn registered(addr: SocketAddr, nick: &str) -> anyhow::Result<Self> {
        let mut client = Self::connect(addr, nick).await?;
        client.register().await?;
        Ok(client)
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Send a raw line; CRLF is appended.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one line, without its terminator.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(RECV_TIMEOUT).await
    }

    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Receive lines until `predicate` matches; returns all of them.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await?;
            let done = predicate(&line);
            lines.push(line);
            if done {
                return Ok(lines);
            }
        }
    }

    /// Receive lines until one contains `needle`; returns that line.
    pub async fn expect(&mut self, needle: &str) -> anyhow::Result<String> {
        let mut lines = self.recv_until(|line| line.contains(needle)).await?;
        Ok(lines.pop().unwrap_or_default())
    }

    /// Send NICK and USER; wait for the PING that ends the welcome.
    pub async fn register(&mut self) -> anyhow::Result<Vec<String>> {
        let nick = self.nick.clone();
        self.send_raw(&format!("NICK {nick}")).await?;
        self.send_raw(&format!("USER {nick} 0 * :Test User {nick}")).await?;
        self.recv_until(|line| line == "PING :12345").await
    }

    /// One registration attempt: returns the welcome, or stops at a 433.
    pub async fn register_once(&mut self) -> anyhow::Result<Vec<String>> {
        let nick = self.nick.clone();
        self.send_raw(&format!("NICK {nick}")).await?;
        self.send_raw(&format!("USER {nick} 0 * :{nick}")).await?;
        self.recv_until(|line| line == "PING :12345" || line.contains(" 433 "))
            .await
    }

    /// Join a channel and wait for the end of its name list.
    pub async fn join(&mut self, channel: &str) -> anyhow::Result<Vec<String>> {
        self.send_raw(&format!("JOIN {channel}")).await?;
        self.recv_until(|line| line.contains(" 366 ")).await
    }

    /// Assert nothing arrives within `dur`.
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        match self.recv_timeout(dur).await {
            Ok(line) => anyhow::bail!("unexpected line: {line}"),
            Err(e) if e.is::<tokio::time::error::Elapsed>() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Drain until the server closes the connection.
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        loop {
            let mut line = String::new();
            match timeout(RECV_TIMEOUT, self.reader.read_line(&mut line)).await? {
                Ok(0) | Err(_) => return Ok(()),
                Ok(_) => continue,
            }
        }
    }
}
