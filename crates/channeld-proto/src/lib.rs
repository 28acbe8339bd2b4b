//! # channeld-proto
//!
//! Parsing and serialization for the small IRC subset spoken by `channeld`.
//!
//! ## Features
//!
//! - A closed [`Message`] model covering PING, PONG, NICK, USER, PRIVMSG,
//!   JOIN, PART, QUIT, numeric replies, and everything else as `Unknown`
//! - Total parsing: [`Message::parse`] never fails
//! - Numeric reply constructors ([`Response`])
//! - RFC 1459 casemapping and channel name helpers
//! - Optional Tokio line codec ([`LineCodec`])
//!
//! ## Quick Start
//!
//! ```rust
//! use channeld_proto::Message;
//!
//! let msg = Message::parse("PRIVMSG #rust :hello there");
//! assert_eq!(
//!     msg,
//!     Message::Private { target: "#rust".into(), text: "hello there".into() }
//! );
//! assert_eq!(msg.to_string(), "PRIVMSG #rust :hello there");
//!
//! // Relay on behalf of a user
//! let relayed = msg.from_source("alice!alice@example.net");
//! assert_eq!(relayed, ":alice!alice@example.net PRIVMSG #rust :hello there");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod chan;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod response;

pub use self::casemap::{irc_eq, irc_to_lower};
pub use self::chan::ChannelExt;
pub use self::error::ProtocolError;
#[cfg(feature = "tokio")]
pub use self::line::{LineCodec, MAX_IRC_LINE_LEN};
pub use self::message::Message;
pub use self::response::Response;
