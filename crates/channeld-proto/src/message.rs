//! The tagged message model.
//!
//! A [`Message`] is built from one protocol line by [`Message::parse`] and
//! turned back into wire text by its [`Display`](std::fmt::Display)
//! implementation. Parsing is total: anything that does not match the grammar
//! of a supported command is kept verbatim as [`Message::Unknown`].

use std::fmt;

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Message {
    /// `PING :<token>`
    Ping {
        /// Opaque token echoed back in the PONG.
        token: String,
    },
    /// `PONG :<token>`
    Pong {
        /// Token from the PING being answered.
        token: String,
    },
    /// `NICK <name>`
    Nick {
        /// Requested nickname.
        name: String,
    },
    /// `USER <username> <hostname> * :<realname>`
    User {
        /// Username (ident).
        username: String,
        /// Real name (free text).
        realname: String,
        /// Second USER field. Clients usually send a mode or `0` here.
        hostname: String,
    },
    /// `PRIVMSG <target> :<text>`
    Private {
        /// Nick or channel name.
        target: String,
        /// Message body, may contain spaces.
        text: String,
    },
    /// `JOIN :<channel>`
    Join {
        /// Channel name (or comma-separated list of names).
        target: String,
    },
    /// `PART :<channel>`
    Part {
        /// Channel name (or comma-separated list of names).
        target: String,
    },
    /// `QUIT :<reason>`
    Quit {
        /// Free-text reason, possibly empty.
        reason: String,
    },
    /// `:<source> <code> <target> :<text>`
    Numeric {
        /// Server identity the reply originates from.
        source: String,
        /// Three-digit reply code.
        code: u16,
        /// Target parameters (the client nick, plus any extra middle params).
        target: String,
        /// Trailing text.
        text: String,
    },
    /// Anything else, kept verbatim.
    Unknown {
        /// The original line.
        raw: String,
    },
}

/// Strip a single leading `:` if present.
fn trailing(s: &str) -> &str {
    s.strip_prefix(':').unwrap_or(s)
}

/// Characters that cannot appear in a nickname.
fn is_valid_nick(nick: &str) -> bool {
    !nick.is_empty()
        && !nick.starts_with(['#', '&', '!', ':'])
        && !nick
            .chars()
            .any(|c| matches!(c, ' ' | ',' | '!' | '@' | '*' | '?') || c.is_control())
}

impl Message {
    /// Classify one line (without its terminator).
    ///
    /// Never fails: malformed or unsupported input yields [`Message::Unknown`]
    /// carrying the original line.
    pub fn parse(line: &str) -> Message {
        Self::parse_known(line).unwrap_or_else(|| Message::Unknown {
            raw: line.to_string(),
        })
    }

    fn parse_known(line: &str) -> Option<Message> {
        if line.starts_with(':') {
            return Self::parse_numeric(line);
        }

        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, Some(rest)),
            None => (line, None),
        };

        match command {
            "PING" => rest.map(|r| Message::Ping {
                token: trailing(r).to_string(),
            }),
            "PONG" => rest.map(|r| Message::Pong {
                token: trailing(r).to_string(),
            }),
            "NICK" => {
                let name = trailing(rest?);
                is_valid_nick(name).then(|| Message::Nick {
                    name: name.to_string(),
                })
            }
            "USER" => {
                let fields: Vec<&str> = line.splitn(5, ' ').collect();
                if fields.len() != 5 || fields[1].is_empty() {
                    return None;
                }
                Some(Message::User {
                    username: fields[1].to_string(),
                    hostname: fields[2].to_string(),
                    realname: trailing(fields[4]).to_string(),
                })
            }
            "PRIVMSG" => {
                let fields: Vec<&str> = line.splitn(3, ' ').collect();
                if fields.len() != 3 || fields[1].is_empty() {
                    return None;
                }
                Some(Message::Private {
                    target: fields[1].to_string(),
                    text: trailing(fields[2]).to_string(),
                })
            }
            "JOIN" | "PART" => {
                let target = trailing(rest?).split(' ').next().unwrap_or_default();
                if target.is_empty() {
                    return None;
                }
                let target = target.to_string();
                Some(if command == "JOIN" {
                    Message::Join { target }
                } else {
                    Message::Part { target }
                })
            }
            "QUIT" => Some(Message::Quit {
                reason: rest.map(trailing).unwrap_or_default().to_string(),
            }),
            _ => None,
        }
    }

    fn parse_numeric(line: &str) -> Option<Message> {
        let (source, rest) = line[1..].split_once(' ')?;
        let (code, rest) = rest.split_once(' ')?;
        if source.is_empty() || code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let (target, text) = rest.split_once(" :")?;
        if target.is_empty() {
            return None;
        }

        Some(Message::Numeric {
            source: source.to_string(),
            code: code.parse().ok()?,
            target: target.to_string(),
            text: text.to_string(),
        })
    }

    /// Build a numeric reply.
    pub fn numeric(
        source: impl Into<String>,
        code: u16,
        target: impl Into<String>,
        text: impl Into<String>,
    ) -> Message {
        Message::Numeric {
            source: source.into(),
            code,
            target: target.into(),
            text: text.into(),
        }
    }

    /// Serialize with a `:<source> ` prefix, as relayed on behalf of a user.
    pub fn from_source(&self, source: &str) -> String {
        format!(":{} {}", source, self)
    }

    /// The command name, for logging and metric labels.
    pub fn command_name(&self) -> &'static str {
        match self {
            Message::Ping { .. } => "PING",
            Message::Pong { .. } => "PONG",
            Message::Nick { .. } => "NICK",
            Message::User { .. } => "USER",
            Message::Private { .. } => "PRIVMSG",
            Message::Join { .. } => "JOIN",
            Message::Part { .. } => "PART",
            Message::Quit { .. } => "QUIT",
            Message::Numeric { .. } => "NUMERIC",
            Message::Unknown { .. } => "UNKNOWN",
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Ping { token } => write!(f, "PING :{}", token),
            Message::Pong { token } => write!(f, "PONG :{}", token),
            Message::Nick { name } => write!(f, "NICK {}", name),
            Message::User {
                username,
                realname,
                hostname,
            } => write!(f, "USER {} {} * :{}", username, hostname, realname),
            Message::Private { target, text } => write!(f, "PRIVMSG {} :{}", target, text),
            Message::Join { target } => write!(f, "JOIN :{}", target),
            Message::Part { target } => write!(f, "PART :{}", target),
            Message::Quit { reason } => write!(f, "QUIT :{}", reason),
            Message::Numeric {
                source,
                code,
                target,
                text,
            } => write!(f, ":{} {:03} {} :{}", source, code, target, text),
            Message::Unknown { raw } => f.write_str(raw),
        }
    }
}
