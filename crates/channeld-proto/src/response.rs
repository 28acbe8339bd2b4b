//! Numeric reply codes and their constructors.
//!
//! Only the numerics `channeld` actually emits are modelled. Each constructor
//! returns a [`Message::Numeric`] stamped with the sending server's name.

#![allow(non_camel_case_types)]

use crate::message::Message;

/// IRC server response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Response {
    /// 353 - Names list
    RPL_NAMREPLY = 353,
    /// 366 - End of names list
    RPL_ENDOFNAMES = 366,
    /// 372 - MOTD line
    RPL_MOTD = 372,
    /// 375 - Start of MOTD
    RPL_MOTDSTART = 375,
    /// 376 - End of MOTD
    RPL_ENDOFMOTD = 376,
    /// 401 - No such nick/channel
    ERR_NOSUCHNICK = 401,
    /// 403 - No such channel
    ERR_NOSUCHCHANNEL = 403,
    /// 432 - Erroneous nickname
    ERR_ERRONEUSNICKNAME = 432,
    /// 433 - Nickname in use
    ERR_NICKNAMEINUSE = 433,
    /// 442 - Not on channel
    ERR_NOTONCHANNEL = 442,
}

macro_rules! impl_err {
    (
        $(#[$meta:meta])*
        $name:ident, $resp:ident, $arg:ident, $msg:literal
    ) => {
        $(#[$meta])*
        pub fn $name(server: &str, client: &str, $arg: &str) -> Message {
            Message::numeric(
                server,
                Response::$resp.code(),
                format!("{} {}", client, $arg),
                $msg,
            )
        }
    };
}

impl Response {
    /// Numeric value of this response.
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    impl_err!(
        /// `433 <client> <nick> :Nickname is already in use.`
        ///
        /// `client` is `*` while the connection is still registering.
        err_nicknameinuse, ERR_NICKNAMEINUSE, nick, "Nickname is already in use."
    );
    impl_err!(
        /// `432 <client> <nick> :Erroneous nickname`
        err_erroneusnickname, ERR_ERRONEUSNICKNAME, nick, "Erroneous nickname"
    );
    impl_err!(
        /// `401 <client> <nick> :No such nick/channel`
        err_nosuchnick, ERR_NOSUCHNICK, nick, "No such nick/channel"
    );
    impl_err!(
        /// `403 <client> <channel> :No such channel`
        err_nosuchchannel, ERR_NOSUCHCHANNEL, channel, "No such channel"
    );
    impl_err!(
        /// `442 <client> <channel> :You're not on that channel`
        err_notonchannel, ERR_NOTONCHANNEL, channel, "You're not on that channel"
    );

    /// `353 <client> = <channel> :<names>`
    pub fn rpl_namreply(server: &str, client: &str, channel: &str, names: &str) -> Message {
        Message::numeric(
            server,
            Response::RPL_NAMREPLY.code(),
            format!("{} = {}", client, channel),
            names,
        )
    }

    /// `366 <client> <channel> :End of /NAMES list`
    pub fn rpl_endofnames(server: &str, client: &str, channel: &str) -> Message {
        Message::numeric(
            server,
            Response::RPL_ENDOFNAMES.code(),
            format!("{} {}", client, channel),
            "End of /NAMES list",
        )
    }

    /// `375 <client> :- <server> Message of the day - `
    pub fn rpl_motdstart(server: &str, client: &str) -> Message {
        Message::numeric(
            server,
            Response::RPL_MOTDSTART.code(),
            client,
            format!("- {} Message of the day - ", server),
        )
    }

    /// `372 <client> :- <line>`
    pub fn rpl_motd(server: &str, client: &str, line: &str) -> Message {
        Message::numeric(
            server,
            Response::RPL_MOTD.code(),
            client,
            format!("- {}", line),
        )
    }

    /// `376 <client> :End of /MOTD command.`
    pub fn rpl_endofmotd(server: &str, client: &str) -> Message {
        Message::numeric(
            server,
            Response::RPL_ENDOFMOTD.code(),
            client,
            "End of /MOTD command.",
        )
    }
}
