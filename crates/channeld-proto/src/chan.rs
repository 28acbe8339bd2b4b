//! Channel name utilities.

/// Extension trait for deciding whether a target names a channel.
pub trait ChannelExt {
    /// Check if this string is a channel name.
    ///
    /// Channel names:
    /// - Start with '#', '&', or '!'
    /// - Are longer than the prefix alone
    /// - Do not contain space, comma, BEL (0x07), NUL, or other control characters
    /// - Are at most 50 characters long
    fn is_channel_name(&self) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name(&self) -> bool {
        let mut chars = self.chars();

        match chars.next() {
            Some('#' | '&' | '!') => {}
            _ => return false,
        }

        let len = self.chars().count();
        if len < 2 || len > 50 {
            return false;
        }

        chars.all(|c| c != ' ' && c != ',' && !c.is_control())
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }
}
