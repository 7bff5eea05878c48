//! WebSocket close codes.
//!
//! Only two codes mean "the closure was intentional": normal closure (1000)
//! and going-away (1001). Everything else, including the synthetic 1006 used
//! when a connection dies without a close frame, is abnormal and feeds the
//! reconnect policy.

use std::fmt;

/// A WebSocket close code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// Normal closure. Sent by this client on teardown.
    pub const NORMAL: Self = Self(1000);

    /// Endpoint is going away (server shutdown, page navigation).
    pub const GOING_AWAY: Self = Self(1001);

    /// Connection dropped without a close frame.
    pub const ABNORMAL: Self = Self(1006);

    /// Raw numeric code.
    pub fn code(self) -> u16 {
        self.0
    }

    /// Intentional closures never trigger a reconnect.
    pub fn is_intentional(self) -> bool {
        self == Self::NORMAL || self == Self::GOING_AWAY
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
