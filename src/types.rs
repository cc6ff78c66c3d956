//! Basic type definitions for the relay server
//!
//! Provides:
//! - `ClientId`: UUID-based identifier used for logging and removal matching
//! - `RelayMode`: the fan-out policy selected by the `-e` / `-b` flags

use uuid::Uuid;

/// Unique client identifier (newtype pattern)
///
/// Wraps a UUID v4 so that two connections never compare equal,
/// even when the OS reuses a socket descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the server does with a received chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayMode {
    /// Receive and log only; nothing is written back
    #[default]
    Disabled,
    /// Write the chunk back to its sender
    Echo,
    /// Write the chunk to every registered client, sender included
    Broadcast,
}

impl RelayMode {
    /// Resolve the mode from the command-line flags.
    ///
    /// Returns `None` for `-b` without `-e`, which is not a valid combination.
    pub fn from_flags(echo: bool, broadcast: bool) -> Option<Self> {
        match (echo, broadcast) {
            (false, true) => None,
            (true, true) => Some(Self::Broadcast),
            (true, false) => Some(Self::Echo),
            (false, false) => Some(Self::Disabled),
        }
    }

    /// Whether received chunks are handed to the dispatcher at all
    pub fn echoes(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl std::fmt::Display for RelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Disabled => "Receive only",
            Self::Echo => "Echo",
            Self::Broadcast => "Echo & Broadcast",
        };
        f.write_str(label)
    }
}
