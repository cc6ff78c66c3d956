//! Relayed payload
//!
//! The protocol has no framing: a `Chunk` is exactly the bytes one read
//! returned, relayed unchanged. It is reference counted so a broadcast can
//! hand the same payload to every recipient without copying.

use std::sync::Arc;

/// Size of the per-connection read buffer
pub const READ_BUFFER_SIZE: usize = 1024;

/// One read's worth of bytes from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk(Arc<[u8]>);

impl Chunk {
    /// Raw bytes, exactly as received
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lossy UTF-8 rendering for the operator log, without the trailing newline
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.0)
            .trim_end_matches(['\r', '\n'])
            .to_string()
    }
}

impl From<&[u8]> for Chunk {
    fn from(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Arc::from(bytes))
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Self::from(text.as_bytes())
    }
}
