//! Network-layer error types.

/// Errors that can occur in the wire layer.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to encode a message to JSON.
    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),

    /// Failed to decode a message from JSON.
    #[error("failed to decode message: {0}")]
    Decode(serde_json::Error),

    /// The envelope carried an action discriminant this version does not
    /// recognise. Callers ignore these for forward compatibility.
    #[error("unknown action kind: {0}")]
    UnknownAction(String),

    /// The envelope tag was not one this peer understands.
    #[error("unknown envelope tag: {0}")]
    UnknownEnvelope(String),

    /// An incoming frame exceeded the frame size limit.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Declared frame length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Socket read/write failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection mid-frame.
    #[error("connection closed mid-frame")]
    ConnectionClosed,
}

impl NetError {
    /// Returns `true` for errors that policy says should be ignored with a
    /// diagnostic rather than treated as a broken connection.
    #[must_use]
    pub fn is_ignorable(&self) -> bool {
        matches!(
            self,
            NetError::UnknownAction(_) | NetError::UnknownEnvelope(_)
        )
    }
}
