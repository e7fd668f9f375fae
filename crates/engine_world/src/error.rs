//! Scene codec error types.

/// Errors raised while encoding or decoding serialized entity blocks.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// The buffer ended before a field could be read.
    #[error("truncated entity data: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the next field needs.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// An entity or component type name was not valid UTF-8.
    #[error("name is not valid UTF-8")]
    InvalidName(#[from] std::str::Utf8Error),

    /// A length field does not fit this platform or the format's width.
    #[error("length {0} does not fit the serialized format")]
    LengthOverflow(u64),

    /// The world refused to insert a decoded entity (its handle is already
    /// live, or the parent it should attach to is gone).
    #[error("entity `{0}` could not be inserted")]
    EntityRejected(String),

    /// A component payload could not be encoded.
    #[error("failed to encode component payload: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}
