use std::io;

use thiserror::Error;

/// Errors produced while encoding, decoding, or resolving DNS messages.
#[derive(Debug, Error)]
pub enum DnsError {
    /// The frame is shorter than the fixed 12-byte header.
    #[error("frame too short for the 12-byte DNS header")]
    MalformedHeader,

    /// A field or rdata read ran past the end of the frame.
    #[error("field extends past the end of the frame")]
    TruncatedFrame,

    /// A compression pointer referenced an offset with no recorded label.
    #[error("compression pointer targets offset {0} where no label was recorded")]
    InvalidLabelReference(usize),

    /// A single label exceeded the 63-byte wire limit.
    #[error("label `{0}` exceeds 63 bytes")]
    LabelTooLong(String),

    /// The encoded name exceeded the 255-byte wire limit.
    #[error("encoded name is {0} bytes, limit is 255")]
    NameTooLong(usize),

    /// A label contained bytes that are not valid UTF-8.
    #[error("label contains invalid UTF-8")]
    InvalidLabel,

    /// Sending to or receiving from the upstream resolver failed.
    #[error("upstream exchange failed: {0}")]
    Forwarding(#[from] io::Error),

    /// The upstream resolver address did not parse as IPv4 `host[:port]`.
    #[error("invalid resolver address `{0}`")]
    InvalidResolverAddress(String),
}
