use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown message type {0}")]
    UnknownMessageType(u8),
    #[error("reply declares {len} trailing bytes, limit is {max}")]
    ReplyTooLarge { len: usize, max: usize },
    #[error("{what} truncated: need {needed} bytes, got {got}")]
    Truncated {
        what: &'static str,
        needed: usize,
        got: usize,
    },
    #[error("{count} text items do not fit in one request, limit is {max}")]
    TooManyTextItems { count: usize, max: usize },
    #[error("request of {units} words does not fit the 16-bit length field")]
    RequestTooLarge { units: usize },
}
