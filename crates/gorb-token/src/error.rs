use thiserror::Error;

/// Caller input that cannot be expressed in the program's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("{field} does not fit in an unsigned 64-bit field")]
    Overflow { field: &'static str },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown opcode: {0}")]
    UnknownOpcode(u8),

    #[error("{opcode} expects {expected} bytes, got {actual}")]
    LengthMismatch {
        opcode: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised by the synchronous token primitives.
///
/// None of these are transient: retrying the same call with the same input
/// fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("malformed account: {0}")]
    MalformedAccount(String),

    #[error("no off-curve address found in the bump seed space")]
    DerivationExhausted,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TokenError {
    pub(crate) fn invalid_parameter(msg: impl Into<String>) -> Self {
        TokenError::Encoding(EncodingError::InvalidParameter(msg.into()))
    }
}
