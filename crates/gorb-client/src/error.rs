use std::fmt;

use gorb_token::TokenError;
use thiserror::Error;

use crate::confirm::TxStatus;

/// A program-level rejection as reported by the ledger. The payload is kept
/// verbatim so callers can inspect custom program error codes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramRejection {
    pub payload: serde_json::Value,
}

impl ProgramRejection {
    pub fn new(payload: serde_json::Value) -> Self {
        Self { payload }
    }

    /// Custom program error code, if the payload has the
    /// `{"InstructionError": [index, {"Custom": code}]}` shape.
    pub fn custom_code(&self) -> Option<u32> {
        self.payload
            .get("InstructionError")?
            .get(1)?
            .get("Custom")?
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
    }
}

impl fmt::Display for ProgramRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.payload)
    }
}

/// Errors returned by a [`crate::ledger::LedgerClient`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Network or RPC failure; the request may succeed if repeated.
    #[error("transport error: {0}")]
    Transport(String),

    /// The ledger executed or simulated the transaction and the program
    /// refused it.
    #[error("program rejected transaction: {0}")]
    Rejected(ProgramRejection),
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transport(_))
    }
}

/// Errors surfaced by the token flows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Submission failed; nothing reached the ledger and resending is safe.
    #[error("transaction was not sent: {0}")]
    NotSent(LedgerError),

    #[error("transaction {signature} failed: {rejection}")]
    Rejected {
        signature: String,
        rejection: ProgramRejection,
    },

    /// The outcome is unknown; query chain state before retrying.
    #[error("transaction {signature} not confirmed after {attempts} attempts")]
    TimedOut { signature: String, attempts: u32 },

    #[error("confirmation of {signature} cancelled; outcome unknown")]
    Cancelled { signature: String },

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid status transition {from:?} -> {to:?}")]
    InvalidTransition { from: TxStatus, to: TxStatus },
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorb_token::EncodingError;
    use serde_json::json;

    #[test]
    fn transport_is_transient() {
        assert!(LedgerError::Transport("connection reset".into()).is_transient());
        assert!(!LedgerError::Rejected(ProgramRejection::new(json!("AccountInUse"))).is_transient());
    }

    #[test]
    fn rejection_custom_code() {
        let rejection = ProgramRejection::new(json!({"InstructionError": [0, {"Custom": 1}]}));
        assert_eq!(rejection.custom_code(), Some(1));
        assert_eq!(rejection.to_string(), r#"{"InstructionError":[0,{"Custom":1}]}"#);

        let rejection = ProgramRejection::new(json!({"InstructionError": [0, "InvalidAccountData"]}));
        assert_eq!(rejection.custom_code(), None);
    }

    #[test]
    fn display_rejected() {
        let err = ClientError::Rejected {
            signature: "5abc".into(),
            rejection: ProgramRejection::new(json!("InsufficientFundsForRent")),
        };
        assert_eq!(
            err.to_string(),
            r#"transaction 5abc failed: "InsufficientFundsForRent""#
        );
    }

    #[test]
    fn display_timed_out() {
        let err = ClientError::TimedOut {
            signature: "5abc".into(),
            attempts: 30,
        };
        assert_eq!(err.to_string(), "transaction 5abc not confirmed after 30 attempts");
    }

    #[test]
    fn token_error_is_transparent() {
        let err = ClientError::from(TokenError::from(EncodingError::Overflow { field: "amount" }));
        assert_eq!(
            err.to_string(),
            "encoding error: amount does not fit in an unsigned 64-bit field"
        );
    }

    #[test]
    fn display_not_sent() {
        let err = ClientError::NotSent(LedgerError::Transport("timeout".into()));
        assert_eq!(err.to_string(), "transaction was not sent: transport error: timeout");
    }
}
