//! Async client for a token program deployment.
//!
//! Wraps the pure primitives of `gorb-token` with a ledger seam
//! ([`LedgerClient`]), an injectable [`Clock`], a submit-and-confirm engine
//! and high-level token flows on [`TokenClient`].

pub mod clock;
pub mod config;
pub mod confirm;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod token;

pub use clock::{Clock, ManualClock, TokioClock};
pub use config::ClientConfig;
pub use confirm::{
    Backoff, CancelFlag, ConfirmationConfig, ConfirmationEngine, Disposition, PendingTransaction,
    TxStatus,
};
pub use error::{ClientError, LedgerError, ProgramRejection};
pub use ledger::{AccountInfo, Commitment, LedgerClient, Signature, SignatureStatus};
pub use logging::init_logging;
pub use token::TokenClient;
