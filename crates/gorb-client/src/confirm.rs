//! Submit-and-confirm engine.
//!
//! A signed transaction is submitted once, then its status is polled until
//! it reaches a terminal state or the attempt budget runs out:
//!
//! ```text
//! Submitted -> Processing -> Confirmed
//!     |            |      -> Failed     (program error, never retried)
//!     |            |      -> TimedOut   (budget exhausted, outcome unknown)
//!     +------------+      -> Cancelled  (caller gave up, outcome unknown)
//! ```
//!
//! With a fixed backoff, attempt `k` (1-based) polls at `(k - 1) * interval`
//! and `TimedOut` is returned at `max_attempts * interval`. Transport errors
//! while polling spend attempts from the same budget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{ClientError, LedgerError, ProgramRejection};
use crate::ledger::{Commitment, LedgerClient, Signature};

/// Delay between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Always the poll interval.
    #[default]
    Fixed,
    /// Poll interval doubling after each attempt, capped at `max`.
    Exponential { max: Duration },
}

impl Backoff {
    /// Delay after the 1-based `attempt`.
    pub fn delay(&self, interval: Duration, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed => interval,
            Backoff::Exponential { max } => {
                let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                interval.saturating_mul(factor).min(max)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    /// Lowest commitment that counts as confirmed.
    pub commitment: Commitment,
    pub backoff: Backoff,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_attempts: 30,
            commitment: Commitment::Confirmed,
            backoff: Backoff::Fixed,
        }
    }
}

/// Shared cancellation flag, checked between polling attempts.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Pending transaction state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Submitted,
    Processing,
    Confirmed,
    Failed,
    TimedOut,
    Cancelled,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TxStatus::Submitted | TxStatus::Processing)
    }
}

/// A submitted transaction being tracked to a terminal status.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub signature: Signature,
    status: TxStatus,
    /// Clock reading at submission.
    pub submitted_at: Duration,
    /// Status queries made so far.
    pub attempts: u32,
}

impl PendingTransaction {
    pub fn new(signature: Signature, submitted_at: Duration) -> Self {
        Self {
            signature,
            status: TxStatus::Submitted,
            submitted_at,
            attempts: 0,
        }
    }

    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// Move to `next`. Terminal statuses never change and nothing returns
    /// to `Submitted`.
    pub fn advance(&mut self, next: TxStatus) -> Result<(), ClientError> {
        let allowed = match (self.status, next) {
            (from, _) if from.is_terminal() => false,
            (_, TxStatus::Submitted) => false,
            _ => true,
        };

        if !allowed {
            return Err(ClientError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Disposition
// ---------------------------------------------------------------------------

/// Terminal outcome of a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Submission failed; the transaction never reached the ledger.
    NotSent { error: LedgerError },
    Confirmed {
        signature: Signature,
        commitment: Commitment,
        attempts: u32,
        elapsed: Duration,
    },
    Failed {
        signature: Signature,
        rejection: ProgramRejection,
        attempts: u32,
    },
    /// Budget exhausted. The transaction may still land.
    TimedOut {
        signature: Signature,
        attempts: u32,
        elapsed: Duration,
    },
    /// The cancel flag was observed. The transaction may still land.
    Cancelled { signature: Signature, attempts: u32 },
}

impl Disposition {
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Disposition::NotSent { .. } => None,
            Disposition::Confirmed { signature, .. }
            | Disposition::Failed { signature, .. }
            | Disposition::TimedOut { signature, .. }
            | Disposition::Cancelled { signature, .. } => Some(signature),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Disposition::Confirmed { .. })
    }

    pub fn into_result(self) -> Result<Signature, ClientError> {
        match self {
            Disposition::Confirmed { signature, .. } => Ok(signature),
            Disposition::NotSent { error } => Err(ClientError::NotSent(error)),
            Disposition::Failed {
                signature,
                rejection,
                ..
            } => Err(ClientError::Rejected {
                signature: signature.0,
                rejection,
            }),
            Disposition::TimedOut {
                signature,
                attempts,
                ..
            } => Err(ClientError::TimedOut {
                signature: signature.0,
                attempts,
            }),
            Disposition::Cancelled { signature, .. } => Err(ClientError::Cancelled {
                signature: signature.0,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Polls one ledger for transaction outcomes. Each call is an independent
/// loop; many may run concurrently over the same ledger.
pub struct ConfirmationEngine<L, C> {
    ledger: Arc<L>,
    clock: C,
    config: ConfirmationConfig,
}

impl<L: LedgerClient, C: Clock> ConfirmationEngine<L, C> {
    pub fn new(ledger: Arc<L>, clock: C, config: ConfirmationConfig) -> Self {
        Self {
            ledger,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ConfirmationConfig {
        &self.config
    }

    /// Submit signed wire bytes once and poll to a terminal disposition.
    pub async fn submit_and_confirm(&self, wire: &[u8], cancel: &CancelFlag) -> Disposition {
        let signature = match self.ledger.send_raw_transaction(wire).await {
            Ok(signature) => signature,
            Err(error) => {
                warn!(error = %error, bytes = wire.len(), "transaction submission failed");
                return Disposition::NotSent { error };
            }
        };

        info!(signature = %signature, "transaction submitted");
        self.confirm_signature(signature, cancel).await
    }

    /// Poll an already-submitted signature. Never resubmits.
    pub async fn confirm_signature(&self, signature: Signature, cancel: &CancelFlag) -> Disposition {
        let mut pending = PendingTransaction::new(signature, self.clock.now());
        let disposition = self.poll(&mut pending, cancel).await;

        match &disposition {
            Disposition::Confirmed {
                commitment,
                attempts,
                elapsed,
                ..
            } => info!(
                signature = %pending.signature,
                ?commitment,
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                "transaction confirmed"
            ),
            Disposition::Failed { rejection, .. } => warn!(
                signature = %pending.signature,
                rejection = %rejection,
                "transaction failed"
            ),
            Disposition::TimedOut { attempts, .. } => warn!(
                signature = %pending.signature,
                attempts,
                "transaction not confirmed within budget"
            ),
            Disposition::Cancelled { attempts, .. } => info!(
                signature = %pending.signature,
                attempts,
                "confirmation cancelled"
            ),
            Disposition::NotSent { .. } => {}
        }

        disposition
    }

    async fn poll(&self, pending: &mut PendingTransaction, cancel: &CancelFlag) -> Disposition {
        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 && cancel.is_cancelled() {
                return self.finish(pending, TxStatus::Cancelled);
            }

            pending.attempts = attempt;
            match self.ledger.get_signature_status(&pending.signature).await {
                Ok(Some(status)) => {
                    if let Some(rejection) = status.err {
                        return self.finish_failed(pending, rejection);
                    }
                    if status.commitment >= self.config.commitment {
                        return self.finish_confirmed(pending, status.commitment);
                    }
                    debug!(
                        signature = %pending.signature,
                        attempt,
                        commitment = ?status.commitment,
                        "transaction processing"
                    );
                    let advanced = pending.advance(TxStatus::Processing);
                    debug_assert!(advanced.is_ok(), "{advanced:?}");
                }
                Ok(None) => {
                    debug!(signature = %pending.signature, attempt, "status not yet available");
                }
                Err(LedgerError::Rejected(rejection)) => {
                    return self.finish_failed(pending, rejection);
                }
                Err(error) => {
                    warn!(
                        signature = %pending.signature,
                        attempt,
                        error = %error,
                        "status query failed, retrying"
                    );
                }
            }

            self.clock
                .sleep(self.config.backoff.delay(self.config.poll_interval, attempt))
                .await;
        }

        self.finish(pending, TxStatus::TimedOut)
    }

    fn elapsed(&self, pending: &PendingTransaction) -> Duration {
        self.clock.now().saturating_sub(pending.submitted_at)
    }

    fn finish_confirmed(&self, pending: &mut PendingTransaction, commitment: Commitment) -> Disposition {
        let advanced = pending.advance(TxStatus::Confirmed);
        debug_assert!(advanced.is_ok(), "{advanced:?}");
        Disposition::Confirmed {
            signature: pending.signature.clone(),
            commitment,
            attempts: pending.attempts,
            elapsed: self.elapsed(pending),
        }
    }

    fn finish_failed(&self, pending: &mut PendingTransaction, rejection: ProgramRejection) -> Disposition {
        let advanced = pending.advance(TxStatus::Failed);
        debug_assert!(advanced.is_ok(), "{advanced:?}");
        Disposition::Failed {
            signature: pending.signature.clone(),
            rejection,
            attempts: pending.attempts,
        }
    }

    fn finish(&self, pending: &mut PendingTransaction, status: TxStatus) -> Disposition {
        let advanced = pending.advance(status);
        debug_assert!(advanced.is_ok(), "{advanced:?}");
        let signature = pending.signature.clone();
        match status {
            TxStatus::Cancelled => Disposition::Cancelled {
                signature,
                attempts: pending.attempts,
            },
            _ => Disposition::TimedOut {
                signature,
                attempts: pending.attempts,
                elapsed: self.elapsed(pending),
            },
        }
    }
}
