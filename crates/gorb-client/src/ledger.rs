//! The remote ledger seam.
//!
//! The RPC transport itself lives outside this crate. Anything that can
//! answer these queries can drive the token flows and the confirmation
//! engine; tests use an in-memory implementation.

use std::fmt;

use async_trait::async_trait;
use gorb_token::Pubkey;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, ProgramRejection};

/// Base58 transaction signature, as returned by `sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(pub String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Signature {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ledger commitment levels, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

/// Raw account as returned by `getAccountInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: Pubkey,
    pub data: Vec<u8>,
    pub executable: bool,
}

/// One entry of `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureStatus {
    pub commitment: Commitment,
    pub err: Option<ProgramRejection>,
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountInfo>, LedgerError>;

    /// Submit signed wire bytes. Returns the transaction signature.
    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<Signature, LedgerError>;

    /// `Ok(None)` while the ledger has not seen the signature yet.
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, LedgerError>;

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], LedgerError>;

    async fn get_minimum_balance_for_rent_exemption(&self, size: usize) -> Result<u64, LedgerError>;

    /// Lamports held at `address`. A missing account holds zero.
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        Ok(self
            .get_account_info(address)
            .await?
            .map_or(0, |info| info.lamports))
    }

    /// Accounts of `program_id` whose token owner is `owner`, as
    /// `getTokenAccountsByOwner` with a `programId` filter.
    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        program_id: &Pubkey,
    ) -> Result<Vec<(Pubkey, AccountInfo)>, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_ordering() {
        assert!(Commitment::Processed < Commitment::Confirmed);
        assert!(Commitment::Confirmed < Commitment::Finalized);
    }

    #[test]
    fn commitment_serde_lowercase() {
        let c: Commitment = serde_json::from_str(r#""finalized""#).unwrap();
        assert_eq!(c, Commitment::Finalized);
        assert_eq!(serde_json::to_string(&Commitment::Confirmed).unwrap(), r#""confirmed""#);
    }

    #[test]
    fn signature_display() {
        let sig = Signature::from("5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnb".to_string());
        assert_eq!(sig.to_string(), sig.as_str());
    }
}
