//! Account addresses.
//!
//! Every account, program and sysvar on the ledger is identified by 32 raw
//! bytes, written in text as Base58 (Bitcoin alphabet, as used by `bs58`).

use zeroize::Zeroize;

use crate::error::TokenError;

/// A 32-byte account address.
pub type Pubkey = [u8; 32];

/// Decode a Base58 address string to its 32-byte representation.
pub fn address_to_bytes(address: &str) -> Result<Pubkey, TokenError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| TokenError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    let arr: Pubkey = bytes.try_into().map_err(|v: Vec<u8>| {
        TokenError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })?;

    Ok(arr)
}

/// Encode 32 bytes as a Base58 address string.
pub fn bytes_to_address(bytes: &Pubkey) -> String {
    bs58::encode(bytes).into_string()
}

/// Returns `Ok(true)` if `address` decodes to exactly 32 bytes.
pub fn validate_address(address: &str) -> Result<bool, TokenError> {
    address_to_bytes(address).map(|_| true)
}

/// Public key of the Ed25519 keypair generated from a 32-byte seed.
///
/// The seed copy made here is wiped before returning.
pub fn pubkey_from_seed(seed: &[u8; 32]) -> Pubkey {
    let mut copy = *seed;
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&copy);
    copy.zeroize();
    signing_key.verifying_key().to_bytes()
}

/// Serde adapter storing a [`Pubkey`] as its Base58 string.
pub mod base58 {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::Pubkey;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::bytes_to_address(key))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::address_to_bytes(&text).map_err(D::Error::custom)
    }
}
