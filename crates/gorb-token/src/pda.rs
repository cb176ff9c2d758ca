//! Program-derived addresses and associated token account derivation.
//!
//! A program-derived address is
//! `SHA-256(seed_0 || ... || seed_n || [bump] || program_id || "ProgramDerivedAddress")`
//! for the first bump (255 down to 1) whose digest is NOT a valid Ed25519
//! point, so no private key can sign for it.

use sha2::{Digest, Sha256};

use crate::address::Pubkey;
use crate::config::ProgramConfig;
use crate::error::TokenError;

/// The string appended to every derivation.
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Longest accepted single seed.
pub const MAX_SEED_LEN: usize = 32;

/// Most seeds accepted, counting the bump.
pub const MAX_SEEDS: usize = 16;

/// Hash `seeds || [bump]` against `program_id`.
///
/// Fails with `InvalidAddress` when the digest lands on the curve.
pub fn create_program_address(
    seeds: &[&[u8]],
    bump: u8,
    program_id: &Pubkey,
) -> Result<Pubkey, TokenError> {
    check_seeds(seeds)?;
    try_create_program_address(seeds, bump, program_id).ok_or_else(|| {
        TokenError::InvalidAddress(format!("bump {bump} yields an on-curve address"))
    })
}

/// Find the first off-curve address for `seeds`, searching bumps from 255
/// down to 1.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), TokenError> {
    check_seeds(seeds)?;

    for bump in (1u8..=255).rev() {
        if let Some(address) = try_create_program_address(seeds, bump, program_id) {
            return Ok((address, bump));
        }
    }

    Err(TokenError::DerivationExhausted)
}

/// Associated token account address and bump for `(owner, mint)`.
///
/// Seeds are `[owner, token_program_id, mint]`, hashed against
/// `associated_program_id`.
pub fn derive(
    owner: &Pubkey,
    mint: &Pubkey,
    token_program_id: &Pubkey,
    associated_program_id: &Pubkey,
) -> Result<(Pubkey, u8), TokenError> {
    find_program_address(
        &[owner.as_ref(), token_program_id.as_ref(), mint.as_ref()],
        associated_program_id,
    )
}

/// Associated token account address under `config`'s programs.
pub fn associated_token_address(
    config: &ProgramConfig,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<Pubkey, TokenError> {
    derive(
        owner,
        mint,
        &config.token_program_id,
        &config.associated_token_program_id,
    )
    .map(|(address, _bump)| address)
}

/// Check if 32 bytes decompress to a valid Ed25519 point.
pub fn is_on_curve(bytes: &Pubkey) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}

fn check_seeds(seeds: &[&[u8]]) -> Result<(), TokenError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(TokenError::invalid_parameter(format!(
            "at most {} seeds plus the bump, got {}",
            MAX_SEEDS - 1,
            seeds.len()
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(TokenError::invalid_parameter(format!(
            "seed of {} bytes exceeds {MAX_SEED_LEN}",
            seed.len()
        )));
    }
    Ok(())
}

fn try_create_program_address(seeds: &[&[u8]], bump: u8, program_id: &Pubkey) -> Option<Pubkey> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id);
    hasher.update(PDA_MARKER);

    let hash: Pubkey = hasher.finalize().into();
    if is_on_curve(&hash) {
        return None;
    }
    Some(hash)
}
