//! Instruction builders for the token, associated-account and system programs.
//!
//! Every builder takes the [`ProgramConfig`] of the target deployment and
//! returns an [`Instruction`] whose payload comes from [`crate::codec`].
//! Amounts are raw base units.

use crate::address::Pubkey;
use crate::codec;
use crate::config::ProgramConfig;
use crate::error::TokenError;
use crate::extension::MetadataPointer;
use crate::pda;
use crate::transaction::{AccountMeta, Instruction};

/// System program `CreateAccount` instruction index.
const SYSTEM_CREATE_ACCOUNT_IX_INDEX: u32 = 0;

/// Associated-account program `CreateIdempotent` discriminator.
const ATA_CREATE_IDEMPOTENT: u8 = 1;

// ---------------------------------------------------------------------------
// Token program
// ---------------------------------------------------------------------------

/// `InitializeMint`: accounts `[mint (w), rent sysvar]`.
pub fn initialize_mint(
    config: &ProgramConfig,
    mint: &Pubkey,
    decimals: u8,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
) -> Result<Instruction, TokenError> {
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![
            AccountMeta::writable(*mint, false),
            AccountMeta::readonly(config.rent_sysvar_id, false),
        ],
        data: codec::encode_initialize_mint(decimals, mint_authority, freeze_authority)?,
    })
}

/// `InitializeMint2`: accounts `[mint (w)]`.
pub fn initialize_mint2(
    config: &ProgramConfig,
    mint: &Pubkey,
    decimals: u8,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
) -> Result<Instruction, TokenError> {
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![AccountMeta::writable(*mint, false)],
        data: codec::encode_initialize_mint2(decimals, mint_authority, freeze_authority)?,
    })
}

/// `InitializeAccount`: accounts `[account (w), mint, owner, rent sysvar]`.
pub fn initialize_account(
    config: &ProgramConfig,
    account: &Pubkey,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<Instruction, TokenError> {
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![
            AccountMeta::writable(*account, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::readonly(*owner, false),
            AccountMeta::readonly(config.rent_sysvar_id, false),
        ],
        data: codec::encode_initialize_account_legacy()?,
    })
}

/// `InitializeAccount3`: accounts `[account (w), mint]`, owner in the payload.
pub fn initialize_account3(
    config: &ProgramConfig,
    account: &Pubkey,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<Instruction, TokenError> {
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![
            AccountMeta::writable(*account, false),
            AccountMeta::readonly(*mint, false),
        ],
        data: codec::encode_initialize_account(owner)?,
    })
}

/// `MintTo`: accounts `[mint (w), destination (w), mint authority (s)]`.
pub fn mint_to(
    config: &ProgramConfig,
    mint: &Pubkey,
    destination: &Pubkey,
    mint_authority: &Pubkey,
    amount: u128,
) -> Result<Instruction, TokenError> {
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![
            AccountMeta::writable(*mint, false),
            AccountMeta::writable(*destination, false),
            AccountMeta::readonly(*mint_authority, true),
        ],
        data: codec::encode_mint_to(amount)?,
    })
}

/// `MintToChecked`: same accounts as [`mint_to`], decimals verified on chain.
pub fn mint_to_checked(
    config: &ProgramConfig,
    mint: &Pubkey,
    destination: &Pubkey,
    mint_authority: &Pubkey,
    amount: u128,
    decimals: u8,
) -> Result<Instruction, TokenError> {
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![
            AccountMeta::writable(*mint, false),
            AccountMeta::writable(*destination, false),
            AccountMeta::readonly(*mint_authority, true),
        ],
        data: codec::encode_mint_to_checked(amount, decimals)?,
    })
}

/// `Transfer`: accounts `[source (w), destination (w), owner (s)]`.
pub fn transfer(
    config: &ProgramConfig,
    source: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u128,
) -> Result<Instruction, TokenError> {
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![
            AccountMeta::writable(*source, false),
            AccountMeta::writable(*destination, false),
            AccountMeta::readonly(*owner, true),
        ],
        data: codec::encode_transfer(amount)?,
    })
}

/// `TransferChecked`: accounts `[source (w), mint, destination (w), owner (s)]`.
pub fn transfer_checked(
    config: &ProgramConfig,
    source: &Pubkey,
    mint: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u128,
    decimals: u8,
) -> Result<Instruction, TokenError> {
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![
            AccountMeta::writable(*source, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::writable(*destination, false),
            AccountMeta::readonly(*owner, true),
        ],
        data: codec::encode_transfer_checked(amount, decimals)?,
    })
}

/// `Burn`: accounts `[account (w), mint (w), owner (s)]`.
pub fn burn(
    config: &ProgramConfig,
    account: &Pubkey,
    mint: &Pubkey,
    owner: &Pubkey,
    amount: u128,
) -> Result<Instruction, TokenError> {
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![
            AccountMeta::writable(*account, false),
            AccountMeta::writable(*mint, false),
            AccountMeta::readonly(*owner, true),
        ],
        data: codec::encode_burn(amount)?,
    })
}

/// `CloseAccount`: accounts `[account (w), destination (w), owner (s)]`.
pub fn close_account(
    config: &ProgramConfig,
    account: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
) -> Result<Instruction, TokenError> {
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![
            AccountMeta::writable(*account, false),
            AccountMeta::writable(*destination, false),
            AccountMeta::readonly(*owner, true),
        ],
        data: codec::encode_close_account()?,
    })
}

/// Token-2022 `InitializeMetadataPointer`: accounts `[mint (w)]`. Must run
/// before the mint is initialized, on an account sized with
/// [`crate::extension::mint_space`].
pub fn initialize_metadata_pointer(
    config: &ProgramConfig,
    mint: &Pubkey,
    authority: Option<&Pubkey>,
    metadata_address: Option<&Pubkey>,
) -> Result<Instruction, TokenError> {
    let pointer = MetadataPointer {
        authority: authority.copied(),
        metadata_address: metadata_address.copied(),
    };
    Ok(Instruction {
        program_id: config.token_program_id,
        accounts: vec![AccountMeta::writable(*mint, false)],
        data: pointer.encode_initialize()?,
    })
}

// ---------------------------------------------------------------------------
// System program
// ---------------------------------------------------------------------------

/// System `CreateAccount`: allocates `space` bytes owned by `owner_program`
/// and funds them with `lamports`. Both payer and new account sign.
pub fn create_account(
    config: &ProgramConfig,
    payer: &Pubkey,
    new_account: &Pubkey,
    lamports: u64,
    space: u64,
    owner_program: &Pubkey,
) -> Instruction {
    // u32 LE index + u64 lamports + u64 space + 32-byte owner = 52 bytes.
    let mut data = Vec::with_capacity(52);
    data.extend_from_slice(&SYSTEM_CREATE_ACCOUNT_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    data.extend_from_slice(&space.to_le_bytes());
    data.extend_from_slice(owner_program);

    Instruction {
        program_id: config.system_program_id,
        accounts: vec![
            AccountMeta::writable(*payer, true),
            AccountMeta::writable(*new_account, true),
        ],
        data,
    }
}

// ---------------------------------------------------------------------------
// Associated token account program
// ---------------------------------------------------------------------------

/// Create the associated token account of `(owner, mint)`. Fails on chain if
/// it already exists.
pub fn create_associated_token_account(
    config: &ProgramConfig,
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<Instruction, TokenError> {
    build_create_ata(config, payer, owner, mint, Vec::new())
}

/// Like [`create_associated_token_account`], but a no-op on chain when the
/// account already exists.
pub fn create_associated_token_account_idempotent(
    config: &ProgramConfig,
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<Instruction, TokenError> {
    build_create_ata(config, payer, owner, mint, vec![ATA_CREATE_IDEMPOTENT])
}

fn build_create_ata(
    config: &ProgramConfig,
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    data: Vec<u8>,
) -> Result<Instruction, TokenError> {
    let ata = pda::associated_token_address(config, owner, mint)?;

    Ok(Instruction {
        program_id: config.associated_token_program_id,
        accounts: vec![
            AccountMeta::writable(*payer, true),
            AccountMeta::writable(ata, false),
            AccountMeta::readonly(*owner, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::readonly(config.system_program_id, false),
            AccountMeta::readonly(config.token_program_id, false),
        ],
        data,
    })
}
