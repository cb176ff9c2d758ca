//! Program ids for one token program deployment.
//!
//! The same client code talks to more than one deployment (the GorbChain
//! custom token program and the standard Solana one), so program ids are
//! never read from globals: every builder takes a [`ProgramConfig`].

use serde::{Deserialize, Serialize};

use crate::address::{base58, bytes_to_address, Pubkey};
use crate::error::TokenError;

// ---------------------------------------------------------------------------
// Well-known program IDs
// ---------------------------------------------------------------------------

/// System Program: 32 zero bytes, `11111111111111111111111111111111`.
pub const SYSTEM_PROGRAM_ID: Pubkey = [0u8; 32];

/// Rent sysvar: `SysvarRent111111111111111111111111111111111`
pub const RENT_SYSVAR_ID: Pubkey = [
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x2c, 0x5c, 0x51, 0x21, 0x8c, 0xc9, 0x4c, 0x3d, 0x4a,
    0xf1, 0x7f, 0x58, 0xda, 0xee, 0x08, 0x9b, 0xa1, 0xfd, 0x44, 0xe3, 0xdb, 0xd9, 0x8a,
    0x00, 0x00, 0x00, 0x00,
];

/// GorbChain token program: `2dwpmEaGB8euNCirbwWdumWUZFH3V91mbPjoFbWT24An`
pub const GORBCHAIN_TOKEN_PROGRAM_ID: Pubkey = [
    0x18, 0x52, 0x95, 0xce, 0x0e, 0x54, 0x2a, 0xeb, 0xa8, 0x4e, 0xbd, 0xa2, 0xe0, 0xe0,
    0xea, 0xdb, 0xfc, 0x55, 0x1f, 0xd6, 0x25, 0x06, 0xe1, 0x04, 0xb7, 0x3d, 0xde, 0xcd,
    0xde, 0x09, 0x4c, 0x0b,
];

/// GorbChain associated token account program:
/// `BWBbPGpceCtFCUuMFjYUYpHEnagcT58bNi9c44VJ4rkW`
pub const GORBCHAIN_ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = [
    0x9c, 0x0e, 0xb0, 0xa8, 0xc6, 0x4e, 0x50, 0x13, 0x7f, 0xb4, 0x9a, 0xe5, 0x34, 0x49,
    0x11, 0xf7, 0x44, 0xc7, 0x82, 0xde, 0x0c, 0x0c, 0x1d, 0xdf, 0x56, 0xf8, 0x65, 0x46,
    0x04, 0x9f, 0x29, 0x07,
];

/// GorbChain deployment of the classic SPL token program:
/// `8drSBwhdQQTQs68pAddfWyXPv8CA4JhFAY2QRAxwLmSS`
pub const GORBCHAIN_SPL_TOKEN_PROGRAM_ID: Pubkey = [
    0x71, 0x72, 0x9c, 0xf6, 0xa0, 0x82, 0xe4, 0x88, 0x80, 0x6a, 0x33, 0x0b, 0xb5, 0x68,
    0x18, 0x9c, 0x3f, 0x2c, 0x87, 0x5e, 0x0e, 0x00, 0xba, 0xc3, 0xb0, 0x1c, 0x29, 0x22,
    0x8e, 0xa6, 0x08, 0xeb,
];

/// SPL Token Program: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: Pubkey = [
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb,
    0x79, 0xac, 0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85,
    0x7e, 0xff, 0x00, 0xa9,
];

/// Associated Token Account Program: `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = [
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e,
    0x0d, 0x83, 0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8,
    0xdb, 0xe9, 0xf8, 0x59,
];

/// Program ids of one deployment. Immutable once built; cheap to copy into
/// every builder and across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramConfig {
    #[serde(with = "base58")]
    pub token_program_id: Pubkey,

    #[serde(with = "base58")]
    pub associated_token_program_id: Pubkey,

    #[serde(with = "base58", default = "default_rent_sysvar")]
    pub rent_sysvar_id: Pubkey,

    #[serde(with = "base58", default = "default_system_program")]
    pub system_program_id: Pubkey,
}

fn default_rent_sysvar() -> Pubkey {
    RENT_SYSVAR_ID
}

fn default_system_program() -> Pubkey {
    SYSTEM_PROGRAM_ID
}

impl ProgramConfig {
    pub fn new(token_program_id: Pubkey, associated_token_program_id: Pubkey) -> Self {
        Self {
            token_program_id,
            associated_token_program_id,
            rent_sysvar_id: RENT_SYSVAR_ID,
            system_program_id: SYSTEM_PROGRAM_ID,
        }
    }

    /// The GorbChain custom token program and its associated-account program.
    pub fn gorbchain() -> Self {
        Self::new(
            GORBCHAIN_TOKEN_PROGRAM_ID,
            GORBCHAIN_ASSOCIATED_TOKEN_PROGRAM_ID,
        )
    }

    /// The GorbChain classic SPL token program, paired with the GorbChain
    /// associated-account program.
    pub fn gorbchain_spl() -> Self {
        Self::new(
            GORBCHAIN_SPL_TOKEN_PROGRAM_ID,
            GORBCHAIN_ASSOCIATED_TOKEN_PROGRAM_ID,
        )
    }

    /// Standard Solana SPL token and associated-account programs.
    pub fn solana() -> Self {
        Self::new(TOKEN_PROGRAM_ID, ASSOCIATED_TOKEN_PROGRAM_ID)
    }

    /// Rejects configurations where distinct roles share one address.
    pub fn validate(&self) -> Result<(), TokenError> {
        let roles = [
            ("token program", self.token_program_id),
            ("associated token program", self.associated_token_program_id),
            ("rent sysvar", self.rent_sysvar_id),
            ("system program", self.system_program_id),
        ];

        for (i, (name_a, key_a)) in roles.iter().enumerate() {
            for (name_b, key_b) in &roles[i + 1..] {
                if key_a == key_b {
                    return Err(TokenError::Validation(format!(
                        "{name_a} and {name_b} share address {}",
                        bytes_to_address(key_a)
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self::gorbchain()
    }
}
