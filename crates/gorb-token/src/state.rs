//! Mint and token account byte layouts.
//!
//! ```text
//! Mint (82 bytes):
//!   [0, 36)    mint_authority     COption<Pubkey>  (u32 LE tag + key)
//!   [36, 44)   supply             u64 LE
//!   [44]       decimals           u8
//!   [45]       is_initialized     bool
//!   [46, 82)   freeze_authority   COption<Pubkey>
//!
//! TokenAccount (165 bytes):
//!   [0, 32)    mint               Pubkey
//!   [32, 64)   owner              Pubkey
//!   [64, 72)   amount             u64 LE
//!   [72, 108)  delegate           COption<Pubkey>
//!   [108]      state              u8 (0 uninitialized, 1 initialized, 2 frozen)
//!   [109, 121) is_native          COption<u64>
//!   [121, 129) delegated_amount   u64 LE
//!   [129, 165) close_authority    COption<Pubkey>
//! ```
//!
//! Token-2022 style extension data past the base layout is ignored.

use crate::address::{bytes_to_address, Pubkey};
use crate::error::TokenError;

/// A token mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mint {
    pub mint_authority: Option<Pubkey>,
    pub supply: u64,
    pub decimals: u8,
    pub is_initialized: bool,
    pub freeze_authority: Option<Pubkey>,
}

impl Mint {
    pub const LEN: usize = 82;

    pub fn parse(data: &[u8]) -> Result<Self, TokenError> {
        if data.len() < Self::LEN {
            return Err(TokenError::MalformedAccount(format!(
                "mint data is {} bytes, expected at least {}",
                data.len(),
                Self::LEN
            )));
        }

        Ok(Self {
            mint_authority: read_coption_pubkey(data, 0, "mint_authority")?,
            supply: read_u64(data, 36),
            decimals: data[44],
            is_initialized: read_bool(data[45], "is_initialized")?,
            freeze_authority: read_coption_pubkey(data, 46, "freeze_authority")?,
        })
    }

    pub fn pack(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        write_coption_pubkey(&mut out[0..36], self.mint_authority.as_ref());
        out[36..44].copy_from_slice(&self.supply.to_le_bytes());
        out[44] = self.decimals;
        out[45] = self.is_initialized as u8;
        write_coption_pubkey(&mut out[46..82], self.freeze_authority.as_ref());
        out
    }

    /// True if `authority` can mint new supply.
    pub fn is_mint_authority(&self, authority: &Pubkey) -> bool {
        self.mint_authority.as_ref() == Some(authority)
    }
}

/// Lifecycle state of a token account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountState {
    #[default]
    Uninitialized,
    Initialized,
    Frozen,
}

impl TryFrom<u8> for AccountState {
    type Error = TokenError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AccountState::Uninitialized),
            1 => Ok(AccountState::Initialized),
            2 => Ok(AccountState::Frozen),
            other => Err(TokenError::MalformedAccount(format!(
                "unknown account state {other}"
            ))),
        }
    }
}

/// A token account holding a balance of one mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub delegate: Option<Pubkey>,
    pub state: AccountState,
    /// Rent-exempt reserve for wrapped native accounts.
    pub is_native: Option<u64>,
    pub delegated_amount: u64,
    pub close_authority: Option<Pubkey>,
}

impl TokenAccount {
    pub const LEN: usize = 165;

    /// A freshly initialized account with zero balance.
    pub fn new(mint: Pubkey, owner: Pubkey) -> Self {
        Self {
            mint,
            owner,
            amount: 0,
            delegate: None,
            state: AccountState::Initialized,
            is_native: None,
            delegated_amount: 0,
            close_authority: None,
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self, TokenError> {
        if data.len() < Self::LEN {
            return Err(TokenError::MalformedAccount(format!(
                "token account data is {} bytes, expected at least {}",
                data.len(),
                Self::LEN
            )));
        }

        Ok(Self {
            mint: read_pubkey(data, 0),
            owner: read_pubkey(data, 32),
            amount: read_u64(data, 64),
            delegate: read_coption_pubkey(data, 72, "delegate")?,
            state: AccountState::try_from(data[108])?,
            is_native: read_coption_u64(data, 109, "is_native")?,
            delegated_amount: read_u64(data, 121),
            close_authority: read_coption_pubkey(data, 129, "close_authority")?,
        })
    }

    pub fn pack(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0..32].copy_from_slice(&self.mint);
        out[32..64].copy_from_slice(&self.owner);
        out[64..72].copy_from_slice(&self.amount.to_le_bytes());
        write_coption_pubkey(&mut out[72..108], self.delegate.as_ref());
        out[108] = match self.state {
            AccountState::Uninitialized => 0,
            AccountState::Initialized => 1,
            AccountState::Frozen => 2,
        };
        write_coption_u64(&mut out[109..121], self.is_native);
        out[121..129].copy_from_slice(&self.delegated_amount.to_le_bytes());
        write_coption_pubkey(&mut out[129..165], self.close_authority.as_ref());
        out
    }

    pub fn is_frozen(&self) -> bool {
        self.state == AccountState::Frozen
    }
}

/// A decoded account together with the address it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyed<T> {
    pub address: Pubkey,
    pub account: T,
}

impl Keyed<Mint> {
    pub fn parse_mint(address: Pubkey, data: &[u8]) -> Result<Self, TokenError> {
        Ok(Self {
            address,
            account: Mint::parse(data)?,
        })
    }
}

impl Keyed<TokenAccount> {
    pub fn parse_token_account(address: Pubkey, data: &[u8]) -> Result<Self, TokenError> {
        Ok(Self {
            address,
            account: TokenAccount::parse(data)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Field helpers. Callers check the overall length first.
// ---------------------------------------------------------------------------

fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    let mut key = [0u8; 32];
    key.copy_from_slice(&data[offset..offset + 32]);
    key
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

fn read_bool(byte: u8, field: &str) -> Result<bool, TokenError> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(TokenError::MalformedAccount(format!(
            "{field} has invalid bool byte {other}"
        ))),
    }
}

fn read_coption_tag(data: &[u8], offset: usize, field: &str) -> Result<bool, TokenError> {
    let mut tag = [0u8; 4];
    tag.copy_from_slice(&data[offset..offset + 4]);
    match u32::from_le_bytes(tag) {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(TokenError::MalformedAccount(format!(
            "{field} has invalid option tag {other}"
        ))),
    }
}

fn read_coption_pubkey(
    data: &[u8],
    offset: usize,
    field: &str,
) -> Result<Option<Pubkey>, TokenError> {
    Ok(read_coption_tag(data, offset, field)?.then(|| read_pubkey(data, offset + 4)))
}

fn read_coption_u64(data: &[u8], offset: usize, field: &str) -> Result<Option<u64>, TokenError> {
    Ok(read_coption_tag(data, offset, field)?.then(|| read_u64(data, offset + 4)))
}

fn write_coption_pubkey(dst: &mut [u8], value: Option<&Pubkey>) {
    match value {
        Some(key) => {
            dst[0..4].copy_from_slice(&1u32.to_le_bytes());
            dst[4..36].copy_from_slice(key);
        }
        None => dst[0..36].fill(0),
    }
}

fn write_coption_u64(dst: &mut [u8], value: Option<u64>) {
    match value {
        Some(v) => {
            dst[0..4].copy_from_slice(&1u32.to_le_bytes());
            dst[4..12].copy_from_slice(&v.to_le_bytes());
        }
        None => dst[0..12].fill(0),
    }
}

impl std::fmt::Display for TokenAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of mint {} owned by {}",
            self.amount,
            bytes_to_address(&self.mint),
            bytes_to_address(&self.owner)
        )
    }
}
