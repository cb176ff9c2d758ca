//! Token-2022 mint extensions: the metadata pointer.
//!
//! ```text
//! Mint with extensions:
//!   [0, 82)     base mint
//!   [82, 165)   zero padding up to the token account length
//!   [165]       account type (1 = mint)
//!   [166, ..)   TLV entries: u16 LE type, u16 LE length, value
//!
//! MetadataPointer value (64 bytes):
//!   [0, 32)     authority          Pubkey, all zeros when unset
//!   [32, 64)    metadata_address   Pubkey, all zeros when unset
//! ```
//!
//! Extension instructions must run after the account is allocated and
//! before `InitializeMint`.

use crate::address::Pubkey;
use crate::error::TokenError;
use crate::state::{Mint, TokenAccount};

/// Offset of the account type byte in an extended account.
pub const ACCOUNT_TYPE_OFFSET: usize = TokenAccount::LEN;

const ACCOUNT_TYPE_MINT: u8 = 1;
const TLV_HEADER_LEN: usize = 4;

/// Token-2022 `MetadataPointerExtension` instruction prefix.
pub const METADATA_POINTER_EXTENSION_IX: u8 = 39;

/// `MetadataPointerInstruction::Initialize`.
const METADATA_POINTER_INITIALIZE: u8 = 0;

/// Mint extensions this crate can size and read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionType {
    MetadataPointer,
}

impl ExtensionType {
    /// TLV type tag.
    pub fn tag(self) -> u16 {
        match self {
            ExtensionType::MetadataPointer => 18,
        }
    }

    /// Length of the TLV value.
    pub fn value_len(self) -> usize {
        match self {
            ExtensionType::MetadataPointer => MetadataPointer::LEN,
        }
    }
}

/// Bytes to allocate for a mint carrying `extensions`. Without extensions
/// this is the plain mint length.
pub fn mint_space(extensions: &[ExtensionType]) -> usize {
    if extensions.is_empty() {
        return Mint::LEN;
    }
    let tlv: usize = extensions
        .iter()
        .map(|ext| TLV_HEADER_LEN + ext.value_len())
        .sum();
    ACCOUNT_TYPE_OFFSET + 1 + tlv
}

/// Where a mint's metadata lives, and who may move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataPointer {
    pub authority: Option<Pubkey>,
    pub metadata_address: Option<Pubkey>,
}

impl MetadataPointer {
    pub const LEN: usize = 64;

    /// Payload of `InitializeMetadataPointer`. At least one field must be set.
    pub fn encode_initialize(&self) -> Result<Vec<u8>, TokenError> {
        if self.authority.is_none() && self.metadata_address.is_none() {
            return Err(TokenError::invalid_parameter(
                "metadata pointer needs an authority or a metadata address",
            ));
        }
        let mut data = Vec::with_capacity(2 + Self::LEN);
        data.push(METADATA_POINTER_EXTENSION_IX);
        data.push(METADATA_POINTER_INITIALIZE);
        data.extend_from_slice(&self.pack());
        Ok(data)
    }

    pub fn decode_initialize(data: &[u8]) -> Result<Self, TokenError> {
        match data {
            [METADATA_POINTER_EXTENSION_IX, METADATA_POINTER_INITIALIZE, value @ ..]
                if value.len() == Self::LEN =>
            {
                Ok(Self::unpack(value))
            }
            _ => Err(TokenError::invalid_parameter(format!(
                "not an InitializeMetadataPointer payload ({} bytes)",
                data.len()
            ))),
        }
    }

    pub fn pack(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        if let Some(authority) = &self.authority {
            out[..32].copy_from_slice(authority);
        }
        if let Some(address) = &self.metadata_address {
            out[32..].copy_from_slice(address);
        }
        out
    }

    fn unpack(value: &[u8]) -> Self {
        Self {
            authority: non_zero_pubkey(&value[..32]),
            metadata_address: non_zero_pubkey(&value[32..Self::LEN]),
        }
    }

    /// Read the pointer out of raw mint data. `Ok(None)` for a base-layout
    /// mint or one without the extension.
    pub fn from_mint_data(data: &[u8]) -> Result<Option<Self>, TokenError> {
        if data.len() <= ACCOUNT_TYPE_OFFSET {
            return Ok(None);
        }
        if data[ACCOUNT_TYPE_OFFSET] != ACCOUNT_TYPE_MINT {
            return Err(TokenError::MalformedAccount(format!(
                "account type {} is not a mint",
                data[ACCOUNT_TYPE_OFFSET]
            )));
        }

        let mut rest = &data[ACCOUNT_TYPE_OFFSET + 1..];
        while rest.len() >= TLV_HEADER_LEN {
            let tag = u16::from_le_bytes([rest[0], rest[1]]);
            let len = usize::from(u16::from_le_bytes([rest[2], rest[3]]));
            // Uninitialized tail.
            if tag == 0 {
                break;
            }
            let value = rest
                .get(TLV_HEADER_LEN..TLV_HEADER_LEN + len)
                .ok_or_else(|| {
                    TokenError::MalformedAccount(format!("extension {tag} overruns account data"))
                })?;
            if tag == ExtensionType::MetadataPointer.tag() {
                if len != Self::LEN {
                    return Err(TokenError::MalformedAccount(format!(
                        "metadata pointer is {len} bytes, expected {}",
                        Self::LEN
                    )));
                }
                return Ok(Some(Self::unpack(value)));
            }
            rest = &rest[TLV_HEADER_LEN + len..];
        }
        Ok(None)
    }

    /// Account data of `mint` carrying this pointer, as the program stores it.
    pub fn pack_with_mint(&self, mint: &Mint) -> Vec<u8> {
        let mut data = vec![0u8; mint_space(&[ExtensionType::MetadataPointer])];
        data[..Mint::LEN].copy_from_slice(&mint.pack());
        data[ACCOUNT_TYPE_OFFSET] = ACCOUNT_TYPE_MINT;

        let tlv = &mut data[ACCOUNT_TYPE_OFFSET + 1..];
        tlv[0..2].copy_from_slice(&ExtensionType::MetadataPointer.tag().to_le_bytes());
        tlv[2..4].copy_from_slice(&(Self::LEN as u16).to_le_bytes());
        tlv[TLV_HEADER_LEN..].copy_from_slice(&self.pack());
        data
    }
}

fn non_zero_pubkey(bytes: &[u8]) -> Option<Pubkey> {
    let mut key = [0u8; 32];
    key.copy_from_slice(bytes);
    (key != [0u8; 32]).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodingError;

    fn pointer() -> MetadataPointer {
        MetadataPointer {
            authority: Some([0xA1; 32]),
            metadata_address: Some([0xB2; 32]),
        }
    }

    fn mint() -> Mint {
        Mint {
            mint_authority: Some([0xA1; 32]),
            supply: 0,
            decimals: 6,
            is_initialized: true,
            freeze_authority: Some([0xA1; 32]),
        }
    }

    #[test]
    fn metadata_pointer_mint_space() {
        assert_eq!(mint_space(&[]), Mint::LEN);
        assert_eq!(mint_space(&[ExtensionType::MetadataPointer]), 234);
    }

    #[test]
    fn initialize_payload_layout() {
        let data = pointer().encode_initialize().unwrap();
        assert_eq!(data.len(), 66);
        assert_eq!(&data[..2], &[39, 0]);
        assert_eq!(&data[2..34], &[0xA1; 32]);
        assert_eq!(&data[34..], &[0xB2; 32]);
        assert_eq!(MetadataPointer::decode_initialize(&data).unwrap(), pointer());
    }

    #[test]
    fn unset_fields_are_zero_keys() {
        let only_address = MetadataPointer {
            authority: None,
            metadata_address: Some([0xB2; 32]),
        };
        let data = only_address.encode_initialize().unwrap();
        assert_eq!(&data[2..34], &[0u8; 32]);
        assert_eq!(MetadataPointer::decode_initialize(&data).unwrap(), only_address);
    }

    #[test]
    fn empty_pointer_is_rejected() {
        let empty = MetadataPointer {
            authority: None,
            metadata_address: None,
        };
        assert!(matches!(
            empty.encode_initialize(),
            Err(TokenError::Encoding(EncodingError::InvalidParameter(_)))
        ));
    }

    #[test]
    fn decode_rejects_other_payloads() {
        let mut data = pointer().encode_initialize().unwrap();
        data.pop();
        assert!(MetadataPointer::decode_initialize(&data).is_err());
        assert!(MetadataPointer::decode_initialize(&[24; 66]).is_err());
    }

    #[test]
    fn pointer_read_back_from_mint_data() {
        let data = pointer().pack_with_mint(&mint());
        assert_eq!(data.len(), 234);
        assert_eq!(data[165], 1);
        assert_eq!(&data[166..170], &[18, 0, 64, 0]);

        assert_eq!(Mint::parse(&data).unwrap(), mint());
        assert_eq!(MetadataPointer::from_mint_data(&data).unwrap(), Some(pointer()));
    }

    #[test]
    fn base_mint_has_no_pointer() {
        assert_eq!(MetadataPointer::from_mint_data(&mint().pack()).unwrap(), None);
    }

    #[test]
    fn other_extensions_are_skipped() {
        let mut data = vec![0u8; ACCOUNT_TYPE_OFFSET + 1];
        data[..Mint::LEN].copy_from_slice(&mint().pack());
        data[ACCOUNT_TYPE_OFFSET] = 1;
        // A 2-byte extension of type 3, then the pointer.
        data.extend_from_slice(&[3, 0, 2, 0, 0xFF, 0xFF]);
        data.extend_from_slice(&[18, 0, 64, 0]);
        data.extend_from_slice(&pointer().pack());

        assert_eq!(MetadataPointer::from_mint_data(&data).unwrap(), Some(pointer()));
    }

    #[test]
    fn malformed_extension_data() {
        let mut data = pointer().pack_with_mint(&mint());
        data[165] = 2;
        assert!(matches!(
            MetadataPointer::from_mint_data(&data),
            Err(TokenError::MalformedAccount(_))
        ));

        let mut data = pointer().pack_with_mint(&mint());
        data.truncate(200);
        assert!(matches!(
            MetadataPointer::from_mint_data(&data),
            Err(TokenError::MalformedAccount(_))
        ));
    }
}
