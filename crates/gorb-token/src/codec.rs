//! Instruction payload codec.
//!
//! Every payload is `[opcode] || fields...`, with the field list taken from
//! [`Opcode::schema`]. The program checks the payload length strictly, so
//! decoding rejects short input and trailing bytes alike.

use crate::address::Pubkey;
use crate::error::{EncodingError, TokenError};
use crate::opcode::{FieldKind, Opcode};

/// Largest `decimals` value a mint accepts.
pub const MAX_DECIMALS: u8 = 9;

/// A decoded payload field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    U8(u8),
    U64(u64),
    Pubkey(Pubkey),
    OptionalPubkey(Option<Pubkey>),
}

impl FieldValue {
    fn kind(&self) -> FieldKind {
        match self {
            FieldValue::U8(_) => FieldKind::U8,
            FieldValue::U64(_) => FieldKind::U64,
            FieldValue::Pubkey(_) => FieldKind::Pubkey,
            FieldValue::OptionalPubkey(_) => FieldKind::OptionalPubkey,
        }
    }

    fn width(&self) -> usize {
        match self {
            FieldValue::OptionalPubkey(key) => self.kind().width(key.is_some()),
            other => other.kind().width(true),
        }
    }
}

// ---------------------------------------------------------------------------
// Generic schema-driven encode / decode
// ---------------------------------------------------------------------------

/// Encode `values` under `opcode`'s schema.
///
/// Values must match the schema one-to-one, in order and kind.
pub fn encode_fields(opcode: Opcode, values: &[FieldValue]) -> Result<Vec<u8>, TokenError> {
    let schema = opcode.schema();
    if schema.len() != values.len() {
        return Err(TokenError::invalid_parameter(format!(
            "{} takes {} fields, got {}",
            opcode.name(),
            schema.len(),
            values.len()
        )));
    }

    let len = 1 + values.iter().map(FieldValue::width).sum::<usize>();
    let mut data = Vec::with_capacity(len);
    data.push(opcode as u8);

    for (field, value) in schema.iter().zip(values) {
        if field.kind != value.kind() {
            return Err(TokenError::invalid_parameter(format!(
                "{}.{} expects {:?}, got {:?}",
                opcode.name(),
                field.name,
                field.kind,
                value.kind()
            )));
        }

        match value {
            FieldValue::U8(v) => data.push(*v),
            FieldValue::U64(v) => data.extend_from_slice(&v.to_le_bytes()),
            FieldValue::Pubkey(key) => data.extend_from_slice(key),
            FieldValue::OptionalPubkey(None) => data.push(0),
            FieldValue::OptionalPubkey(Some(key)) => {
                data.push(1);
                data.extend_from_slice(key);
            }
        }
    }

    debug_assert_eq!(data.len(), len);
    Ok(data)
}

/// Decode a payload into its opcode and field values.
pub fn decode_fields(data: &[u8]) -> Result<(Opcode, Vec<FieldValue>), TokenError> {
    let (&tag, mut rest) = data.split_first().ok_or_else(|| {
        TokenError::invalid_parameter("instruction data is empty")
    })?;
    let opcode = Opcode::try_from(tag)?;

    let expected = expected_len(opcode, data)?;
    if data.len() != expected {
        return Err(EncodingError::LengthMismatch {
            opcode: opcode.name(),
            expected,
            actual: data.len(),
        }
        .into());
    }

    let mut values = Vec::with_capacity(opcode.schema().len());
    for field in opcode.schema() {
        let value = match field.kind {
            FieldKind::U8 => FieldValue::U8(take::<1>(&mut rest)[0]),
            FieldKind::U64 => FieldValue::U64(u64::from_le_bytes(take::<8>(&mut rest))),
            FieldKind::Pubkey => FieldValue::Pubkey(take::<32>(&mut rest)),
            FieldKind::OptionalPubkey => match take::<1>(&mut rest)[0] {
                0 => FieldValue::OptionalPubkey(None),
                _ => FieldValue::OptionalPubkey(Some(take::<32>(&mut rest))),
            },
        };
        values.push(value);
    }

    Ok((opcode, values))
}

/// Exact payload length for `data`, reading presence flags where the schema
/// has optional fields.
fn expected_len(opcode: Opcode, data: &[u8]) -> Result<usize, TokenError> {
    let mut offset = 1;
    for field in opcode.schema() {
        let present = match field.kind {
            FieldKind::OptionalPubkey => match data.get(offset) {
                None | Some(0) => false,
                Some(1) => true,
                Some(flag) => {
                    return Err(TokenError::invalid_parameter(format!(
                        "{}.{} has presence flag {flag}",
                        opcode.name(),
                        field.name
                    )))
                }
            },
            _ => true,
        };
        offset += field.kind.width(present);
    }
    Ok(offset)
}

/// Split `N` bytes off the front. Callers check the total length first.
fn take<const N: usize>(rest: &mut &[u8]) -> [u8; N] {
    let (head, tail) = rest.split_at(N);
    *rest = tail;
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    out
}

// ---------------------------------------------------------------------------
// Tagged-variant view
// ---------------------------------------------------------------------------

/// A token program instruction payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenInstruction {
    InitializeMint {
        decimals: u8,
        mint_authority: Pubkey,
        freeze_authority: Option<Pubkey>,
    },
    InitializeAccount,
    Transfer {
        amount: u64,
    },
    MintTo {
        amount: u64,
    },
    Burn {
        amount: u64,
    },
    CloseAccount,
    TransferChecked {
        amount: u64,
        decimals: u8,
    },
    MintToChecked {
        amount: u64,
        decimals: u8,
    },
    InitializeAccount3 {
        owner: Pubkey,
    },
    InitializeMint2 {
        decimals: u8,
        mint_authority: Pubkey,
        freeze_authority: Option<Pubkey>,
    },
}

impl TokenInstruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            TokenInstruction::InitializeMint { .. } => Opcode::InitializeMint,
            TokenInstruction::InitializeAccount => Opcode::InitializeAccount,
            TokenInstruction::Transfer { .. } => Opcode::Transfer,
            TokenInstruction::MintTo { .. } => Opcode::MintTo,
            TokenInstruction::Burn { .. } => Opcode::Burn,
            TokenInstruction::CloseAccount => Opcode::CloseAccount,
            TokenInstruction::TransferChecked { .. } => Opcode::TransferChecked,
            TokenInstruction::MintToChecked { .. } => Opcode::MintToChecked,
            TokenInstruction::InitializeAccount3 { .. } => Opcode::InitializeAccount3,
            TokenInstruction::InitializeMint2 { .. } => Opcode::InitializeMint2,
        }
    }

    fn fields(&self) -> Vec<FieldValue> {
        use FieldValue as V;
        match *self {
            TokenInstruction::InitializeMint {
                decimals,
                mint_authority,
                freeze_authority,
            }
            | TokenInstruction::InitializeMint2 {
                decimals,
                mint_authority,
                freeze_authority,
            } => vec![
                V::U8(decimals),
                V::Pubkey(mint_authority),
                V::OptionalPubkey(freeze_authority),
            ],
            TokenInstruction::Transfer { amount }
            | TokenInstruction::MintTo { amount }
            | TokenInstruction::Burn { amount } => vec![V::U64(amount)],
            TokenInstruction::TransferChecked { amount, decimals }
            | TokenInstruction::MintToChecked { amount, decimals } => {
                vec![V::U64(amount), V::U8(decimals)]
            }
            TokenInstruction::InitializeAccount3 { owner } => vec![V::Pubkey(owner)],
            TokenInstruction::InitializeAccount | TokenInstruction::CloseAccount => Vec::new(),
        }
    }

    fn from_fields(opcode: Opcode, values: &[FieldValue]) -> Result<Self, TokenError> {
        use FieldValue as V;
        let ix = match (opcode, values) {
            (
                Opcode::InitializeMint,
                [V::U8(decimals), V::Pubkey(mint_authority), V::OptionalPubkey(freeze_authority)],
            ) => TokenInstruction::InitializeMint {
                decimals: *decimals,
                mint_authority: *mint_authority,
                freeze_authority: *freeze_authority,
            },
            (
                Opcode::InitializeMint2,
                [V::U8(decimals), V::Pubkey(mint_authority), V::OptionalPubkey(freeze_authority)],
            ) => TokenInstruction::InitializeMint2 {
                decimals: *decimals,
                mint_authority: *mint_authority,
                freeze_authority: *freeze_authority,
            },
            (Opcode::InitializeAccount, []) => TokenInstruction::InitializeAccount,
            (Opcode::CloseAccount, []) => TokenInstruction::CloseAccount,
            (Opcode::Transfer, [V::U64(amount)]) => TokenInstruction::Transfer { amount: *amount },
            (Opcode::MintTo, [V::U64(amount)]) => TokenInstruction::MintTo { amount: *amount },
            (Opcode::Burn, [V::U64(amount)]) => TokenInstruction::Burn { amount: *amount },
            (Opcode::TransferChecked, [V::U64(amount), V::U8(decimals)]) => {
                TokenInstruction::TransferChecked {
                    amount: *amount,
                    decimals: *decimals,
                }
            }
            (Opcode::MintToChecked, [V::U64(amount), V::U8(decimals)]) => {
                TokenInstruction::MintToChecked {
                    amount: *amount,
                    decimals: *decimals,
                }
            }
            (Opcode::InitializeAccount3, [V::Pubkey(owner)]) => {
                TokenInstruction::InitializeAccount3 { owner: *owner }
            }
            (opcode, values) => {
                return Err(TokenError::invalid_parameter(format!(
                    "field values {values:?} do not match the {} schema",
                    opcode.name()
                )))
            }
        };
        ix.check_decimals()?;
        Ok(ix)
    }

    fn check_decimals(&self) -> Result<(), TokenError> {
        let decimals = match *self {
            TokenInstruction::InitializeMint { decimals, .. }
            | TokenInstruction::InitializeMint2 { decimals, .. }
            | TokenInstruction::TransferChecked { decimals, .. }
            | TokenInstruction::MintToChecked { decimals, .. } => decimals,
            _ => return Ok(()),
        };

        if decimals > MAX_DECIMALS {
            return Err(TokenError::invalid_parameter(format!(
                "decimals must be 0..={MAX_DECIMALS}, got {decimals}"
            )));
        }
        Ok(())
    }

    /// Encode to the exact byte layout the program expects.
    pub fn pack(&self) -> Result<Vec<u8>, TokenError> {
        self.check_decimals()?;
        encode_fields(self.opcode(), &self.fields())
    }

    /// Decode a payload produced by [`TokenInstruction::pack`] or by any other
    /// client of the same program.
    pub fn unpack(data: &[u8]) -> Result<Self, TokenError> {
        let (opcode, values) = decode_fields(data)?;
        Self::from_fields(opcode, &values)
    }
}

// ---------------------------------------------------------------------------
// Named encoders
// ---------------------------------------------------------------------------

/// Narrow a raw amount to the program's u64 field.
///
/// Amounts arrive as `u128` so that callers scaling UI amounts by
/// `10^decimals` hit `Overflow` here instead of wrapping.
fn checked_amount(amount: u128) -> Result<u64, EncodingError> {
    u64::try_from(amount).map_err(|_| EncodingError::Overflow { field: "amount" })
}

/// `InitializeMint` (opcode 0). The rent sysvar is passed as an account.
pub fn encode_initialize_mint(
    decimals: u8,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
) -> Result<Vec<u8>, TokenError> {
    TokenInstruction::InitializeMint {
        decimals,
        mint_authority: *mint_authority,
        freeze_authority: freeze_authority.copied(),
    }
    .pack()
}

/// `InitializeMint2` (opcode 20). Same payload as `InitializeMint`, no rent
/// sysvar account.
pub fn encode_initialize_mint2(
    decimals: u8,
    mint_authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
) -> Result<Vec<u8>, TokenError> {
    TokenInstruction::InitializeMint2 {
        decimals,
        mint_authority: *mint_authority,
        freeze_authority: freeze_authority.copied(),
    }
    .pack()
}

/// `InitializeAccount3` (opcode 18): the owner travels in the payload.
pub fn encode_initialize_account(owner: &Pubkey) -> Result<Vec<u8>, TokenError> {
    TokenInstruction::InitializeAccount3 { owner: *owner }.pack()
}

/// `InitializeAccount` (opcode 1): the owner is passed as an account.
pub fn encode_initialize_account_legacy() -> Result<Vec<u8>, TokenError> {
    TokenInstruction::InitializeAccount.pack()
}

pub fn encode_mint_to(amount: u128) -> Result<Vec<u8>, TokenError> {
    TokenInstruction::MintTo {
        amount: checked_amount(amount)?,
    }
    .pack()
}

pub fn encode_transfer(amount: u128) -> Result<Vec<u8>, TokenError> {
    TokenInstruction::Transfer {
        amount: checked_amount(amount)?,
    }
    .pack()
}

pub fn encode_burn(amount: u128) -> Result<Vec<u8>, TokenError> {
    TokenInstruction::Burn {
        amount: checked_amount(amount)?,
    }
    .pack()
}

pub fn encode_transfer_checked(amount: u128, decimals: u8) -> Result<Vec<u8>, TokenError> {
    TokenInstruction::TransferChecked {
        amount: checked_amount(amount)?,
        decimals,
    }
    .pack()
}

pub fn encode_mint_to_checked(amount: u128, decimals: u8) -> Result<Vec<u8>, TokenError> {
    TokenInstruction::MintToChecked {
        amount: checked_amount(amount)?,
        decimals,
    }
    .pack()
}

pub fn encode_close_account() -> Result<Vec<u8>, TokenError> {
    TokenInstruction::CloseAccount.pack()
}

/// Decode any supported payload.
pub fn decode(data: &[u8]) -> Result<TokenInstruction, TokenError> {
    TokenInstruction::unpack(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORITY: Pubkey = [0xA1; 32];
    const FREEZER: Pubkey = [0xF2; 32];

    // -- MintTo / Transfer ---------------------------------------------------

    #[test]
    fn mint_to_zero_is_eight_zero_bytes() {
        let data = encode_mint_to(0).unwrap();
        assert_eq!(data, vec![7, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn mint_to_max_u64_fits() {
        let data = encode_mint_to(u64::MAX as u128).unwrap();
        assert_eq!(data.len(), 9);
        assert_eq!(&data[1..], &[0xff; 8]);
    }

    #[test]
    fn mint_to_overflow() {
        let err = encode_mint_to(u64::MAX as u128 + 1).unwrap_err();
        assert_eq!(
            err,
            TokenError::Encoding(EncodingError::Overflow { field: "amount" })
        );
    }

    #[test]
    fn transfer_layout() {
        let data = encode_transfer(500_000).unwrap();
        assert_eq!(data[0], 3);
        assert_eq!(u64::from_le_bytes(data[1..9].try_into().unwrap()), 500_000);
        assert_eq!(data.len(), 9);
    }

    #[test]
    fn transfer_overflow() {
        assert!(matches!(
            encode_transfer(u128::MAX),
            Err(TokenError::Encoding(EncodingError::Overflow { .. }))
        ));
    }

    #[test]
    fn checked_variants_append_decimals() {
        let data = encode_transfer_checked(1_000, 6).unwrap();
        assert_eq!(data[0], 12);
        assert_eq!(data.len(), 10);
        assert_eq!(data[9], 6);

        let data = encode_mint_to_checked(1_000, 9).unwrap();
        assert_eq!(data[0], 14);
        assert_eq!(data[9], 9);

        assert!(encode_mint_to_checked(1, 10).is_err());
    }

    // -- InitializeMint ------------------------------------------------------

    #[test]
    fn initialize_mint_without_freeze_is_35_bytes() {
        let data = encode_initialize_mint2(9, &AUTHORITY, None).unwrap();
        assert_eq!(data.len(), 35);
        assert_eq!(data[0], 20);
        assert_eq!(data[1], 9);
        assert_eq!(&data[2..34], &AUTHORITY);
        assert_eq!(data[34], 0);
    }

    #[test]
    fn initialize_mint_with_freeze_is_67_bytes() {
        let data = encode_initialize_mint(6, &AUTHORITY, Some(&FREEZER)).unwrap();
        assert_eq!(data.len(), 67);
        assert_eq!(data[0], 0);
        assert_eq!(data[1], 6);
        assert_eq!(data[34], 1);
        assert_eq!(&data[35..67], &FREEZER);
    }

    #[test]
    fn initialize_mint_rejects_decimals_above_nine() {
        let err = encode_initialize_mint(10, &AUTHORITY, None).unwrap_err();
        assert!(matches!(
            err,
            TokenError::Encoding(EncodingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn initialize_mint_accepts_every_decimals_value() {
        for decimals in 0..=MAX_DECIMALS {
            let data = encode_initialize_mint2(decimals, &AUTHORITY, None).unwrap();
            assert_eq!(data[1], decimals);
        }
    }

    // -- InitializeAccount ---------------------------------------------------

    #[test]
    fn initialize_account3_carries_owner() {
        let owner = [0x33u8; 32];
        let data = encode_initialize_account(&owner).unwrap();
        assert_eq!(data.len(), 33);
        assert_eq!(data[0], 18);
        assert_eq!(&data[1..], &owner);
    }

    #[test]
    fn initialize_account_legacy_is_opcode_only() {
        assert_eq!(encode_initialize_account_legacy().unwrap(), vec![1]);
        assert_eq!(encode_close_account().unwrap(), vec![9]);
    }

    // -- Decoding ------------------------------------------------------------

    #[test]
    fn decode_mint_to() {
        let data = encode_mint_to(123_456_789).unwrap();
        assert_eq!(
            decode(&data).unwrap(),
            TokenInstruction::MintTo {
                amount: 123_456_789
            }
        );
    }

    #[test]
    fn decode_initialize_mint_with_and_without_freeze() {
        let with = encode_initialize_mint(2, &AUTHORITY, Some(&FREEZER)).unwrap();
        assert_eq!(
            decode(&with).unwrap(),
            TokenInstruction::InitializeMint {
                decimals: 2,
                mint_authority: AUTHORITY,
                freeze_authority: Some(FREEZER),
            }
        );

        let without = encode_initialize_mint2(2, &AUTHORITY, None).unwrap();
        assert_eq!(
            decode(&without).unwrap(),
            TokenInstruction::InitializeMint2 {
                decimals: 2,
                mint_authority: AUTHORITY,
                freeze_authority: None,
            }
        );
    }

    #[test]
    fn decode_rejects_truncated_payload() {
        let data = encode_transfer(42).unwrap();
        let err = decode(&data[..8]).unwrap_err();
        assert_eq!(
            err,
            TokenError::Encoding(EncodingError::LengthMismatch {
                opcode: "Transfer",
                expected: 9,
                actual: 8,
            })
        );
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut data = encode_initialize_mint2(9, &AUTHORITY, None).unwrap();
        // Padded to the with-freeze length while the flag still says absent.
        data.resize(67, 0);
        let err = decode(&data).unwrap_err();
        assert!(err.to_string().contains("expects 35 bytes, got 67"));
    }

    #[test]
    fn decode_rejects_bad_presence_flag() {
        let mut data = encode_initialize_mint2(9, &AUTHORITY, None).unwrap();
        data[34] = 2;
        assert!(decode(&data).is_err());
    }

    #[test]
    fn decode_rejects_unknown_opcode_and_empty_input() {
        assert_eq!(
            decode(&[2]).unwrap_err(),
            TokenError::Encoding(EncodingError::UnknownOpcode(2))
        );
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn decode_rejects_out_of_range_decimals() {
        let mut data = encode_transfer_checked(5, 9).unwrap();
        data[9] = 12;
        assert!(decode(&data).is_err());
    }

    // -- Generic routine -----------------------------------------------------

    #[test]
    fn encode_fields_rejects_kind_mismatch() {
        let err = encode_fields(Opcode::MintTo, &[FieldValue::U8(1)]).unwrap_err();
        assert!(err.to_string().contains("MintTo.amount expects U64"));
    }

    #[test]
    fn encode_fields_rejects_arity_mismatch() {
        let err = encode_fields(Opcode::CloseAccount, &[FieldValue::U64(1)]).unwrap_err();
        assert!(err.to_string().contains("takes 0 fields, got 1"));
    }

    #[test]
    fn every_opcode_survives_pack_unpack() {
        let samples = [
            TokenInstruction::InitializeMint {
                decimals: 0,
                mint_authority: AUTHORITY,
                freeze_authority: None,
            },
            TokenInstruction::InitializeAccount,
            TokenInstruction::Transfer { amount: 1 },
            TokenInstruction::MintTo { amount: u64::MAX },
            TokenInstruction::Burn { amount: 77 },
            TokenInstruction::CloseAccount,
            TokenInstruction::TransferChecked {
                amount: 3,
                decimals: 4,
            },
            TokenInstruction::MintToChecked {
                amount: 5,
                decimals: 6,
            },
            TokenInstruction::InitializeAccount3 { owner: FREEZER },
            TokenInstruction::InitializeMint2 {
                decimals: 9,
                mint_authority: AUTHORITY,
                freeze_authority: Some(FREEZER),
            },
        ];

        let covered: Vec<Opcode> = samples.iter().map(TokenInstruction::opcode).collect();
        assert_eq!(covered, Opcode::ALL.to_vec());

        for ix in samples {
            let data = ix.pack().unwrap();
            assert_eq!(data[0], ix.opcode() as u8);
            assert_eq!(TokenInstruction::unpack(&data).unwrap(), ix);
        }
    }
}
