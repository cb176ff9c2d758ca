//! Opcode table of the token program.
//!
//! Each opcode carries the ordered list of payload fields the program reads
//! after the one-byte discriminator. Both the encoder and the decoder in
//! [`crate::codec`] walk these schemas, so the two paths cannot drift apart.
//!
//! | # | Instruction | Payload after the opcode byte |
//! |---|-------------|-------------------------------|
//! | 0 | InitializeMint | decimals u8, mint authority, freeze authority option |
//! | 1 | InitializeAccount | (none; owner is passed as an account) |
//! | 3 | Transfer | amount u64 |
//! | 7 | MintTo | amount u64 |
//! | 8 | Burn | amount u64 |
//! | 9 | CloseAccount | (none) |
//! | 12 | TransferChecked | amount u64, decimals u8 |
//! | 14 | MintToChecked | amount u64, decimals u8 |
//! | 18 | InitializeAccount3 | owner |
//! | 20 | InitializeMint2 | decimals u8, mint authority, freeze authority option |

use crate::error::EncodingError;

/// Wire encoding of one payload field. Integers are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U64,
    Pubkey,
    /// One presence byte (0 or 1), followed by 32 bytes only when present.
    OptionalPubkey,
}

impl FieldKind {
    /// Encoded width in bytes. `present` only matters for optional fields.
    pub const fn width(self, present: bool) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::U64 => 8,
            FieldKind::Pubkey => 32,
            FieldKind::OptionalPubkey => {
                if present {
                    33
                } else {
                    1
                }
            }
        }
    }
}

/// A named payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> Field {
    Field { name, kind }
}

const INITIALIZE_MINT_FIELDS: &[Field] = &[
    field("decimals", FieldKind::U8),
    field("mint_authority", FieldKind::Pubkey),
    field("freeze_authority", FieldKind::OptionalPubkey),
];
const AMOUNT_FIELDS: &[Field] = &[field("amount", FieldKind::U64)];
const CHECKED_AMOUNT_FIELDS: &[Field] = &[
    field("amount", FieldKind::U64),
    field("decimals", FieldKind::U8),
];
const OWNER_FIELDS: &[Field] = &[field("owner", FieldKind::Pubkey)];
const NO_FIELDS: &[Field] = &[];

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    InitializeMint = 0,
    InitializeAccount = 1,
    Transfer = 3,
    MintTo = 7,
    Burn = 8,
    CloseAccount = 9,
    TransferChecked = 12,
    MintToChecked = 14,
    InitializeAccount3 = 18,
    InitializeMint2 = 20,
}

impl Opcode {
    pub const ALL: [Opcode; 10] = [
        Opcode::InitializeMint,
        Opcode::InitializeAccount,
        Opcode::Transfer,
        Opcode::MintTo,
        Opcode::Burn,
        Opcode::CloseAccount,
        Opcode::TransferChecked,
        Opcode::MintToChecked,
        Opcode::InitializeAccount3,
        Opcode::InitializeMint2,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Opcode::InitializeMint => "InitializeMint",
            Opcode::InitializeAccount => "InitializeAccount",
            Opcode::Transfer => "Transfer",
            Opcode::MintTo => "MintTo",
            Opcode::Burn => "Burn",
            Opcode::CloseAccount => "CloseAccount",
            Opcode::TransferChecked => "TransferChecked",
            Opcode::MintToChecked => "MintToChecked",
            Opcode::InitializeAccount3 => "InitializeAccount3",
            Opcode::InitializeMint2 => "InitializeMint2",
        }
    }

    /// Payload fields following the opcode byte, in wire order.
    pub const fn schema(self) -> &'static [Field] {
        match self {
            Opcode::InitializeMint | Opcode::InitializeMint2 => INITIALIZE_MINT_FIELDS,
            Opcode::Transfer | Opcode::MintTo | Opcode::Burn => AMOUNT_FIELDS,
            Opcode::TransferChecked | Opcode::MintToChecked => CHECKED_AMOUNT_FIELDS,
            Opcode::InitializeAccount3 => OWNER_FIELDS,
            Opcode::InitializeAccount | Opcode::CloseAccount => NO_FIELDS,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .into_iter()
            .find(|op| *op as u8 == value)
            .ok_or(EncodingError::UnknownOpcode(value))
    }
}
