//! Token program primitives for Solana-compatible ledgers.
//!
//! This crate builds bit-exact instructions for a token program deployment,
//! derives associated token account addresses, decodes mint and token
//! account data and assembles signed transactions. Everything here is pure
//! and synchronous; talking to a ledger lives in `gorb-client`.
//!
//! Like the wire format, program ids are never hardcoded into builders:
//! pass a [`ProgramConfig`] for the deployment you target.

pub mod address;
pub mod amount;
pub mod codec;
pub mod config;
pub mod error;
pub mod extension;
pub mod opcode;
pub mod pda;
pub mod spl_token;
pub mod state;
pub mod transaction;

// Re-export key public types for ergonomic imports.
pub use address::{address_to_bytes, bytes_to_address, pubkey_from_seed, validate_address, Pubkey};
pub use amount::{from_base_units, to_base_units};
pub use codec::{decode, TokenInstruction, MAX_DECIMALS};
pub use config::ProgramConfig;
pub use error::{EncodingError, TokenError};
pub use extension::{mint_space, ExtensionType, MetadataPointer};
pub use opcode::Opcode;
pub use pda::{associated_token_address, derive, find_program_address};
pub use state::{AccountState, Keyed, Mint, TokenAccount};
pub use transaction::{
    deserialize_transaction, serialize_message, sign_transaction, transaction_signature,
    AccountMeta, Assembler, CompiledInstruction, Instruction, Message, RolePolicy,
};
