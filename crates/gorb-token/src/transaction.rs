//! Transaction assembly, wire format and signing.
//!
//! Transactions are built by hand, no `solana-sdk`. Wire layout:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```

use ed25519_dalek::Signer;
use zeroize::Zeroize;

use crate::address::{bytes_to_address, Pubkey};
use crate::error::TokenError;

/// Highest number of distinct accounts one message may reference.
pub const MAX_ACCOUNTS: usize = 255;

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` value in compact-u16 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decode a compact-u16 value, returning `(value, bytes_consumed)`.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), TokenError> {
    let mut value: u32 = 0;
    let mut consumed = 0usize;

    loop {
        let byte = *data.get(consumed).ok_or_else(|| {
            TokenError::Serialization("unexpected end of data while decoding compact-u16".into())
        })?;
        value |= ((byte & 0x7f) as u32) << (7 * consumed);
        consumed += 1;

        if byte & 0x80 == 0 || consumed >= 3 {
            break;
        }
    }

    u16::try_from(value)
        .map(|v| (v, consumed))
        .map_err(|_| TokenError::Serialization("compact-u16 value overflow".into()))
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A single account reference in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction before it is compiled into a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled instruction where account references are replaced by u8 indices
/// into the message's `account_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// A compiled message: the bytes every signer signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// All account keys in canonical order:
    ///   1. writable signers (fee payer first)
    ///   2. read-only signers
    ///   3. writable non-signers
    ///   4. read-only non-signers
    pub account_keys: Vec<Pubkey>,

    /// Number of required signatures (first N accounts are signers).
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned: u8,

    pub recent_blockhash: [u8; 32],

    /// Instructions in caller order.
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Keys that must sign, in signature-slot order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..self.num_required_signatures as usize]
    }

    pub fn is_writable(&self, index: usize) -> bool {
        let signers = self.num_required_signatures as usize;
        if index < signers {
            index < signers - self.num_readonly_signed as usize
        } else {
            index < self.account_keys.len() - self.num_readonly_unsigned as usize
        }
    }
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// How repeated references to one account are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolePolicy {
    /// Union the flags of every reference, as the runtime does.
    #[default]
    Merge,
    /// Every reference to an account must carry identical flags.
    Strict,
}

/// Compiles an ordered instruction list into one atomic [`Message`].
#[derive(Debug, Clone)]
pub struct Assembler {
    fee_payer: Pubkey,
    signers: Vec<Pubkey>,
    policy: RolePolicy,
}

struct AccountEntry {
    pubkey: Pubkey,
    is_signer: bool,
    is_writable: bool,
}

impl Assembler {
    /// `signers` must include the fee payer and every account an instruction
    /// flags as signer.
    ///
    /// The default policy is [`RolePolicy::Merge`]: an account referenced
    /// with different flags gets the union of them, as the runtime does.
    /// Use [`RolePolicy::Strict`] via [`Assembler::with_role_policy`] to
    /// reject such references instead.
    pub fn new(fee_payer: Pubkey, signers: impl IntoIterator<Item = Pubkey>) -> Self {
        let mut unique: Vec<Pubkey> = Vec::new();
        for key in signers {
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        Self {
            fee_payer,
            signers: unique,
            policy: RolePolicy::default(),
        }
    }

    pub fn with_role_policy(mut self, policy: RolePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn compile(
        &self,
        instructions: &[Instruction],
        recent_blockhash: &[u8; 32],
    ) -> Result<Message, TokenError> {
        self.validate(instructions)?;

        let mut entries: Vec<AccountEntry> = Vec::new();
        let mut upsert = |pubkey: Pubkey, signer: bool, writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
                entry.is_signer |= signer;
                entry.is_writable |= writable;
            } else {
                entries.push(AccountEntry {
                    pubkey,
                    is_signer: signer,
                    is_writable: writable,
                });
            }
        };

        upsert(self.fee_payer, true, true);
        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        if entries.len() > MAX_ACCOUNTS {
            return Err(TokenError::Validation(format!(
                "transaction references {} accounts, limit is {MAX_ACCOUNTS}",
                entries.len()
            )));
        }

        // Stable sort keeps first-seen order within a class, so the fee
        // payer stays at index 0.
        entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        let count = |f: fn(&AccountEntry) -> bool| entries.iter().filter(|e| f(e)).count() as u8;
        let num_required_signatures = count(|e| e.is_signer);
        let num_readonly_signed = count(|e| e.is_signer && !e.is_writable);
        let num_readonly_unsigned = count(|e| !e.is_signer && !e.is_writable);

        let account_keys: Vec<Pubkey> = entries.iter().map(|e| e.pubkey).collect();
        let index_of = |key: &Pubkey| -> Result<u8, TokenError> {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| TokenError::Validation("account not in account keys".into()))
        };

        let mut compiled = Vec::with_capacity(instructions.len());
        for ix in instructions {
            let account_indices = ix
                .accounts
                .iter()
                .map(|meta| index_of(&meta.pubkey))
                .collect::<Result<Vec<u8>, _>>()?;

            compiled.push(CompiledInstruction {
                program_id_index: index_of(&ix.program_id)?,
                account_indices,
                data: ix.data.clone(),
            });
        }

        Ok(Message {
            account_keys,
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            recent_blockhash: *recent_blockhash,
            instructions: compiled,
        })
    }

    fn validate(&self, instructions: &[Instruction]) -> Result<(), TokenError> {
        if instructions.is_empty() {
            return Err(TokenError::Validation("no instructions to assemble".into()));
        }
        if !self.signers.contains(&self.fee_payer) {
            return Err(TokenError::Validation(format!(
                "fee payer {} is not in the signer set",
                bytes_to_address(&self.fee_payer)
            )));
        }

        let program_ids: Vec<Pubkey> = instructions.iter().map(|ix| ix.program_id).collect();
        let mut seen: Vec<AccountMeta> = Vec::new();
        let mut used_signers: Vec<Pubkey> = vec![self.fee_payer];

        for (position, ix) in instructions.iter().enumerate() {
            for meta in &ix.accounts {
                let address = bytes_to_address(&meta.pubkey);

                if meta.is_writable && program_ids.contains(&meta.pubkey) {
                    return Err(TokenError::Validation(format!(
                        "instruction {position}: program {address} is referenced as writable"
                    )));
                }

                if meta.is_signer {
                    if !self.signers.contains(&meta.pubkey) {
                        return Err(TokenError::Validation(format!(
                            "instruction {position}: {address} must sign but is not in the signer set"
                        )));
                    }
                    used_signers.push(meta.pubkey);
                }

                match seen.iter().find(|m| m.pubkey == meta.pubkey) {
                    Some(prior)
                        if self.policy == RolePolicy::Strict
                            && (prior.is_signer != meta.is_signer
                                || prior.is_writable != meta.is_writable) =>
                    {
                        return Err(TokenError::Validation(format!(
                            "instruction {position}: {address} referenced with \
                             signer={} writable={}, earlier signer={} writable={}",
                            meta.is_signer, meta.is_writable, prior.is_signer, prior.is_writable
                        )));
                    }
                    Some(_) => {}
                    None => seen.push(*meta),
                }
            }
        }

        if let Some(unused) = self.signers.iter().find(|s| !used_signers.contains(s)) {
            return Err(TokenError::Validation(format!(
                "signer {} is not required by any instruction",
                bytes_to_address(unused)
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Serialize the message (the bytes that get signed).
pub fn serialize_message(message: &Message) -> Result<Vec<u8>, TokenError> {
    let mut buf = Vec::with_capacity(256);

    buf.push(message.num_required_signatures);
    buf.push(message.num_readonly_signed);
    buf.push(message.num_readonly_unsigned);

    buf.extend_from_slice(&encode_compact_u16(compact_len(message.account_keys.len())?));
    for key in &message.account_keys {
        buf.extend_from_slice(key);
    }

    buf.extend_from_slice(&message.recent_blockhash);

    buf.extend_from_slice(&encode_compact_u16(compact_len(message.instructions.len())?));
    for ix in &message.instructions {
        buf.push(ix.program_id_index);

        buf.extend_from_slice(&encode_compact_u16(compact_len(ix.account_indices.len())?));
        buf.extend_from_slice(&ix.account_indices);

        buf.extend_from_slice(&encode_compact_u16(compact_len(ix.data.len())?));
        buf.extend_from_slice(&ix.data);
    }

    Ok(buf)
}

fn compact_len(len: usize) -> Result<u16, TokenError> {
    u16::try_from(len)
        .map_err(|_| TokenError::Serialization(format!("length {len} exceeds compact-u16")))
}

/// Parse a message produced by [`serialize_message`].
pub fn deserialize_message(data: &[u8]) -> Result<Message, TokenError> {
    let mut reader = Reader { data, pos: 0 };

    let num_required_signatures = reader.byte()?;
    let num_readonly_signed = reader.byte()?;
    let num_readonly_unsigned = reader.byte()?;

    let num_accounts = reader.compact()?;
    let mut account_keys = Vec::with_capacity(num_accounts);
    for _ in 0..num_accounts {
        account_keys.push(reader.array::<32>()?);
    }
    let recent_blockhash = reader.array::<32>()?;

    let num_instructions = reader.compact()?;
    let mut instructions = Vec::with_capacity(num_instructions);
    for _ in 0..num_instructions {
        let program_id_index = reader.byte()?;
        let n = reader.compact()?;
        let account_indices = reader.bytes(n)?.to_vec();
        let n = reader.compact()?;
        let data = reader.bytes(n)?.to_vec();
        instructions.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data,
        });
    }

    if reader.pos != data.len() {
        return Err(TokenError::Serialization(format!(
            "{} trailing bytes after message",
            data.len() - reader.pos
        )));
    }
    if num_required_signatures as usize > account_keys.len() {
        return Err(TokenError::Serialization(
            "more required signatures than account keys".into(),
        ));
    }

    Ok(Message {
        account_keys,
        num_required_signatures,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash,
        instructions,
    })
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, n: usize) -> Result<&'a [u8], TokenError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.data.len());
        let end = end.ok_or_else(|| TokenError::Serialization("message truncated".into()))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn byte(&mut self) -> Result<u8, TokenError> {
        Ok(self.bytes(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], TokenError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn compact(&mut self) -> Result<usize, TokenError> {
        let (value, consumed) = decode_compact_u16(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value as usize)
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Sign `message` with every required signer and serialize the transaction.
///
/// `seeds` are 32-byte Ed25519 seeds, in any order. Each must belong to a
/// required signer and every required signer must be covered. Seed copies are
/// wiped before returning.
pub fn sign_transaction(message: &Message, seeds: &[[u8; 32]]) -> Result<Vec<u8>, TokenError> {
    let message_bytes = serialize_message(message)?;
    let signer_keys = message.signer_keys();
    let mut signatures: Vec<Option<[u8; 64]>> = vec![None; signer_keys.len()];

    for seed in seeds {
        let mut copy = *seed;
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&copy);
        copy.zeroize();

        let pubkey = signing_key.verifying_key().to_bytes();
        let slot = signer_keys.iter().position(|k| *k == pubkey).ok_or_else(|| {
            TokenError::Signing(format!(
                "{} is not a required signer",
                bytes_to_address(&pubkey)
            ))
        })?;
        signatures[slot] = Some(signing_key.sign(&message_bytes).to_bytes());
    }

    let mut wire = Vec::with_capacity(3 + 64 * signatures.len() + message_bytes.len());
    wire.extend_from_slice(&encode_compact_u16(compact_len(signatures.len())?));
    for (slot, signature) in signatures.iter().enumerate() {
        let signature = signature.ok_or_else(|| {
            TokenError::Signing(format!(
                "missing signature for {}",
                bytes_to_address(&signer_keys[slot])
            ))
        })?;
        wire.extend_from_slice(&signature);
    }
    wire.extend_from_slice(&message_bytes);

    Ok(wire)
}

/// Split a wire transaction into its signatures and message.
pub fn deserialize_transaction(wire: &[u8]) -> Result<(Vec<[u8; 64]>, Message), TokenError> {
    let (num_sigs, prefix) = decode_compact_u16(wire)?;
    if num_sigs == 0 {
        return Err(TokenError::Serialization(
            "transaction has zero signatures".into(),
        ));
    }

    let sigs_end = prefix + num_sigs as usize * 64;
    if sigs_end > wire.len() {
        return Err(TokenError::Serialization(
            "transaction too short: signature slots exceed length".into(),
        ));
    }

    let signatures = wire[prefix..sigs_end]
        .chunks_exact(64)
        .map(|chunk| {
            let mut sig = [0u8; 64];
            sig.copy_from_slice(chunk);
            sig
        })
        .collect();
    let message = deserialize_message(&wire[sigs_end..])?;

    if message.num_required_signatures as u16 != num_sigs {
        return Err(TokenError::Serialization(format!(
            "{num_sigs} signatures for {} required signers",
            message.num_required_signatures
        )));
    }

    Ok((signatures, message))
}

/// The transaction id: the fee payer's signature in Base58.
pub fn transaction_signature(wire: &[u8]) -> Result<String, TokenError> {
    let (signatures, _) = deserialize_transaction(wire)?;
    signatures
        .first()
        .map(|sig| bs58::encode(sig).into_string())
        .ok_or_else(|| TokenError::Serialization("transaction has zero signatures".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::pubkey_from_seed;

    const PROGRAM: Pubkey = [0x50; 32];
    const OTHER_PROGRAM: Pubkey = [0x60; 32];

    fn ix(program_id: Pubkey, accounts: Vec<AccountMeta>, data: &[u8]) -> Instruction {
        Instruction {
            program_id,
            accounts,
            data: data.to_vec(),
        }
    }

    // -- compact-u16 ---------------------------------------------------------

    #[test]
    fn compact_u16_boundaries() {
        assert_eq!(encode_compact_u16(0), vec![0x00]);
        assert_eq!(encode_compact_u16(0x7f), vec![0x7f]);
        assert_eq!(encode_compact_u16(128), vec![0x80, 0x01]);
        assert_eq!(encode_compact_u16(16383), vec![0xff, 0x7f]);
        assert_eq!(encode_compact_u16(16384), vec![0x80, 0x80, 0x01]);
        assert_eq!(encode_compact_u16(u16::MAX), vec![0xff, 0xff, 0x03]);
    }

    #[test]
    fn decode_compact_u16_roundtrip() {
        for value in [0u16, 1, 127, 128, 255, 256, 16383, 16384, 65535] {
            let encoded = encode_compact_u16(value);
            let (decoded, len) = decode_compact_u16(&encoded).unwrap();
            assert_eq!(decoded, value, "roundtrip failed for {value}");
            assert_eq!(len, encoded.len());
        }
    }

    #[test]
    fn decode_compact_u16_failures() {
        assert!(decode_compact_u16(&[]).is_err());
        assert!(decode_compact_u16(&[0x80]).is_err());
        assert!(decode_compact_u16(&[0xff, 0xff, 0x7f]).is_err());
    }

    // -- Compilation ---------------------------------------------------------

    #[test]
    fn canonical_account_order_with_fee_payer_first() {
        let payer = [1u8; 32];
        let authority = [2u8; 32];
        let target = [3u8; 32];
        let readonly = [4u8; 32];

        let instructions = vec![ix(
            PROGRAM,
            vec![
                AccountMeta::readonly(readonly, false),
                AccountMeta::writable(target, false),
                AccountMeta::readonly(authority, true),
            ],
            &[7],
        )];

        let message = Assembler::new(payer, [payer, authority])
            .compile(&instructions, &[0xAA; 32])
            .unwrap();

        assert_eq!(
            message.account_keys,
            vec![payer, authority, target, readonly, PROGRAM]
        );
        assert_eq!(message.num_required_signatures, 2);
        assert_eq!(message.num_readonly_signed, 1);
        assert_eq!(message.num_readonly_unsigned, 2);
        assert_eq!(message.instructions[0].program_id_index, 4);
        assert_eq!(message.instructions[0].account_indices, vec![3, 2, 1]);
        assert!(message.is_writable(0));
        assert!(!message.is_writable(1));
        assert!(message.is_writable(2));
        assert!(!message.is_writable(3));
    }

    #[test]
    fn instruction_order_is_preserved() {
        let payer = [1u8; 32];
        let instructions = vec![
            ix(OTHER_PROGRAM, vec![AccountMeta::writable(payer, true)], &[1]),
            ix(PROGRAM, vec![AccountMeta::writable([9; 32], false)], &[2]),
            ix(OTHER_PROGRAM, vec![], &[3]),
        ];

        let message = Assembler::new(payer, [payer])
            .compile(&instructions, &[0; 32])
            .unwrap();

        let data: Vec<&[u8]> = message.instructions.iter().map(|c| c.data.as_slice()).collect();
        assert_eq!(data, vec![&[1u8][..], &[2], &[3]]);
    }

    #[test]
    fn merge_policy_unions_flags() {
        let payer = [1u8; 32];
        let shared = [5u8; 32];
        let instructions = vec![
            ix(PROGRAM, vec![AccountMeta::readonly(shared, false)], &[]),
            ix(PROGRAM, vec![AccountMeta::writable(shared, false)], &[]),
        ];

        let message = Assembler::new(payer, [payer])
            .compile(&instructions, &[0; 32])
            .unwrap();

        let index = message.account_keys.iter().position(|k| *k == shared).unwrap();
        assert!(message.is_writable(index));
        assert_eq!(message.account_keys.len(), 3);
    }

    #[test]
    fn strict_policy_rejects_inconsistent_flags() {
        let payer = [1u8; 32];
        let shared = [5u8; 32];
        let instructions = vec![
            ix(PROGRAM, vec![AccountMeta::readonly(shared, false)], &[]),
            ix(PROGRAM, vec![AccountMeta::writable(shared, false)], &[]),
        ];

        let err = Assembler::new(payer, [payer])
            .with_role_policy(RolePolicy::Strict)
            .compile(&instructions, &[0; 32])
            .unwrap_err();

        assert!(matches!(err, TokenError::Validation(_)));
        assert!(err.to_string().contains("instruction 1"));
    }

    #[test]
    fn default_policy_merges_mixed_flags() {
        assert!(RolePolicy::default() == RolePolicy::Merge);

        let payer = [1u8; 32];
        let shared = [5u8; 32];
        let instructions = vec![
            ix(PROGRAM, vec![AccountMeta::writable(shared, false)], &[]),
            ix(PROGRAM, vec![AccountMeta::readonly(shared, false)], &[]),
        ];

        let default = Assembler::new(payer, [payer]).compile(&instructions, &[0; 32]);
        let merged = Assembler::new(payer, [payer])
            .with_role_policy(RolePolicy::Merge)
            .compile(&instructions, &[0; 32]);
        assert_eq!(default.unwrap(), merged.unwrap());
    }

    #[test]
    fn rejects_writable_program_account() {
        let payer = [1u8; 32];
        let instructions = vec![
            ix(PROGRAM, vec![AccountMeta::writable(OTHER_PROGRAM, false)], &[]),
            ix(OTHER_PROGRAM, vec![], &[]),
        ];

        let err = Assembler::new(payer, [payer])
            .compile(&instructions, &[0; 32])
            .unwrap_err();
        assert!(err.to_string().contains("referenced as writable"));
    }

    #[test]
    fn rejects_signer_missing_from_set() {
        let payer = [1u8; 32];
        let instructions = vec![ix(PROGRAM, vec![AccountMeta::readonly([2; 32], true)], &[])];

        let err = Assembler::new(payer, [payer])
            .compile(&instructions, &[0; 32])
            .unwrap_err();
        assert!(err.to_string().contains("not in the signer set"));
    }

    #[test]
    fn rejects_unused_signer() {
        let payer = [1u8; 32];
        let instructions = vec![ix(PROGRAM, vec![], &[])];

        let err = Assembler::new(payer, [payer, [2; 32]])
            .compile(&instructions, &[0; 32])
            .unwrap_err();
        assert!(err.to_string().contains("not required by any instruction"));
    }

    #[test]
    fn rejects_fee_payer_outside_signer_set() {
        let err = Assembler::new([1; 32], [[2; 32]])
            .compile(&[ix(PROGRAM, vec![], &[])], &[0; 32])
            .unwrap_err();
        assert!(err.to_string().contains("fee payer"));
    }

    #[test]
    fn rejects_empty_instruction_list() {
        let err = Assembler::new([1; 32], [[1; 32]])
            .compile(&[], &[0; 32])
            .unwrap_err();
        assert_eq!(
            err,
            TokenError::Validation("no instructions to assemble".into())
        );
    }

    #[test]
    fn rejects_too_many_accounts() {
        let payer = [0u8; 32];
        let accounts = (1..=255u8)
            .map(|i| {
                let mut key = [0u8; 32];
                key[0] = i;
                key[1] = 1;
                AccountMeta::writable(key, false)
            })
            .collect();

        let err = Assembler::new(payer, [payer])
            .compile(&[ix(PROGRAM, accounts, &[])], &[0; 32])
            .unwrap_err();
        assert!(err.to_string().contains("257 accounts"));
    }

    // -- Serialization -------------------------------------------------------

    #[test]
    fn message_serialize_deserialize() {
        let payer = [1u8; 32];
        let instructions = vec![ix(
            PROGRAM,
            vec![AccountMeta::writable(payer, true), AccountMeta::writable([2; 32], false)],
            &[3, 1, 2, 3],
        )];
        let message = Assembler::new(payer, [payer])
            .compile(&instructions, &[0xCC; 32])
            .unwrap();

        let bytes = serialize_message(&message).unwrap();
        assert_eq!(&bytes[..3], &[1, 0, 1]);
        let offset = 3 + 1 + 32 * message.account_keys.len();
        assert_eq!(&bytes[offset..offset + 32], &[0xCC; 32]);

        assert_eq!(deserialize_message(&bytes).unwrap(), message);

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(deserialize_message(&trailing).is_err());
        assert!(deserialize_message(&bytes[..bytes.len() - 1]).is_err());
    }

    // -- Signing -------------------------------------------------------------

    #[test]
    fn sign_with_two_signers_in_any_order() {
        use ed25519_dalek::{Signature, VerifyingKey};

        let payer_seed = [0x42u8; 32];
        let account_seed = [0x43u8; 32];
        let payer = pubkey_from_seed(&payer_seed);
        let new_account = pubkey_from_seed(&account_seed);

        let instructions = vec![ix(
            PROGRAM,
            vec![
                AccountMeta::writable(payer, true),
                AccountMeta::writable(new_account, true),
            ],
            &[0],
        )];
        let message = Assembler::new(payer, [payer, new_account])
            .compile(&instructions, &[0x99; 32])
            .unwrap();

        let wire = sign_transaction(&message, &[account_seed, payer_seed]).unwrap();
        assert_eq!(wire[0], 2);

        let (signatures, parsed) = deserialize_transaction(&wire).unwrap();
        assert_eq!(parsed, message);

        let message_bytes = serialize_message(&message).unwrap();
        for (key, sig) in message.signer_keys().iter().zip(&signatures) {
            let vk = VerifyingKey::from_bytes(key).unwrap();
            assert!(vk
                .verify_strict(&message_bytes, &Signature::from_bytes(sig))
                .is_ok());
        }

        assert_eq!(
            transaction_signature(&wire).unwrap(),
            bs58::encode(signatures[0]).into_string()
        );
    }

    #[test]
    fn sign_is_deterministic() {
        let seed = [0x55u8; 32];
        let payer = pubkey_from_seed(&seed);
        let message = Assembler::new(payer, [payer])
            .compile(&[ix(PROGRAM, vec![], &[1])], &[0x77; 32])
            .unwrap();

        assert_eq!(
            sign_transaction(&message, &[seed]).unwrap(),
            sign_transaction(&message, &[seed]).unwrap()
        );
    }

    #[test]
    fn sign_rejects_missing_and_foreign_seeds() {
        let payer_seed = [0x11u8; 32];
        let other_seed = [0x22u8; 32];
        let payer = pubkey_from_seed(&payer_seed);
        let other = pubkey_from_seed(&other_seed);

        let message = Assembler::new(payer, [payer, other])
            .compile(
                &[ix(PROGRAM, vec![AccountMeta::readonly(other, true)], &[])],
                &[0; 32],
            )
            .unwrap();

        let err = sign_transaction(&message, &[payer_seed]).unwrap_err();
        assert!(err.to_string().contains("missing signature"));

        let err = sign_transaction(&message, &[payer_seed, other_seed, [0x33; 32]]).unwrap_err();
        assert!(err.to_string().contains("not a required signer"));
    }

    #[test]
    fn deserialize_transaction_failures() {
        assert!(deserialize_transaction(&[]).is_err());
        assert!(deserialize_transaction(&[0x01]).is_err());
        let err = deserialize_transaction(&[0x00, 0x01, 0x00, 0x00]).unwrap_err();
        assert!(err.to_string().contains("zero signatures"));
    }
}
