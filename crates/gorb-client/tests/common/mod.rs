//! In-memory ledger with scripted status replies.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use gorb_client::{
    AccountInfo, CancelFlag, Clock, Commitment, LedgerClient, LedgerError, ManualClock,
    ProgramRejection, Signature, SignatureStatus,
};
use gorb_token::{transaction_signature, Mint, ProgramConfig, Pubkey, TokenAccount};

pub const BLOCKHASH: [u8; 32] = [0xAB; 32];

/// One reply to `get_signature_status`.
#[derive(Debug, Clone)]
pub enum StatusReply {
    /// The ledger has not seen the signature.
    Unknown,
    At(Commitment),
    ProgramError(serde_json::Value),
    /// Program error reported through the error channel.
    RejectedCall(serde_json::Value),
    Transport,
}

pub struct ScriptedLedger {
    accounts: Mutex<HashMap<Pubkey, AccountInfo>>,
    replies: Mutex<VecDeque<StatusReply>>,
    /// Reply once the script runs out.
    fallback: StatusReply,
    submit_error: Mutex<Option<LedgerError>>,
    sent: Mutex<Vec<Vec<u8>>>,
    status_queries: AtomicU32,
    query_times: Mutex<Vec<Duration>>,
    clock: Option<ManualClock>,
    cancel_at: Mutex<Option<(u32, CancelFlag)>>,
}

impl ScriptedLedger {
    pub fn new(fallback: StatusReply) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            replies: Mutex::new(VecDeque::new()),
            fallback,
            submit_error: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            status_queries: AtomicU32::new(0),
            query_times: Mutex::new(Vec::new()),
            clock: None,
            cancel_at: Mutex::new(None),
        }
    }

    /// Always confirmed on the first query.
    pub fn confirming() -> Self {
        Self::new(StatusReply::At(Commitment::Confirmed))
    }

    /// Record the clock reading of every status query.
    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn script(&self, replies: impl IntoIterator<Item = StatusReply>) {
        self.replies.lock().unwrap().extend(replies);
    }

    pub fn fail_submit(&self, error: LedgerError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }

    /// Set `flag` while answering the `query`-th status request.
    pub fn cancel_on_query(&self, query: u32, flag: CancelFlag) {
        *self.cancel_at.lock().unwrap() = Some((query, flag));
    }

    pub fn put_account(&self, address: Pubkey, info: AccountInfo) {
        self.accounts.lock().unwrap().insert(address, info);
    }

    pub fn put_mint(&self, programs: &ProgramConfig, address: Pubkey, mint: Mint) {
        self.put_account(
            address,
            AccountInfo {
                lamports: rent_for(Mint::LEN),
                owner: programs.token_program_id,
                data: mint.pack().to_vec(),
                executable: false,
            },
        );
    }

    pub fn put_token_account(&self, programs: &ProgramConfig, address: Pubkey, account: TokenAccount) {
        self.put_account(
            address,
            AccountInfo {
                lamports: rent_for(TokenAccount::LEN),
                owner: programs.token_program_id,
                data: account.pack().to_vec(),
                executable: false,
            },
        );
    }

    pub fn status_queries(&self) -> u32 {
        self.status_queries.load(Ordering::SeqCst)
    }

    pub fn query_times(&self) -> Vec<Duration> {
        self.query_times.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

/// Two years of rent at the default rate, plus account overhead.
pub fn rent_for(size: usize) -> u64 {
    (size as u64 + 128) * 3_480 * 2
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountInfo>, LedgerError> {
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<Signature, LedgerError> {
        if let Some(error) = self.submit_error.lock().unwrap().clone() {
            return Err(error);
        }
        let signature =
            transaction_signature(wire).map_err(|e| LedgerError::Transport(e.to_string()))?;
        self.sent.lock().unwrap().push(wire.to_vec());
        Ok(Signature(signature))
    }

    async fn get_signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        let query = self.status_queries.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(clock) = &self.clock {
            self.query_times.lock().unwrap().push(clock.now());
        }
        if let Some((at, flag)) = self.cancel_at.lock().unwrap().as_ref() {
            if *at == query {
                flag.cancel();
            }
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            StatusReply::Unknown => Ok(None),
            StatusReply::At(commitment) => Ok(Some(SignatureStatus {
                commitment,
                err: None,
            })),
            StatusReply::ProgramError(payload) => Ok(Some(SignatureStatus {
                commitment: Commitment::Processed,
                err: Some(ProgramRejection::new(payload)),
            })),
            StatusReply::RejectedCall(payload) => {
                Err(LedgerError::Rejected(ProgramRejection::new(payload)))
            }
            StatusReply::Transport => Err(LedgerError::Transport("connection reset".into())),
        }
    }

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], LedgerError> {
        Ok(BLOCKHASH)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, size: usize) -> Result<u64, LedgerError> {
        Ok(rent_for(size))
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        program_id: &Pubkey,
    ) -> Result<Vec<(Pubkey, AccountInfo)>, LedgerError> {
        let mut found: Vec<(Pubkey, AccountInfo)> = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, info)| {
                info.owner == *program_id
                    && info.data.len() >= TokenAccount::LEN
                    && info.data[32..64] == owner[..]
            })
            .map(|(address, info)| (*address, info.clone()))
            .collect();
        found.sort_by_key(|(address, _)| *address);
        Ok(found)
    }
}

pub const PAYER_SEED: [u8; 32] = [0x42; 32];

/// A signed single-transfer transaction.
pub fn sample_wire() -> Vec<u8> {
    let programs = ProgramConfig::gorbchain();
    let payer = gorb_token::pubkey_from_seed(&PAYER_SEED);
    let instruction =
        gorb_token::spl_token::transfer(&programs, &[0x01; 32], &[0x02; 32], &payer, 5).unwrap();
    let message = gorb_token::Assembler::new(payer, [payer])
        .compile(&[instruction], &BLOCKHASH)
        .unwrap();
    gorb_token::sign_transaction(&message, &[PAYER_SEED]).unwrap()
}
