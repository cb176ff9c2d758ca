//! Token flows: each one builds instructions with `gorb_token`, assembles and
//! signs them into one transaction, then waits on the confirmation engine.
//!
//! Signers are passed as 32-byte Ed25519 seeds. The fee payer is always the
//! first signer of a flow.

use std::sync::Arc;

use gorb_token::{
    bytes_to_address, from_base_units, mint_space, pubkey_from_seed, sign_transaction, spl_token,
    to_base_units, Assembler, ExtensionType, Instruction, Keyed, MetadataPointer, Mint,
    ProgramConfig, Pubkey, TokenAccount, TokenError,
};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::confirm::{CancelFlag, ConfirmationConfig, ConfirmationEngine};
use crate::error::ClientError;
use crate::ledger::{AccountInfo, LedgerClient, Signature};

pub struct TokenClient<L, C> {
    ledger: Arc<L>,
    programs: ProgramConfig,
    engine: ConfirmationEngine<L, C>,
    cancel: CancelFlag,
}

impl<L: LedgerClient, C: Clock> TokenClient<L, C> {
    pub fn new(
        ledger: Arc<L>,
        clock: C,
        programs: ProgramConfig,
        confirmation: ConfirmationConfig,
    ) -> Self {
        let engine = ConfirmationEngine::new(Arc::clone(&ledger), clock, confirmation);
        Self {
            ledger,
            programs,
            engine,
            cancel: CancelFlag::new(),
        }
    }

    pub fn from_config(ledger: Arc<L>, clock: C, config: &ClientConfig) -> Self {
        Self::new(ledger, clock, config.programs, config.confirmation_config())
    }

    /// Share a cancel flag with the caller. Cancelling stops any confirmation
    /// in progress at its next attempt.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn programs(&self) -> &ProgramConfig {
        &self.programs
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn associated_token_address(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Pubkey, ClientError> {
        Ok(gorb_token::associated_token_address(&self.programs, owner, mint)?)
    }

    pub async fn get_mint(&self, mint: &Pubkey) -> Result<Keyed<Mint>, ClientError> {
        let info = self.token_program_account(mint).await?;
        Ok(Keyed::parse_mint(*mint, &info.data)?)
    }

    pub async fn get_token_account(
        &self,
        address: &Pubkey,
    ) -> Result<Keyed<TokenAccount>, ClientError> {
        let info = self.token_program_account(address).await?;
        Ok(Keyed::parse_token_account(*address, &info.data)?)
    }

    /// Every token account of `owner` under the configured token program.
    pub async fn get_token_accounts(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<Keyed<TokenAccount>>, ClientError> {
        let found = self
            .ledger
            .get_token_accounts_by_owner(owner, &self.programs.token_program_id)
            .await?;
        debug!(owner = %bytes_to_address(owner), count = found.len(), "token accounts by owner");

        let mut accounts = Vec::with_capacity(found.len());
        for (address, info) in found {
            accounts.push(Keyed::parse_token_account(address, &info.data)?);
        }
        Ok(accounts)
    }

    /// Native balance in lamports.
    pub async fn get_balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        Ok(self.ledger.get_balance(address).await?)
    }

    /// The mint's metadata pointer, if it carries one.
    pub async fn get_metadata_pointer(
        &self,
        mint: &Pubkey,
    ) -> Result<Option<MetadataPointer>, ClientError> {
        let info = self.token_program_account(mint).await?;
        Ok(MetadataPointer::from_mint_data(&info.data)?)
    }

    /// Raw balance of `owner`'s associated account for `mint`. A missing
    /// account holds zero.
    pub async fn get_token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<u64, ClientError> {
        let ata = self.associated_token_address(owner, mint)?;
        match self.get_token_account(&ata).await {
            Ok(keyed) => Ok(keyed.account.amount),
            Err(ClientError::AccountNotFound(_)) => {
                debug!(owner = %bytes_to_address(owner), "no associated token account, balance is zero");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Balance formatted with the mint's decimals, e.g. `"12.5"`.
    pub async fn get_ui_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<String, ClientError> {
        let decimals = self.get_mint(mint).await?.account.decimals;
        let raw = self.get_token_balance(owner, mint).await?;
        Ok(from_base_units(raw, decimals)?)
    }

    /// Convert a decimal string to raw units using the mint's decimals.
    pub async fn parse_ui_amount(&self, mint: &Pubkey, ui_amount: &str) -> Result<u64, ClientError> {
        let decimals = self.get_mint(mint).await?.account.decimals;
        Ok(to_base_units(ui_amount, decimals)?)
    }

    pub async fn has_mint_authority(
        &self,
        mint: &Pubkey,
        authority: &Pubkey,
    ) -> Result<bool, ClientError> {
        Ok(self.get_mint(mint).await?.account.is_mint_authority(authority))
    }

    // -----------------------------------------------------------------------
    // Flows
    // -----------------------------------------------------------------------

    /// Create and initialize a rent-exempt mint. The payer becomes the mint
    /// authority; `mint_seed` is the new mint's keypair.
    pub async fn create_mint(
        &self,
        payer_seed: &[u8; 32],
        mint_seed: &[u8; 32],
        decimals: u8,
        freeze_authority: Option<&Pubkey>,
    ) -> Result<(Pubkey, Signature), ClientError> {
        let payer = pubkey_from_seed(payer_seed);
        let mint = pubkey_from_seed(mint_seed);
        let lamports = self
            .ledger
            .get_minimum_balance_for_rent_exemption(Mint::LEN)
            .await?;

        info!(
            mint = %bytes_to_address(&mint),
            decimals,
            lamports,
            "creating mint"
        );

        let instructions = vec![
            spl_token::create_account(
                &self.programs,
                &payer,
                &mint,
                lamports,
                Mint::LEN as u64,
                &self.programs.token_program_id,
            ),
            spl_token::initialize_mint2(&self.programs, &mint, decimals, &payer, freeze_authority)?,
        ];

        let signature = self
            .send("create_mint", &[*payer_seed, *mint_seed], instructions)
            .await?;
        Ok((mint, signature))
    }

    /// Create a mint with a metadata pointer extension. The pointer names the
    /// payer as authority and the mint itself as metadata address. Requires
    /// a Token-2022 compatible token program.
    pub async fn create_mint_with_metadata_pointer(
        &self,
        payer_seed: &[u8; 32],
        mint_seed: &[u8; 32],
        decimals: u8,
        freeze_authority: Option<&Pubkey>,
    ) -> Result<(Pubkey, Signature), ClientError> {
        let payer = pubkey_from_seed(payer_seed);
        let mint = pubkey_from_seed(mint_seed);
        let space = mint_space(&[ExtensionType::MetadataPointer]);
        let lamports = self
            .ledger
            .get_minimum_balance_for_rent_exemption(space)
            .await?;

        info!(
            mint = %bytes_to_address(&mint),
            decimals,
            space,
            lamports,
            "creating mint with metadata pointer"
        );

        let instructions = vec![
            spl_token::create_account(
                &self.programs,
                &payer,
                &mint,
                lamports,
                space as u64,
                &self.programs.token_program_id,
            ),
            spl_token::initialize_metadata_pointer(
                &self.programs,
                &mint,
                Some(&payer),
                Some(&mint),
            )?,
            spl_token::initialize_mint2(&self.programs, &mint, decimals, &payer, freeze_authority)?,
        ];

        let signature = self
            .send(
                "create_mint_with_metadata_pointer",
                &[*payer_seed, *mint_seed],
                instructions,
            )
            .await?;
        Ok((mint, signature))
    }

    /// Ensure `owner`'s associated account for `mint` exists. Returns the
    /// address, plus a signature when a transaction was sent. The account is
    /// created with the plain `Create` instruction, after checking that it is
    /// missing.
    pub async fn create_associated_token_account(
        &self,
        payer_seed: &[u8; 32],
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<(Pubkey, Option<Signature>), ClientError> {
        let payer = pubkey_from_seed(payer_seed);
        let ata = self.associated_token_address(owner, mint)?;

        if self.ledger.get_account_info(&ata).await?.is_some() {
            debug!(ata = %bytes_to_address(&ata), "associated token account already exists");
            return Ok((ata, None));
        }

        info!(
            ata = %bytes_to_address(&ata),
            owner = %bytes_to_address(owner),
            "creating associated token account"
        );
        let instruction =
            spl_token::create_associated_token_account(&self.programs, &payer, owner, mint)?;
        let signature = self
            .send("create_associated_token_account", &[*payer_seed], vec![instruction])
            .await?;
        Ok((ata, Some(signature)))
    }

    /// Create a token account at a fresh keypair address, owned by `owner`.
    pub async fn create_token_account(
        &self,
        payer_seed: &[u8; 32],
        account_seed: &[u8; 32],
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<(Pubkey, Signature), ClientError> {
        let payer = pubkey_from_seed(payer_seed);
        let account = pubkey_from_seed(account_seed);
        let lamports = self
            .ledger
            .get_minimum_balance_for_rent_exemption(TokenAccount::LEN)
            .await?;

        info!(account = %bytes_to_address(&account), lamports, "creating token account");

        let instructions = vec![
            spl_token::create_account(
                &self.programs,
                &payer,
                &account,
                lamports,
                TokenAccount::LEN as u64,
                &self.programs.token_program_id,
            ),
            spl_token::initialize_account3(&self.programs, &account, mint, owner)?,
        ];

        let signature = self
            .send("create_token_account", &[*payer_seed, *account_seed], instructions)
            .await?;
        Ok((account, signature))
    }

    /// Mint `amount` raw units to `recipient`'s associated account. The
    /// authority pays fees. With `create_ata`, a missing recipient account is
    /// created in the same transaction.
    pub async fn mint_to(
        &self,
        authority_seed: &[u8; 32],
        mint: &Pubkey,
        recipient: &Pubkey,
        amount: u64,
        create_ata: bool,
    ) -> Result<Signature, ClientError> {
        let authority = pubkey_from_seed(authority_seed);
        if !self.has_mint_authority(mint, &authority).await? {
            return Err(TokenError::Validation(format!(
                "{} is not the mint authority of {}",
                bytes_to_address(&authority),
                bytes_to_address(mint)
            ))
            .into());
        }

        let destination = self.associated_token_address(recipient, mint)?;
        let mut instructions = Vec::with_capacity(2);
        if create_ata {
            instructions.extend(
                self.create_ata_if_missing(&authority, recipient, mint, &destination)
                    .await?,
            );
        }
        instructions.push(spl_token::mint_to(
            &self.programs,
            mint,
            &destination,
            &authority,
            u128::from(amount),
        )?);

        info!(
            mint = %bytes_to_address(mint),
            destination = %bytes_to_address(&destination),
            amount,
            "minting tokens"
        );
        self.send("mint_to", &[*authority_seed], instructions).await
    }

    /// Transfer `amount` raw units between the associated accounts of the
    /// signer and `recipient`. The sender pays fees. With `create_ata`, a
    /// missing recipient account is created in the same transaction.
    pub async fn transfer(
        &self,
        owner_seed: &[u8; 32],
        mint: &Pubkey,
        recipient: &Pubkey,
        amount: u64,
        create_ata: bool,
    ) -> Result<Signature, ClientError> {
        let owner = pubkey_from_seed(owner_seed);
        let source = self.associated_token_address(&owner, mint)?;
        let destination = self.associated_token_address(recipient, mint)?;

        let account = self.get_token_account(&source).await?.account;
        if account.is_frozen() {
            return Err(TokenError::Validation(format!(
                "source account {} is frozen",
                bytes_to_address(&source)
            ))
            .into());
        }
        if account.amount < amount {
            return Err(TokenError::Validation(format!(
                "insufficient balance: have {}, need {amount}",
                account.amount
            ))
            .into());
        }

        let mut instructions = Vec::with_capacity(2);
        if create_ata {
            instructions.extend(
                self.create_ata_if_missing(&owner, recipient, mint, &destination)
                    .await?,
            );
        }
        instructions.push(spl_token::transfer(
            &self.programs,
            &source,
            &destination,
            &owner,
            u128::from(amount),
        )?);

        info!(
            source = %bytes_to_address(&source),
            destination = %bytes_to_address(&destination),
            amount,
            "transferring tokens"
        );
        self.send("transfer", &[*owner_seed], instructions).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// `Create` for `ata` when the ledger does not hold it yet.
    async fn create_ata_if_missing(
        &self,
        payer: &Pubkey,
        owner: &Pubkey,
        mint: &Pubkey,
        ata: &Pubkey,
    ) -> Result<Option<Instruction>, ClientError> {
        if self.ledger.get_account_info(ata).await?.is_some() {
            debug!(ata = %bytes_to_address(ata), "recipient account exists");
            return Ok(None);
        }
        let instruction =
            spl_token::create_associated_token_account(&self.programs, payer, owner, mint)?;
        Ok(Some(instruction))
    }

    /// Fetch an account that must exist and belong to the token program.
    async fn token_program_account(&self, address: &Pubkey) -> Result<AccountInfo, ClientError> {
        let info = self
            .ledger
            .get_account_info(address)
            .await?
            .ok_or_else(|| ClientError::AccountNotFound(bytes_to_address(address)))?;

        if info.owner != self.programs.token_program_id {
            return Err(TokenError::MalformedAccount(format!(
                "{} is owned by {}, not the token program",
                bytes_to_address(address),
                bytes_to_address(&info.owner)
            ))
            .into());
        }
        Ok(info)
    }

    /// Assemble, sign and confirm. The first seed pays fees.
    async fn send(
        &self,
        flow: &'static str,
        seeds: &[[u8; 32]],
        instructions: Vec<Instruction>,
    ) -> Result<Signature, ClientError> {
        let signers: Vec<Pubkey> = seeds.iter().map(pubkey_from_seed).collect();
        let fee_payer = *signers
            .first()
            .ok_or_else(|| TokenError::Signing("no signers".into()))?;

        for (index, ix) in instructions.iter().enumerate() {
            debug!(
                flow,
                index,
                program = %bytes_to_address(&ix.program_id),
                data = %hex::encode(&ix.data),
                "instruction"
            );
        }

        let blockhash = self.ledger.get_latest_blockhash().await?;
        let message = Assembler::new(fee_payer, signers).compile(&instructions, &blockhash)?;
        let wire = sign_transaction(&message, seeds)?;

        debug!(flow, bytes = wire.len(), "signed transaction");
        self.engine
            .submit_and_confirm(&wire, &self.cancel)
            .await
            .into_result()
    }
}
