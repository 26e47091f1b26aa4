use async_trait::async_trait;
use solana_address::Address;
use tracing::{debug, instrument};

use crate::{
    accounts::{AllocationType, EnrichmentInputs, MemberKey, Squad, SquadAccount},
    constants::{encode_address, TOKEN_PROGRAM_ID},
    errors::{SquadsError, UpstreamError},
    token_layouts::{unpack_mint, unpack_token_account},
};

/// Data the squad enrichment needs from the network.
///
/// Implementations report their own failures as [`UpstreamError`]; they are
/// never retried here.
#[async_trait]
pub trait SquadsRpc: Send + Sync {
    /// Raw account bytes, or `None` if the account does not exist.
    async fn fetch_raw_buffer(&self, address: &Address) -> Result<Option<Vec<u8>>, UpstreamError>;

    /// Raw account bytes for several accounts, aligned with `addresses`.
    async fn fetch_raw_buffers(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<Option<Vec<u8>>>, UpstreamError> {
        let mut buffers = Vec::with_capacity(addresses.len());
        for address in addresses {
            buffers.push(self.fetch_raw_buffer(address).await?);
        }
        Ok(buffers)
    }

    /// Total supply of a mint, or `None` if it could not be resolved.
    async fn fetch_supply(&self, mint: &Address) -> Result<Option<u64>, UpstreamError>;

    /// Token balances aligned with `token_accounts`, in one round-trip.
    async fn fetch_balances(&self, token_accounts: &[Address]) -> Result<Vec<u64>, UpstreamError>;

    /// Lamport balance of any account.
    async fn fetch_balance(&self, address: &Address) -> Result<u64, UpstreamError>;
}

/// Gathers everything [`SquadAccount::enrich_with`] needs.
///
/// For balance-weighted squads the mint supply is resolved before member
/// balances are requested. The treasury balance is fetched alongside. Any
/// collaborator failure fails the whole call.
pub async fn resolve_inputs<R: SquadsRpc + ?Sized>(
    rpc: &R,
    account: &SquadAccount,
    program_id: &Address,
) -> Result<EnrichmentInputs, SquadsError> {
    let keys = account.member_keys()?;
    let treasury = account.treasury_address(program_id);

    let treasury_balance = async {
        rpc.fetch_balance(&treasury)
            .await
            .map_err(SquadsError::upstream("fetch_balance"))
    };
    let ((supply, member_balances), treasury_lamports) = futures::try_join!(
        resolve_weights(rpc, account, &keys),
        treasury_balance
    )?;

    debug!(
        treasury = %encode_address(&treasury),
        treasury_lamports,
        supply = ?supply,
        members = keys.len(),
        "resolved enrichment inputs"
    );
    Ok(EnrichmentInputs {
        treasury,
        treasury_lamports,
        supply,
        member_balances,
    })
}

async fn resolve_weights<R: SquadsRpc + ?Sized>(
    rpc: &R,
    account: &SquadAccount,
    keys: &[MemberKey],
) -> Result<(Option<u64>, Vec<u64>), SquadsError> {
    if account.allocation_type == AllocationType::FixedWeight {
        return Ok((None, Vec::new()));
    }

    let supply = rpc
        .fetch_supply(&account.mint)
        .await
        .map_err(SquadsError::upstream("fetch_supply"))?;
    if supply.is_none() || keys.is_empty() {
        return Ok((supply, Vec::new()));
    }

    let token_accounts: Vec<Address> = keys.iter().map(|key| key.token_account).collect();
    let balances = rpc
        .fetch_balances(&token_accounts)
        .await
        .map_err(SquadsError::upstream("fetch_balances"))?;
    Ok((supply, balances))
}

/// Resolves external data for `account` and returns the enriched squad.
#[instrument(skip_all, fields(squad = %encode_address(&account.public_key)))]
pub async fn enrich<R: SquadsRpc + ?Sized>(
    rpc: &R,
    account: &SquadAccount,
    program_id: &Address,
) -> Result<Squad, SquadsError> {
    let inputs = resolve_inputs(rpc, account, program_id).await?;
    account.enrich_with(inputs)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: Address,
    pub data: Vec<u8>,
}

/// Plain account reads, the surface a JSON-RPC client exposes.
#[async_trait]
pub trait AccountFetcher: Send + Sync {
    async fn get_account_info(
        &self,
        address: &Address,
    ) -> Result<Option<AccountInfo>, UpstreamError>;

    async fn get_multiple_accounts(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<Option<AccountInfo>>, UpstreamError>;

    async fn get_balance(&self, address: &Address) -> Result<u64, UpstreamError>;
}

/// [`SquadsRpc`] on top of an [`AccountFetcher`], parsing mints and token
/// accounts locally.
#[derive(Debug, Clone)]
pub struct AccountRpc<F> {
    fetcher: F,
    token_program: Address,
}

impl<F: AccountFetcher> AccountRpc<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            token_program: TOKEN_PROGRAM_ID,
        }
    }

    pub fn with_token_program(mut self, token_program: Address) -> Self {
        self.token_program = token_program;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

#[async_trait]
impl<F: AccountFetcher> SquadsRpc for AccountRpc<F> {
    async fn fetch_raw_buffer(&self, address: &Address) -> Result<Option<Vec<u8>>, UpstreamError> {
        Ok(self
            .fetcher
            .get_account_info(address)
            .await?
            .map(|info| info.data))
    }

    async fn fetch_raw_buffers(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<Option<Vec<u8>>>, UpstreamError> {
        let infos = self.fetcher.get_multiple_accounts(addresses).await?;
        Ok(infos
            .into_iter()
            .map(|info| info.map(|info| info.data))
            .collect())
    }

    async fn fetch_supply(&self, mint: &Address) -> Result<Option<u64>, UpstreamError> {
        let Some(info) = self.fetcher.get_account_info(mint).await? else {
            return Ok(None);
        };
        let mint = unpack_mint(Some(&info), *mint, &self.token_program)?;
        Ok(Some(mint.supply))
    }

    async fn fetch_balances(&self, token_accounts: &[Address]) -> Result<Vec<u64>, UpstreamError> {
        let infos = self.fetcher.get_multiple_accounts(token_accounts).await?;
        let mut balances = Vec::with_capacity(token_accounts.len());
        for (index, address) in token_accounts.iter().enumerate() {
            let info = infos.get(index).and_then(Option::as_ref);
            let account = unpack_token_account(info, *address, &self.token_program)?;
            balances.push(account.amount);
        }
        Ok(balances)
    }

    async fn fetch_balance(&self, address: &Address) -> Result<u64, UpstreamError> {
        self.fetcher.get_balance(address).await
    }
}
