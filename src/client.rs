use futures::future::try_join_all;
use solana_address::Address;
use tracing::{debug, instrument, warn};

use crate::{
    accounts::{Squad, SquadAccount},
    config::ClientConfig,
    constants::{encode_address, short_address},
    errors::SquadsError,
    rpc::{enrich, SquadsRpc},
};

/// Reads squads through a [`SquadsRpc`] and returns them enriched.
#[derive(Debug, Clone)]
pub struct SquadsClient<R> {
    rpc: R,
    config: ClientConfig,
}

impl<R: SquadsRpc> SquadsClient<R> {
    pub fn new(rpc: R, config: ClientConfig) -> Self {
        Self { rpc, config }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[instrument(skip_all, fields(squad = %encode_address(address)))]
    pub async fn get_squad(&self, address: &Address) -> Result<Squad, SquadsError> {
        let data = self
            .rpc
            .fetch_raw_buffer(address)
            .await
            .map_err(SquadsError::upstream("fetch_raw_buffer"))?
            .ok_or_else(|| not_found(address))?;
        let account = SquadAccount::decode(&data, *address)?;
        enrich(&self.rpc, &account, &self.config.program_id).await
    }

    /// Fetches all accounts in one batch, then enriches them concurrently.
    /// The result is in the order of `addresses`; one missing account fails
    /// the whole call.
    #[instrument(skip_all, fields(count = addresses.len()))]
    pub async fn get_squads(&self, addresses: &[Address]) -> Result<Vec<Squad>, SquadsError> {
        let buffers = self
            .rpc
            .fetch_raw_buffers(addresses)
            .await
            .map_err(SquadsError::upstream("fetch_raw_buffers"))?;
        if buffers.len() != addresses.len() {
            return Err(SquadsError::AccountCountMismatch {
                expected: addresses.len(),
                actual: buffers.len(),
            });
        }

        let accounts = addresses
            .iter()
            .zip(buffers)
            .map(|(address, data)| {
                let data = data.ok_or_else(|| not_found(address))?;
                SquadAccount::decode(&data, *address)
            })
            .collect::<Result<Vec<_>, SquadsError>>()?;
        debug!(decoded = accounts.len(), "decoded squad accounts");

        let program_id = self.config.program_id;
        try_join_all(
            accounts
                .iter()
                .map(|account| enrich(&self.rpc, account, &program_id)),
        )
        .await
    }
}

fn not_found(address: &Address) -> SquadsError {
    warn!(squad = %encode_address(address), "squad account not found");
    SquadsError::AccountNotFound {
        prefix: short_address(address),
    }
}
