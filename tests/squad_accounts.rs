use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use solana_address::Address;

use squads_state::{
    account_layouts::{RAW_MEMBERS_LEN, SQUAD_ACCOUNT_LEN},
    codec::{Codec, PublicKeyId, U32, U64, U8},
    constants::{derive_squad_sol_account, LAMPORTS_PER_SOL, SQUADS_PROGRAM_ID, TOKEN_PROGRAM_ID},
    errors::UpstreamError,
    token_layouts::{MINT_LEN, TOKEN_ACCOUNT_LEN},
    AccountFetcher, AccountInfo, AccountRpc, AllocationType, ClientConfig, SquadAccount,
    SquadsClient, SquadsError, VotingPower,
};

const ALLOCATION_TYPE_OFFSET: usize = 3;
const CORE_THRESHOLD_OFFSET: usize = 6;
const MINT_OFFSET: usize = 110;
const CREATED_ON_OFFSET: usize = 338;
const RAW_MEMBERS_BYTE_LENGTH_OFFSET: usize = 346;
const RAW_MEMBERS_OFFSET: usize = 354;

#[derive(Default)]
struct MemoryFetcher {
    accounts: HashMap<Address, AccountInfo>,
    requests: Mutex<Vec<String>>,
    fail_balance: bool,
}

impl MemoryFetcher {
    fn insert(&mut self, address: Address, owner: Address, data: Vec<u8>) {
        self.accounts.insert(
            address,
            AccountInfo {
                lamports: 1_000_000,
                owner,
                data,
            },
        );
    }

    fn record(&self, request: impl Into<String>) {
        self.requests.lock().expect("requests lock").push(request.into());
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl AccountFetcher for MemoryFetcher {
    async fn get_account_info(
        &self,
        address: &Address,
    ) -> Result<Option<AccountInfo>, UpstreamError> {
        self.record(format!("account:{}", address.as_ref()[0]));
        Ok(self.accounts.get(address).cloned())
    }

    async fn get_multiple_accounts(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<Option<AccountInfo>>, UpstreamError> {
        self.record(format!("multiple:{}", addresses.len()));
        Ok(addresses
            .iter()
            .map(|address| self.accounts.get(address).cloned())
            .collect())
    }

    async fn get_balance(&self, address: &Address) -> Result<u64, UpstreamError> {
        self.record("balance");
        if self.fail_balance {
            return Err("node is behind".into());
        }
        Ok(self.accounts.get(address).map_or(0, |info| info.lamports))
    }
}

#[tokio::test]
async fn fixed_weight_squad_with_one_member_needs_no_balance_lookup() {
    let squad_key = key(1);
    let member = key(10);
    let mut data = vec![0u8; SQUAD_ACCOUNT_LEN];
    data[0] = 1;
    data[ALLOCATION_TYPE_OFFSET] = 2;
    U32.encode(&(4 + 64), &mut data, RAW_MEMBERS_BYTE_LENGTH_OFFSET)
        .expect("used length");
    PublicKeyId
        .encode(&member, &mut data, RAW_MEMBERS_OFFSET)
        .expect("member key");
    PublicKeyId
        .encode(&key(20), &mut data, RAW_MEMBERS_OFFSET + 32)
        .expect("token account key");

    let mut fetcher = MemoryFetcher::default();
    fetcher.insert(squad_key, SQUADS_PROGRAM_ID, data);
    let client = SquadsClient::new(AccountRpc::new(fetcher), ClientConfig::default());

    let squad = client.get_squad(&squad_key).await.expect("fixed-weight squad");

    assert_eq!(squad.account.allocation_type, AllocationType::FixedWeight);
    assert_eq!(squad.members.len(), 1);
    assert_eq!(squad.members[0].public_key, member);
    assert_eq!(squad.members[0].token_account, key(20));
    assert_eq!(squad.members[0].voting_power, VotingPower::ONE);
    assert!(squad.members[0].is_core);
    assert!(squad.has_member(&member));
    assert!(!squad.has_member(&key(20)));
    assert_eq!(squad.mint_supply, None);
    // the squad itself, then the treasury balance; no mint or token accounts
    assert_eq!(
        client.rpc().fetcher().requests(),
        vec!["account:1".to_string(), "balance".to_string()]
    );
}

#[tokio::test]
async fn balance_weighted_squad_resolves_supply_and_member_tokens() {
    let squad_key = key(1);
    let mint = key(3);
    let mut fetcher = MemoryFetcher::default();
    fetcher.insert(
        squad_key,
        SQUADS_PROGRAM_ID,
        squad_data(1, 15, mint, &[(10, 20), (11, 21), (12, 22)]),
    );
    fetcher.insert(mint, TOKEN_PROGRAM_ID, mint_data(120_000));
    fetcher.insert(key(20), TOKEN_PROGRAM_ID, token_account_data(mint, key(10), 20_000));
    fetcher.insert(key(21), TOKEN_PROGRAM_ID, token_account_data(mint, key(11), 29));
    fetcher.insert(key(22), TOKEN_PROGRAM_ID, token_account_data(mint, key(12), 99_971));
    let (treasury, _) = derive_squad_sol_account(&squad_key, &SQUADS_PROGRAM_ID);
    fetcher.accounts.insert(
        treasury,
        AccountInfo {
            lamports: 2_500_000_000,
            owner: Address::new_from_array([0; 32]),
            data: Vec::new(),
        },
    );
    let client = SquadsClient::new(AccountRpc::new(fetcher), ClientConfig::default());

    let squad = client.get_squad(&squad_key).await.expect("balance-weighted squad");

    let powers: Vec<String> = squad
        .members
        .iter()
        .map(|member| member.voting_power.to_string())
        .collect();
    assert_eq!(powers, ["16.67", "0.02", "83.31"]);
    let core: Vec<bool> = squad.members.iter().map(|member| member.is_core).collect();
    assert_eq!(core, [true, false, true]);
    assert_eq!(squad.core_members().count(), 2);
    assert_eq!(squad.mint_supply, Some(120_000));
    assert_eq!(squad.treasury, treasury);
    assert_eq!(squad.sol_balance_lamports, 2_500_000_000);
    assert_eq!(squad.sol_balance(), 2_500_000_000.0 / LAMPORTS_PER_SOL as f64);
    assert_eq!(squad.created_on.map(|at| at.timestamp()), Some(1_650_000_000));

    let requests = client.rpc().fetcher().requests();
    assert_eq!(
        requests.iter().filter(|r| r.starts_with("multiple")).collect::<Vec<_>>(),
        ["multiple:3"]
    );
}

#[tokio::test]
async fn get_squads_keeps_request_order() {
    let mut fetcher = MemoryFetcher::default();
    for byte in [1u8, 2, 3] {
        let data = squad_data(2, 0, key(9), &[(byte + 100, byte + 150)]);
        fetcher.insert(key(byte), SQUADS_PROGRAM_ID, data);
    }
    let client = SquadsClient::new(AccountRpc::new(fetcher), ClientConfig::devnet());

    let squads = client
        .get_squads(&[key(3), key(1), key(2)])
        .await
        .expect("squads");

    let keys: Vec<Address> = squads.iter().map(|squad| *squad.public_key()).collect();
    assert_eq!(keys, [key(3), key(1), key(2)]);
    assert!(squads[0].has_member(&key(103)));
    assert!(squads[1].has_member(&key(101)));
    assert_eq!(
        client.rpc().fetcher().requests().first().map(String::as_str),
        Some("multiple:3")
    );
}

#[tokio::test]
async fn get_squads_fails_when_any_account_is_missing() {
    let mut fetcher = MemoryFetcher::default();
    fetcher.insert(key(1), SQUADS_PROGRAM_ID, squad_data(2, 0, key(9), &[]));
    let client = SquadsClient::new(AccountRpc::new(fetcher), ClientConfig::default());

    let err = client
        .get_squads(&[key(1), key(2)])
        .await
        .expect_err("missing squad");

    assert!(matches!(err, SquadsError::AccountNotFound { ref prefix } if prefix.len() == 6));
    assert!(err.to_string().ends_with("... not found"));
}

#[tokio::test]
async fn upstream_failure_leaves_no_partial_squad() {
    let mut fetcher = MemoryFetcher {
        fail_balance: true,
        ..MemoryFetcher::default()
    };
    fetcher.insert(key(1), SQUADS_PROGRAM_ID, squad_data(2, 0, key(9), &[(10, 20)]));
    let client = SquadsClient::new(AccountRpc::new(fetcher), ClientConfig::default());

    let err = client.get_squad(&key(1)).await.expect_err("treasury lookup fails");

    assert!(matches!(err, SquadsError::Upstream { operation: "fetch_balance", .. }));
    assert_eq!(err.to_string(), "fetch_balance failed: node is behind");
}

#[tokio::test]
async fn decoded_account_keeps_raw_fields_untouched_by_enrichment() {
    let data = squad_data(1, 40, key(3), &[(10, 20)]);
    let account = SquadAccount::decode(&data, key(1)).expect("decode");

    assert_eq!(account.raw_members.len(), RAW_MEMBERS_LEN);
    assert_eq!(account.raw_members_byte_length, 68);
    assert_eq!(account.raw_created_on, 1_650_000_000);
    assert_eq!(account.encode().expect("encode"), data);
}

#[test]
fn invalid_allocation_type_is_rejected_at_decode() {
    let mut data = squad_data(1, 0, key(3), &[]);
    data[ALLOCATION_TYPE_OFFSET] = 3;
    assert!(matches!(
        SquadAccount::decode(&data, key(1)),
        Err(SquadsError::InvalidDiscriminant { value: 3 })
    ));
}

fn key(byte: u8) -> Address {
    Address::new_from_array([byte; 32])
}

fn squad_data(
    allocation_type: u8,
    core_threshold: u8,
    mint: Address,
    members: &[(u8, u8)],
) -> Vec<u8> {
    let mut data = vec![0u8; SQUAD_ACCOUNT_LEN];
    data[0] = 1;
    data[ALLOCATION_TYPE_OFFSET] = allocation_type;
    data[CORE_THRESHOLD_OFFSET] = core_threshold;
    PublicKeyId.encode(&mint, &mut data, MINT_OFFSET).expect("mint");
    U64.encode(&1_650_000_000, &mut data, CREATED_ON_OFFSET)
        .expect("created on");
    let used = (4 + members.len() * 64) as u32;
    U32.encode(&used, &mut data, RAW_MEMBERS_BYTE_LENGTH_OFFSET)
        .expect("used length");
    for (i, (member, token_account)) in members.iter().enumerate() {
        let offset = RAW_MEMBERS_OFFSET + i * 64;
        PublicKeyId.encode(&key(*member), &mut data, offset).expect("member");
        PublicKeyId
            .encode(&key(*token_account), &mut data, offset + 32)
            .expect("token account");
    }
    data
}

fn mint_data(supply: u64) -> Vec<u8> {
    let mut data = vec![0u8; MINT_LEN];
    U64.encode(&supply, &mut data, 36).expect("supply");
    U8.encode(&6, &mut data, 44).expect("decimals");
    U8.encode(&1, &mut data, 45).expect("initialized");
    data
}

fn token_account_data(mint: Address, owner: Address, amount: u64) -> Vec<u8> {
    let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
    PublicKeyId.encode(&mint, &mut data, 0).expect("mint");
    PublicKeyId.encode(&owner, &mut data, 32).expect("owner");
    U64.encode(&amount, &mut data, 64).expect("amount");
    U8.encode(&1, &mut data, 108).expect("state");
    data
}
