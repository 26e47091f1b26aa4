use chrono::{DateTime, Utc};
use solana_address::Address;
use tracing::debug;

use crate::{
    account_layouts::{
        field, ALLOCATION_TYPE_BALANCE_WEIGHTED, ALLOCATION_TYPE_FIXED_WEIGHT,
        MEMBERS_LENGTH_PREFIX_LEN, MEMBER_RECORD_LEN, SQUAD_ACCOUNT_LEN,
    },
    codec::{Codec, LayoutError, PublicKeyId, PUBKEY_LEN},
    constants::{derive_squad_sol_account, encode_address, short_address, LAMPORTS_PER_SOL},
    errors::SquadsError,
    layout::{FieldMap, SchemaId, Value},
    voting::{is_core, voting_power, VotingPower},
};

/// Balance credited to each member of a fixed-weight squad.
pub const FIXED_WEIGHT_MEMBER_TOKENS: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AllocationType {
    /// Voting power follows each member's share of the governance mint.
    BalanceWeighted = ALLOCATION_TYPE_BALANCE_WEIGHTED,
    /// Every member votes with equal, full weight.
    FixedWeight = ALLOCATION_TYPE_FIXED_WEIGHT,
}

impl TryFrom<u8> for AllocationType {
    type Error = SquadsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            ALLOCATION_TYPE_BALANCE_WEIGHTED => Ok(Self::BalanceWeighted),
            ALLOCATION_TYPE_FIXED_WEIGHT => Ok(Self::FixedWeight),
            value => Err(SquadsError::InvalidDiscriminant { value }),
        }
    }
}

/// A squad account exactly as stored on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquadAccount {
    pub public_key: Address,
    pub is_initialized: bool,
    pub open: bool,
    pub emergency_lock: bool,
    pub allocation_type: AllocationType,
    pub vote_support: u8,
    pub vote_quorum: u8,
    pub core_threshold: u8,
    pub squad_name: String,
    pub description: String,
    pub token: String,
    pub admin: Address,
    pub mint: Address,
    pub sol_account: Address,
    pub proposal_nonce: u32,
    pub raw_created_on: i64,
    pub raw_members_byte_length: u32,
    pub raw_members: Vec<u8>,
    pub random_id: String,
    pub child_index: u32,
    pub member_lock_index: u32,
}

impl SquadAccount {
    pub fn decode(data: &[u8], public_key: Address) -> Result<Self, SquadsError> {
        if data.len() != SQUAD_ACCOUNT_LEN {
            return Err(LayoutError::RecordSizeMismatch {
                expected: SQUAD_ACCOUNT_LEN,
                actual: data.len(),
            }
            .into());
        }
        let fields = SchemaId::Squad.layout().decode(data)?;
        let account = Self::from_fields(fields, public_key)?;
        debug!(
            squad = %short_address(&account.public_key),
            allocation_type = ?account.allocation_type,
            member_slots = (account.raw_members_byte_length as usize)
                .saturating_sub(MEMBERS_LENGTH_PREFIX_LEN)
                / MEMBER_RECORD_LEN,
            "decoded squad account"
        );
        Ok(account)
    }

    /// Builds a record from decoded fields. The allocation type is the only
    /// field validated here.
    pub fn from_fields(mut fields: FieldMap, public_key: Address) -> Result<Self, SquadsError> {
        let allocation_type = AllocationType::try_from(fields.take_u8(field::ALLOCATION_TYPE)?)?;
        Ok(Self {
            public_key,
            is_initialized: fields.take_bool(field::IS_INITIALIZED)?,
            open: fields.take_bool(field::OPEN)?,
            emergency_lock: fields.take_bool(field::EMERGENCY_LOCK)?,
            allocation_type,
            vote_support: fields.take_u8(field::VOTE_SUPPORT)?,
            vote_quorum: fields.take_u8(field::VOTE_QUORUM)?,
            core_threshold: fields.take_u8(field::CORE_THRESHOLD)?,
            squad_name: fields.take_text(field::SQUAD_NAME)?,
            description: fields.take_text(field::DESCRIPTION)?,
            token: fields.take_text(field::TOKEN)?,
            admin: fields.take_public_key(field::ADMIN)?,
            mint: fields.take_public_key(field::MINT)?,
            sol_account: fields.take_public_key(field::SOL_ACCOUNT)?,
            proposal_nonce: fields.take_u32(field::PROPOSAL_NONCE)?,
            raw_created_on: fields.take_i64(field::CREATED_ON)?,
            raw_members_byte_length: fields.take_u32(field::RAW_MEMBERS_BYTE_LENGTH)?,
            raw_members: fields.take_bytes(field::RAW_MEMBERS)?,
            random_id: fields.take_text(field::RANDOM_ID)?,
            child_index: fields.take_u32(field::CHILD_INDEX)?,
            member_lock_index: fields.take_u32(field::MEMBER_LOCK_INDEX)?,
        })
    }

    pub fn to_fields(&self) -> FieldMap {
        [
            (field::IS_INITIALIZED, Value::Bool(self.is_initialized)),
            (field::OPEN, Value::Bool(self.open)),
            (field::EMERGENCY_LOCK, Value::Bool(self.emergency_lock)),
            (field::ALLOCATION_TYPE, Value::U8(self.allocation_type as u8)),
            (field::VOTE_SUPPORT, Value::U8(self.vote_support)),
            (field::VOTE_QUORUM, Value::U8(self.vote_quorum)),
            (field::CORE_THRESHOLD, Value::U8(self.core_threshold)),
            (field::SQUAD_NAME, Value::Text(self.squad_name.clone())),
            (field::DESCRIPTION, Value::Text(self.description.clone())),
            (field::TOKEN, Value::Text(self.token.clone())),
            (field::ADMIN, Value::PublicKey(self.admin)),
            (field::MINT, Value::PublicKey(self.mint)),
            (field::SOL_ACCOUNT, Value::PublicKey(self.sol_account)),
            (field::PROPOSAL_NONCE, Value::U32(self.proposal_nonce)),
            (field::CREATED_ON, Value::I64(self.raw_created_on)),
            (field::RAW_MEMBERS_BYTE_LENGTH, Value::U32(self.raw_members_byte_length)),
            (field::RAW_MEMBERS, Value::Bytes(self.raw_members.clone())),
            (field::RANDOM_ID, Value::Text(self.random_id.clone())),
            (field::CHILD_INDEX, Value::U32(self.child_index)),
            (field::MEMBER_LOCK_INDEX, Value::U32(self.member_lock_index)),
        ]
        .into_iter()
        .collect()
    }

    pub fn encode(&self) -> Result<Vec<u8>, SquadsError> {
        Ok(SchemaId::Squad.layout().encode(&self.to_fields())?)
    }

    pub fn member_keys(&self) -> Result<Vec<MemberKey>, SquadsError> {
        decode_member_keys(&self.raw_members, self.raw_members_byte_length)
    }

    pub fn treasury_address(&self, program_id: &Address) -> Address {
        derive_squad_sol_account(&self.public_key, program_id).0
    }

    /// Calendar form of `raw_created_on`. Enrichment does not depend on it.
    pub fn created_on(&self) -> Result<DateTime<Utc>, SquadsError> {
        DateTime::from_timestamp(self.raw_created_on, 0)
            .ok_or(SquadsError::TimestampOutOfRange(self.raw_created_on))
    }

    /// Produces the enriched record from already-resolved external data.
    ///
    /// Nothing is fetched here; given the same inputs the result is always
    /// the same, and on error no enriched record exists.
    pub fn enrich_with(&self, inputs: EnrichmentInputs) -> Result<Squad, SquadsError> {
        let keys = self.member_keys()?;

        let (members, mint_supply) = match self.allocation_type {
            AllocationType::FixedWeight => {
                let members = keys
                    .into_iter()
                    .map(|key| SquadMember {
                        public_key: key.public_key,
                        token_account: key.token_account,
                        tokens: FIXED_WEIGHT_MEMBER_TOKENS,
                        voting_power: VotingPower::ONE,
                        is_core: true,
                    })
                    .collect();
                (members, None)
            }
            AllocationType::BalanceWeighted => {
                let supply = inputs.supply.ok_or_else(|| SquadsError::MissingSupplyData {
                    mint: encode_address(&self.mint),
                })?;
                if inputs.member_balances.len() != keys.len() {
                    return Err(SquadsError::BalanceCountMismatch {
                        expected: keys.len(),
                        actual: inputs.member_balances.len(),
                    });
                }
                let members = keys
                    .into_iter()
                    .zip(inputs.member_balances)
                    .map(|(key, tokens)| -> Result<SquadMember, SquadsError> {
                        let power = voting_power(tokens, supply)?;
                        Ok(SquadMember {
                            public_key: key.public_key,
                            token_account: key.token_account,
                            tokens,
                            voting_power: power,
                            is_core: is_core(power, self.core_threshold),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (members, Some(supply))
            }
        };

        Ok(Squad {
            account: self.clone(),
            created_on: self.created_on().ok(),
            treasury: inputs.treasury,
            sol_balance_lamports: inputs.treasury_lamports,
            mint_supply,
            members,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberKey {
    pub public_key: Address,
    pub token_account: Address,
}

/// Splits the populated part of the reserved member region into 64-byte
/// records (member key, then its token account).
///
/// `used_length` counts a trailing 4-byte length word that is not member
/// data, so anything up to 4 means no members.
pub fn decode_member_keys(
    raw_members: &[u8],
    used_length: u32,
) -> Result<Vec<MemberKey>, SquadsError> {
    let used = used_length as usize;
    if used <= MEMBERS_LENGTH_PREFIX_LEN {
        return Ok(Vec::new());
    }
    let populated_len = used - MEMBERS_LENGTH_PREFIX_LEN;
    let populated = raw_members
        .get(..populated_len)
        .ok_or(SquadsError::MemberRegionOverflow {
            used_length,
            capacity: raw_members.len(),
        })?;

    let trailing = populated_len % MEMBER_RECORD_LEN;
    if trailing != 0 {
        return Err(SquadsError::TruncatedMemberRecord {
            populated_len,
            trailing,
        });
    }

    populated
        .chunks_exact(MEMBER_RECORD_LEN)
        .map(|record| -> Result<MemberKey, SquadsError> {
            Ok(MemberKey {
                public_key: PublicKeyId.decode(record, 0)?,
                token_account: PublicKeyId.decode(record, PUBKEY_LEN)?,
            })
        })
        .collect()
}

/// Everything enrichment needs from outside the account bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentInputs {
    pub treasury: Address,
    pub treasury_lamports: u64,
    /// Governance mint supply; required for balance-weighted squads.
    pub supply: Option<u64>,
    /// Token balances aligned with [`SquadAccount::member_keys`].
    pub member_balances: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquadMember {
    pub public_key: Address,
    pub token_account: Address,
    pub tokens: u64,
    pub voting_power: VotingPower,
    pub is_core: bool,
}

/// A squad with its members, balances and timestamps resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Squad {
    pub account: SquadAccount,
    /// `None` when the raw timestamp has no calendar representation.
    pub created_on: Option<DateTime<Utc>>,
    pub treasury: Address,
    pub sol_balance_lamports: u64,
    pub mint_supply: Option<u64>,
    pub members: Vec<SquadMember>,
}

impl Squad {
    pub fn public_key(&self) -> &Address {
        &self.account.public_key
    }

    pub fn sol_balance(&self) -> f64 {
        self.sol_balance_lamports as f64 / LAMPORTS_PER_SOL as f64
    }

    pub fn has_member(&self, public_key: &Address) -> bool {
        self.member(public_key).is_some()
    }

    pub fn member(&self, public_key: &Address) -> Option<&SquadMember> {
        self.members.iter().find(|member| member.public_key == *public_key)
    }

    pub fn core_members(&self) -> impl Iterator<Item = &SquadMember> {
        self.members.iter().filter(|member| member.is_core)
    }
}
