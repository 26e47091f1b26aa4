use std::sync::OnceLock;

use crate::{
    codec::PUBKEY_LEN,
    layout::{FieldCodec, FieldSpec, StructLayout},
};

pub const SQUAD_NAME_LEN: usize = 24;
pub const SQUAD_DESCRIPTION_LEN: usize = 36;
pub const SQUAD_TOKEN_SYMBOL_LEN: usize = 6;
pub const SQUAD_SETTINGS_RESERVED_LEN: usize = 5;
pub const SQUAD_RESERVED_ADDRESS_COUNT: usize = 5;
pub const SQUAD_RESERVED_ADDRESSES_LEN: usize = PUBKEY_LEN * SQUAD_RESERVED_ADDRESS_COUNT;
pub const MEMBERS_LENGTH_PREFIX_LEN: usize = 4;
pub const MEMBER_RECORD_LEN: usize = 2 * PUBKEY_LEN;
pub const MAX_MEMBERS: usize = 150;
pub const RAW_MEMBERS_LEN: usize = MEMBER_RECORD_LEN * MAX_MEMBERS;
pub const SQUAD_RANDOM_ID_LEN: usize = 10;
pub const SQUAD_TAIL_RESERVED_LEN: usize = 8 * 32;
pub const SQUAD_ACCOUNT_LEN: usize = 10_228;

pub const ALLOCATION_TYPE_BALANCE_WEIGHTED: u8 = 1;
pub const ALLOCATION_TYPE_FIXED_WEIGHT: u8 = 2;

pub mod field {
    pub const IS_INITIALIZED: &str = "is_initialized";
    pub const OPEN: &str = "open";
    pub const EMERGENCY_LOCK: &str = "emergency_lock";
    pub const ALLOCATION_TYPE: &str = "allocation_type";
    pub const VOTE_SUPPORT: &str = "vote_support";
    pub const VOTE_QUORUM: &str = "vote_quorum";
    pub const CORE_THRESHOLD: &str = "core_threshold";
    pub const SQUAD_NAME: &str = "squad_name";
    pub const DESCRIPTION: &str = "description";
    pub const TOKEN: &str = "token";
    pub const ADMIN: &str = "admin";
    pub const MINT: &str = "mint";
    pub const SOL_ACCOUNT: &str = "sol_account";
    pub const PROPOSAL_NONCE: &str = "proposal_nonce";
    pub const CREATED_ON: &str = "created_on";
    pub const RAW_MEMBERS_BYTE_LENGTH: &str = "raw_members_byte_length";
    pub const RAW_MEMBERS: &str = "raw_members";
    pub const RANDOM_ID: &str = "random_id";
    pub const CHILD_INDEX: &str = "child_index";
    pub const MEMBER_LOCK_INDEX: &str = "member_lock_index";
}

/// Byte-exact layout of a squad account. Any change here is a breaking
/// format change for every deployed squad.
pub fn squad_layout() -> &'static StructLayout {
    static LAYOUT: OnceLock<StructLayout> = OnceLock::new();
    LAYOUT.get_or_init(|| {
        StructLayout::new([
            FieldSpec::named(field::IS_INITIALIZED, FieldCodec::Bool),
            FieldSpec::named(field::OPEN, FieldCodec::Bool),
            FieldSpec::named(field::EMERGENCY_LOCK, FieldCodec::Bool),
            FieldSpec::named(field::ALLOCATION_TYPE, FieldCodec::U8),
            FieldSpec::named(field::VOTE_SUPPORT, FieldCodec::U8),
            FieldSpec::named(field::VOTE_QUORUM, FieldCodec::U8),
            FieldSpec::named(field::CORE_THRESHOLD, FieldCodec::U8),
            FieldSpec::named(field::SQUAD_NAME, FieldCodec::FixedUtf8(SQUAD_NAME_LEN)),
            FieldSpec::named(field::DESCRIPTION, FieldCodec::FixedUtf8(SQUAD_DESCRIPTION_LEN)),
            FieldSpec::named(field::TOKEN, FieldCodec::FixedUtf8(SQUAD_TOKEN_SYMBOL_LEN)),
            FieldSpec::padding(SQUAD_SETTINGS_RESERVED_LEN),
            FieldSpec::named(field::ADMIN, FieldCodec::PublicKey),
            FieldSpec::named(field::MINT, FieldCodec::PublicKey),
            FieldSpec::named(field::SOL_ACCOUNT, FieldCodec::PublicKey),
            FieldSpec::padding(SQUAD_RESERVED_ADDRESSES_LEN),
            FieldSpec::named(field::PROPOSAL_NONCE, FieldCodec::U32),
            FieldSpec::named(field::CREATED_ON, FieldCodec::I64),
            FieldSpec::named(field::RAW_MEMBERS_BYTE_LENGTH, FieldCodec::U32),
            FieldSpec::padding(MEMBERS_LENGTH_PREFIX_LEN),
            FieldSpec::named(field::RAW_MEMBERS, FieldCodec::Blob(RAW_MEMBERS_LEN)),
            FieldSpec::named(field::RANDOM_ID, FieldCodec::FixedUtf8(SQUAD_RANDOM_ID_LEN)),
            FieldSpec::named(field::CHILD_INDEX, FieldCodec::U32),
            FieldSpec::named(field::MEMBER_LOCK_INDEX, FieldCodec::U32),
            FieldSpec::padding(SQUAD_TAIL_RESERVED_LEN),
        ])
    })
}
