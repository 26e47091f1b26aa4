use solana_address::Address;
use thiserror::Error;

use crate::{
    codec::{Bool, Codec, LayoutError, PublicKeyId, U32, U64, U8, PUBKEY_LEN},
    rpc::AccountInfo,
};

pub const MINT_LEN: usize = 82;
pub const TOKEN_ACCOUNT_LEN: usize = 165;
pub const MULTISIG_LEN: usize = 355;
pub const ACCOUNT_TYPE_LEN: usize = 1;

/// Extension account-type byte written right after the base account.
pub const ACCOUNT_TYPE_MINT: u8 = 1;
pub const ACCOUNT_TYPE_ACCOUNT: u8 = 2;

const OPTION_TAG_LEN: usize = 4;
const OPTION_NONE: u32 = 0;
const OPTION_SOME: u32 = 1;

const MINT_AUTHORITY_OFFSET: usize = 0;
const MINT_SUPPLY_OFFSET: usize = MINT_AUTHORITY_OFFSET + OPTION_TAG_LEN + PUBKEY_LEN;
const MINT_DECIMALS_OFFSET: usize = MINT_SUPPLY_OFFSET + 8;
const MINT_IS_INITIALIZED_OFFSET: usize = MINT_DECIMALS_OFFSET + 1;
const MINT_FREEZE_AUTHORITY_OFFSET: usize = MINT_IS_INITIALIZED_OFFSET + 1;

const TOKEN_MINT_OFFSET: usize = 0;
const TOKEN_OWNER_OFFSET: usize = TOKEN_MINT_OFFSET + PUBKEY_LEN;
const TOKEN_AMOUNT_OFFSET: usize = TOKEN_OWNER_OFFSET + PUBKEY_LEN;
const TOKEN_DELEGATE_OFFSET: usize = TOKEN_AMOUNT_OFFSET + 8;
const TOKEN_STATE_OFFSET: usize = TOKEN_DELEGATE_OFFSET + OPTION_TAG_LEN + PUBKEY_LEN;
const TOKEN_IS_NATIVE_OFFSET: usize = TOKEN_STATE_OFFSET + 1;
const TOKEN_DELEGATED_AMOUNT_OFFSET: usize = TOKEN_IS_NATIVE_OFFSET + OPTION_TAG_LEN + 8;
const TOKEN_CLOSE_AUTHORITY_OFFSET: usize = TOKEN_DELEGATED_AMOUNT_OFFSET + 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token account not found")]
    AccountNotFound,
    #[error("token account is not owned by the token program")]
    InvalidAccountOwner,
    #[error("token account has invalid size {len}")]
    InvalidAccountSize { len: usize },
    #[error("account is not a valid token program account")]
    InvalidAccount,
    #[error("invalid option tag {tag} at offset {offset}")]
    InvalidOptionTag { offset: usize, tag: u32 },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountState {
    Uninitialized,
    Initialized,
    Frozen,
}

impl TryFrom<u8> for AccountState {
    type Error = TokenError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Uninitialized),
            1 => Ok(Self::Initialized),
            2 => Ok(Self::Frozen),
            _ => Err(TokenError::InvalidAccount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintView {
    pub address: Address,
    pub mint_authority: Option<Address>,
    pub supply: u64,
    pub decimals: u8,
    pub is_initialized: bool,
    pub freeze_authority: Option<Address>,
    pub tlv_data: Vec<u8>,
}

impl MintView {
    pub fn read_from_account_data(data: &[u8], address: Address) -> Result<Self, TokenError> {
        if data.len() < MINT_LEN {
            return Err(TokenError::InvalidAccountSize { len: data.len() });
        }
        Ok(Self {
            address,
            mint_authority: read_option_key(data, MINT_AUTHORITY_OFFSET)?,
            supply: U64.decode(data, MINT_SUPPLY_OFFSET)?,
            decimals: U8.decode(data, MINT_DECIMALS_OFFSET)?,
            is_initialized: Bool.decode(data, MINT_IS_INITIALIZED_OFFSET)?,
            freeze_authority: read_option_key(data, MINT_FREEZE_AUTHORITY_OFFSET)?,
            tlv_data: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccountView {
    pub address: Address,
    pub mint: Address,
    pub owner: Address,
    pub amount: u64,
    pub delegate: Option<Address>,
    pub state: AccountState,
    /// Rent-exempt reserve of a wrapped-SOL account.
    pub is_native: Option<u64>,
    pub delegated_amount: u64,
    pub close_authority: Option<Address>,
    pub tlv_data: Vec<u8>,
}

impl TokenAccountView {
    pub fn read_from_account_data(data: &[u8], address: Address) -> Result<Self, TokenError> {
        if data.len() < TOKEN_ACCOUNT_LEN {
            return Err(TokenError::InvalidAccountSize { len: data.len() });
        }
        Ok(Self {
            address,
            mint: PublicKeyId.decode(data, TOKEN_MINT_OFFSET)?,
            owner: PublicKeyId.decode(data, TOKEN_OWNER_OFFSET)?,
            amount: U64.decode(data, TOKEN_AMOUNT_OFFSET)?,
            delegate: read_option_key(data, TOKEN_DELEGATE_OFFSET)?,
            state: AccountState::try_from(U8.decode(data, TOKEN_STATE_OFFSET)?)?,
            is_native: read_option_u64(data, TOKEN_IS_NATIVE_OFFSET)?,
            delegated_amount: U64.decode(data, TOKEN_DELEGATED_AMOUNT_OFFSET)?,
            close_authority: read_option_key(data, TOKEN_CLOSE_AUTHORITY_OFFSET)?,
            tlv_data: Vec::new(),
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.state != AccountState::Uninitialized
    }

    pub fn is_frozen(&self) -> bool {
        self.state == AccountState::Frozen
    }
}

pub fn unpack_mint(
    info: Option<&AccountInfo>,
    address: Address,
    token_program: &Address,
) -> Result<MintView, TokenError> {
    let data = checked_data(info, token_program, MINT_LEN)?;
    let mut mint = MintView::read_from_account_data(data, address)?;
    mint.tlv_data = extension_data(data, ACCOUNT_TYPE_MINT)?;
    Ok(mint)
}

pub fn unpack_token_account(
    info: Option<&AccountInfo>,
    address: Address,
    token_program: &Address,
) -> Result<TokenAccountView, TokenError> {
    let data = checked_data(info, token_program, TOKEN_ACCOUNT_LEN)?;
    let mut account = TokenAccountView::read_from_account_data(data, address)?;
    account.tlv_data = extension_data(data, ACCOUNT_TYPE_ACCOUNT)?;
    Ok(account)
}

fn checked_data<'a>(
    info: Option<&'a AccountInfo>,
    token_program: &Address,
    base_len: usize,
) -> Result<&'a [u8], TokenError> {
    let info = info.ok_or(TokenError::AccountNotFound)?;
    if info.owner != *token_program {
        return Err(TokenError::InvalidAccountOwner);
    }
    if info.data.len() < base_len {
        return Err(TokenError::InvalidAccountSize {
            len: info.data.len(),
        });
    }
    Ok(&info.data)
}

/// Extensions start after the account-type byte at offset 165, for mints and
/// accounts alike. A plain base-size account has none.
fn extension_data(data: &[u8], account_type: u8) -> Result<Vec<u8>, TokenError> {
    let len = data.len();
    if len == MINT_LEN || len == TOKEN_ACCOUNT_LEN {
        return Ok(Vec::new());
    }
    if len == MULTISIG_LEN || len <= TOKEN_ACCOUNT_LEN {
        return Err(TokenError::InvalidAccountSize { len });
    }
    if U8.decode(data, TOKEN_ACCOUNT_LEN)? != account_type {
        return Err(TokenError::InvalidAccount);
    }
    Ok(data[TOKEN_ACCOUNT_LEN + ACCOUNT_TYPE_LEN..].to_vec())
}

fn read_option_tag(data: &[u8], offset: usize) -> Result<bool, TokenError> {
    match U32.decode(data, offset)? {
        OPTION_NONE => Ok(false),
        OPTION_SOME => Ok(true),
        tag => Err(TokenError::InvalidOptionTag { offset, tag }),
    }
}

fn read_option_key(data: &[u8], offset: usize) -> Result<Option<Address>, TokenError> {
    if !read_option_tag(data, offset)? {
        return Ok(None);
    }
    Ok(Some(PublicKeyId.decode(data, offset + OPTION_TAG_LEN)?))
}

fn read_option_u64(data: &[u8], offset: usize) -> Result<Option<u64>, TokenError> {
    if !read_option_tag(data, offset)? {
        return Ok(None);
    }
    Ok(Some(U64.decode(data, offset + OPTION_TAG_LEN)?))
}
