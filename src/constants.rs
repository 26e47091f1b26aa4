use solana_address::{address, Address};

use crate::{codec::PUBKEY_LEN, errors::SquadsError};

pub const SQUADS_PROGRAM_ID: Address = address!("SQUADSxWKud1RVxuhJzNcqYqu7F3GLNiktGzjnNtriT");
pub const TOKEN_PROGRAM_ID: Address = address!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

pub const SQUAD_SOL_SEED: &[u8] = b"squadsol!";
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

const SHORT_ADDRESS_LEN: usize = 6;

pub fn encode_address(address: &Address) -> String {
    bs58::encode(address.as_ref()).into_string()
}

/// First few base58 characters, for log lines and error messages.
pub fn short_address(address: &Address) -> String {
    encode_address(address).chars().take(SHORT_ADDRESS_LEN).collect()
}

pub fn parse_address(text: &str) -> Result<Address, SquadsError> {
    let bytes = bs58::decode(text.trim())
        .into_vec()
        .map_err(|_| SquadsError::InvalidAddress(text.to_string()))?;
    let array: [u8; PUBKEY_LEN] = bytes
        .try_into()
        .map_err(|_| SquadsError::InvalidAddress(text.to_string()))?;
    Ok(Address::new_from_array(array))
}

/// Treasury account holding a squad's SOL: `[squad, "squadsol!"]` under the
/// squads program.
pub fn derive_squad_sol_account(squad: &Address, program_id: &Address) -> (Address, u8) {
    Address::find_program_address(&[squad.as_ref(), SQUAD_SOL_SEED], program_id)
}
