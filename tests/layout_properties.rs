use proptest::prelude::*;
use solana_address::Address;

use squads_state::{
    account_layouts::{
        MAX_MEMBERS, MEMBERS_LENGTH_PREFIX_LEN, MEMBER_RECORD_LEN, RAW_MEMBERS_LEN,
        SQUAD_ACCOUNT_LEN,
    },
    codec::{Codec, FixedUtf8, LayoutError, I64, U64},
    AllocationType, SquadAccount,
};

/// Text that fits in `max_bytes` once encoded. Embedded NULs are allowed;
/// a trailing one is not, since encode refuses it.
fn text(max_bytes: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(any::<char>(), 0..max_bytes)
        .prop_map(move |chars| {
            let mut out = String::new();
            for c in chars {
                if out.len() + c.len_utf8() > max_bytes {
                    break;
                }
                out.push(c);
            }
            out
        })
        .prop_filter("encode rejects trailing NUL", |text| !text.ends_with('\0'))
}

prop_compose! {
    fn squad_account()(
        keys in any::<[[u8; 32]; 4]>(),
        flags in any::<[bool; 4]>(),
        settings in any::<[u8; 3]>(),
        squad_name in text(24),
        description in text(36),
        token in text(6),
        random_id in text(10),
        counters in any::<(u32, u32, u32)>(),
        raw_created_on in any::<i64>(),
        members in (0..=MAX_MEMBERS, any::<u8>()),
    ) -> SquadAccount {
        let (proposal_nonce, child_index, member_lock_index) = counters;
        let (member_count, fill) = members;
        let used = MEMBERS_LENGTH_PREFIX_LEN + member_count * MEMBER_RECORD_LEN;
        let mut raw_members = vec![0u8; RAW_MEMBERS_LEN];
        raw_members[..member_count * MEMBER_RECORD_LEN].fill(fill);
        SquadAccount {
            public_key: Address::new_from_array(keys[0]),
            is_initialized: flags[0],
            open: flags[1],
            emergency_lock: flags[2],
            allocation_type: if flags[3] {
                AllocationType::FixedWeight
            } else {
                AllocationType::BalanceWeighted
            },
            vote_support: settings[0],
            vote_quorum: settings[1],
            core_threshold: settings[2],
            squad_name,
            description,
            token,
            admin: Address::new_from_array(keys[1]),
            mint: Address::new_from_array(keys[2]),
            sol_account: Address::new_from_array(keys[3]),
            proposal_nonce,
            raw_created_on,
            raw_members_byte_length: used as u32,
            raw_members,
            random_id,
            child_index,
            member_lock_index,
        }
    }
}

proptest! {
    #[test]
    fn i64_round_trips_and_fills_span(value in any::<i64>(), offset in 0usize..8) {
        let mut data = vec![0xaa; offset + 8 + 3];
        prop_assert_eq!(I64.encode(&value, &mut data, offset).unwrap(), 8);
        prop_assert_eq!(I64.decode(&data, offset).unwrap(), value);
        prop_assert!(data[..offset].iter().all(|b| *b == 0xaa));
        prop_assert!(data[offset + 8..].iter().all(|b| *b == 0xaa));
    }

    #[test]
    fn u64_round_trips(value in any::<u64>()) {
        let mut data = [0u8; 8];
        U64.encode(&value, &mut data, 0).unwrap();
        prop_assert_eq!(U64.decode(&data, 0).unwrap(), value);
    }

    #[test]
    fn fixed_utf8_round_trips_text_within_span(value in text(24)) {
        let mut data = [0xffu8; 24];
        prop_assert_eq!(FixedUtf8(24).encode(&value, &mut data, 0).unwrap(), 24);
        prop_assert_eq!(FixedUtf8(24).decode(&data, 0).unwrap(), value);
    }

    #[test]
    fn fixed_utf8_rejects_one_byte_too_many(len in 1usize..40) {
        let value = "a".repeat(len + 1);
        let mut data = vec![0u8; len + 1];
        prop_assert_eq!(
            FixedUtf8(len).encode(&value, &mut data, 0),
            Err(LayoutError::RangeExceeded { len: len + 1, span: len })
        );
    }

    #[test]
    fn fixed_utf8_rejects_text_ending_in_nul(
        value in text(23),
        nuls in 1usize..3,
    ) {
        let value = format!("{value}{}", "\0".repeat(nuls));
        let mut data = [0xffu8; 26];
        let result = FixedUtf8(26).encode(&value, &mut data, 0);
        prop_assert!(
            matches!(result, Err(LayoutError::ValueOutOfRange { codec: "fixed utf8", .. })),
            "unexpected result {:?}",
            result
        );
    }

    #[test]
    fn fixed_utf8_keeps_embedded_nul(head in text(10), tail in text(10)) {
        prop_assume!(!tail.is_empty());
        let value = format!("{head}\0{tail}");
        let mut data = [0u8; 21];
        FixedUtf8(21).encode(&value, &mut data, 0).unwrap();
        prop_assert_eq!(FixedUtf8(21).decode(&data, 0).unwrap(), value);
    }

    #[test]
    fn squad_record_round_trips(account in squad_account()) {
        let data = account.encode().unwrap();
        prop_assert_eq!(data.len(), SQUAD_ACCOUNT_LEN);
        let decoded = SquadAccount::decode(&data, account.public_key).unwrap();
        prop_assert_eq!(
            decoded.member_keys().unwrap().len(),
            account.member_keys().unwrap().len()
        );
        prop_assert_eq!(decoded, account);
    }
}
