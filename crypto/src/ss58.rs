//! SS58 account addresses.
//!
//! Layout of the decoded base58 payload for a 32-byte account id:
//! 1. Network prefix: one byte for prefixes < 64, two bytes for 64..=16383
//! 2. The 32-byte public key
//! 3. Checksum = Blake2b-512("SS58PRE" ++ prefix ++ pubkey)[0..2]

use crate::hash::blake2b_512_multi;

/// Network prefix of Unique Network mainnet (`unq...` addresses).
pub const UNIQUE_PREFIX: u16 = 7391;

const CHECKSUM_PREAMBLE: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;
const ACCOUNT_LEN: usize = 32;
const MAX_PREFIX: u16 = 0b0011_1111_1111_1111;

fn checksum(body: &[u8]) -> [u8; CHECKSUM_LEN] {
    let hash = blake2b_512_multi(&[CHECKSUM_PREAMBLE, body]);
    [hash[0], hash[1]]
}

/// Encode a 32-byte account id under a network prefix.
///
/// Returns `None` if the prefix is outside the SS58 range.
pub fn encode_ss58(prefix: u16, public_key: &[u8; 32]) -> Option<String> {
    let mut body = match prefix {
        0..=63 => vec![prefix as u8],
        64..=MAX_PREFIX => {
            let first = ((prefix & 0b0000_0000_1111_1100) as u8) >> 2;
            let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
            vec![first | 0b0100_0000, second]
        }
        _ => return None,
    };
    body.extend_from_slice(public_key);
    let check = checksum(&body);
    body.extend_from_slice(&check);
    Some(bs58::encode(body).into_string())
}

/// Decode an SS58 address into its network prefix and account id.
///
/// Returns `None` if the string is not base58, the payload length is wrong,
/// the prefix byte is reserved, or the checksum does not match.
pub fn decode_ss58(address: &str) -> Option<(u16, [u8; 32])> {
    let data = bs58::decode(address).into_vec().ok()?;
    let first = *data.first()?;

    let (prefix_len, prefix) = match first {
        0..=63 => (1, u16::from(first)),
        64..=127 => {
            let second = *data.get(1)?;
            let lower = (first << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            (2, u16::from(lower) | (u16::from(upper) << 8))
        }
        _ => return None,
    };

    if data.len() != prefix_len + ACCOUNT_LEN + CHECKSUM_LEN {
        return None;
    }
    let (body, check) = data.split_at(prefix_len + ACCOUNT_LEN);
    if checksum(body) != check {
        return None;
    }

    let mut account = [0u8; ACCOUNT_LEN];
    account.copy_from_slice(&body[prefix_len..]);
    Some((prefix, account))
}

/// Validate that an address string is well-formed SS58 with a correct checksum.
///
/// When `expected_prefix` is given the address must also belong to that network.
pub fn validate_address(address: &str, expected_prefix: Option<u16>) -> bool {
    match decode_ss58(address) {
        Some((prefix, _)) => expected_prefix.map_or(true, |p| p == prefix),
        None => false,
    }
}
