use std::fmt;

use crate::utils::blake2_512;

/// Generic substrate prefix, used when no network is configured.
pub const DEFAULT_SS58_PREFIX: u16 = 42;

const CHECKSUM_CONTEXT: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;
const MAX_PREFIX: u16 = 16383;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")]
    Base58(String),

    #[error("invalid address length: {0} bytes")]
    Length(usize),

    #[error("invalid ss58 prefix: {0}")]
    Prefix(u16),

    #[error("invalid address checksum")]
    Checksum,
}

/// A decoded SS58 address: network prefix plus 32-byte account id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ss58Address {
    pub prefix: u16,
    pub account_id: [u8; 32],
}

impl Ss58Address {
    pub fn new(prefix: u16, account_id: [u8; 32]) -> Result<Self, AddressError> {
        if prefix > MAX_PREFIX {
            return Err(AddressError::Prefix(prefix));
        }
        Ok(Self { prefix, account_id })
    }

    pub fn encode(&self) -> String {
        let mut data = prefix_bytes(self.prefix);
        data.extend_from_slice(&self.account_id);
        let checksum = blake2_512(&[CHECKSUM_CONTEXT, data.as_slice()]);
        data.extend_from_slice(&checksum[..CHECKSUM_LEN]);
        bs58::encode(data).into_string()
    }

    pub fn decode(address: &str) -> Result<Self, AddressError> {
        let data = bs58::decode(address)
            .into_vec()
            .map_err(|e| AddressError::Base58(e.to_string()))?;

        let (prefix, prefix_len) = match data.first() {
            Some(&b) if b < 64 => (b as u16, 1),
            Some(&b) if b < 128 => {
                let second = *data.get(1).ok_or(AddressError::Length(data.len()))?;
                let lower = ((b & 0b0011_1111) << 2) | (second >> 6);
                let upper = second & 0b0011_1111;
                (lower as u16 | ((upper as u16) << 8), 2)
            }
            Some(&b) => return Err(AddressError::Prefix(b as u16)),
            None => return Err(AddressError::Length(0)),
        };

        if data.len() != prefix_len + 32 + CHECKSUM_LEN {
            return Err(AddressError::Length(data.len()));
        }

        let body = &data[..prefix_len + 32];
        let checksum = blake2_512(&[CHECKSUM_CONTEXT, body]);
        if checksum[..CHECKSUM_LEN] != data[prefix_len + 32..] {
            return Err(AddressError::Checksum);
        }

        let mut account_id = [0u8; 32];
        account_id.copy_from_slice(&data[prefix_len..prefix_len + 32]);
        Ss58Address::new(prefix, account_id)
    }
}

impl fmt::Display for Ss58Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn prefix_bytes(prefix: u16) -> Vec<u8> {
    if prefix < 64 {
        vec![prefix as u8]
    } else {
        vec![
            (((prefix & 0b0000_0000_1111_1100) as u8) >> 2) | 0b0100_0000,
            ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_PUBLIC: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";

    fn alice_id() -> [u8; 32] {
        let mut id = [0u8; 32];
        id.copy_from_slice(&hex::decode(ALICE_PUBLIC).unwrap());
        id
    }

    #[test]
    fn encodes_well_known_generic_address() {
        let addr = Ss58Address::new(DEFAULT_SS58_PREFIX, alice_id()).unwrap();
        assert_eq!(
            addr.encode(),
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        );
    }

    #[test]
    fn decodes_what_it_encodes_for_one_and_two_byte_prefixes() {
        for prefix in [0u16, 2, 42, 63, 64, 255, 1284, MAX_PREFIX] {
            let addr = Ss58Address::new(prefix, alice_id()).unwrap();
            let decoded = Ss58Address::decode(&addr.encode()).unwrap();
            assert_eq!(decoded, addr, "prefix {prefix}");
        }
    }

    #[test]
    fn same_key_differs_across_networks() {
        let generic = Ss58Address::new(42, alice_id()).unwrap().encode();
        let polkadot = Ss58Address::new(0, alice_id()).unwrap().encode();
        assert_ne!(generic, polkadot);
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let mut data = bs58::decode("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY")
            .into_vec()
            .unwrap();
        let last = data.len() - 1;
        data[last] ^= 0x01;
        let tampered = bs58::encode(data).into_string();
        assert_eq!(Ss58Address::decode(&tampered), Err(AddressError::Checksum));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            Ss58Address::decode("0OIl"),
            Err(AddressError::Base58(_))
        ));
        assert!(matches!(
            Ss58Address::decode("11111"),
            Err(AddressError::Length(_))
        ));
        assert_eq!(
            Ss58Address::new(MAX_PREFIX + 1, [0u8; 32]),
            Err(AddressError::Prefix(MAX_PREFIX + 1))
        );
    }
}
