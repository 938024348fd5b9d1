//! Algorand addresses: 32 bytes rendered as 58 base32 characters with a 4-byte checksum.

use crate::constants::{
    ALGORAND_ADDRESS_LENGTH, ALGORAND_CHECKSUM_BYTE_LENGTH, ALGORAND_PUBLIC_KEY_BYTE_LENGTH,
    APP_ID_DOMAIN_SEPARATOR, Byte32,
};
use crate::error::AlgoMintTransactError;
use crate::utils::{hash, pub_key_to_checksum};
use serde::{Deserialize, Serialize};
use serde_with::{Bytes, serde_as};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

const BASE32: base32::Alphabet = base32::Alphabet::Rfc4648 { padding: false };

/// Decoded address bytes, without the checksum.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Address(#[serde_as(as = "Bytes")] pub Byte32);

impl Address {
    pub fn as_bytes(&self) -> &Byte32 {
        &self.0
    }

    /// The escrow address of an application: `sha512_256("appID" || be64(app_id))`.
    pub fn from_app_id(app_id: u64) -> Self {
        let mut to_hash = APP_ID_DOMAIN_SEPARATOR.to_vec();
        to_hash.extend_from_slice(&app_id.to_be_bytes());
        Address(hash(&to_hash))
    }

    pub fn checksum(&self) -> [u8; ALGORAND_CHECKSUM_BYTE_LENGTH] {
        pub_key_to_checksum(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ALGORAND_PUBLIC_KEY_BYTE_LENGTH]
    }
}

impl FromStr for Address {
    type Err = AlgoMintTransactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| AlgoMintTransactError::InvalidAddress { message };

        if s.len() != ALGORAND_ADDRESS_LENGTH {
            return Err(invalid(format!(
                "Algorand address must be exactly {} characters, got {}",
                ALGORAND_ADDRESS_LENGTH,
                s.len()
            )));
        }
        let decoded = base32::decode(BASE32, s)
            .ok_or_else(|| invalid(format!("'{}' is not valid base32", s)))?;
        if decoded.len() != ALGORAND_PUBLIC_KEY_BYTE_LENGTH + ALGORAND_CHECKSUM_BYTE_LENGTH {
            return Err(invalid(format!("'{}' decodes to {} bytes", s, decoded.len())));
        }

        let (key, checksum) = decoded.split_at(ALGORAND_PUBLIC_KEY_BYTE_LENGTH);
        let mut pub_key = [0u8; ALGORAND_PUBLIC_KEY_BYTE_LENGTH];
        pub_key.copy_from_slice(key);
        if pub_key_to_checksum(&pub_key) != checksum {
            return Err(invalid(format!("Checksum of '{}' is invalid", s)));
        }
        Ok(Address(pub_key))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut buffer = self.0.to_vec();
        buffer.extend_from_slice(&self.checksum());
        f.write_str(&base32::encode(BASE32, &buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn app_address_matches_known_vector() {
        assert_eq!(
            Address::from_app_id(123).to_string(),
            "WRBMNT66ECE2AOYKM76YVWIJMBW6Z3XCQZOKG5BL7NISAQC2LBGEKTZLRM"
        );
    }

    #[test]
    fn parses_and_renders_the_same_string() {
        let text = "MO2H6ZU47Q36GJ6GVHUKGEBEQINN7ZWVACMWZQGIYUOE3RBSRVYHV4ACJI";
        let address: Address = text.parse().unwrap();
        assert_eq!(address.to_string(), text);
        assert_eq!(address.as_bytes()[..4], [99, 180, 127, 102]);
    }

    #[test]
    fn zero_address() {
        let address: Address = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ"
            .parse()
            .unwrap();
        assert!(address.is_zero());
        assert_eq!(address, Address::default());
    }

    #[test]
    fn rejects_bad_checksum_and_length() {
        assert!(
            "MO2H6ZU47Q36GJ6GVHUKGEBEQINN7ZWVACMWZQGIYUOE3RBSRVYHV4ACJA"
                .parse::<Address>()
                .is_err()
        );
        assert!("SHORT".parse::<Address>().is_err());
    }
}
