use crate::constants::{ALGORAND_SIGNATURE_ENCODING_INCR, HASH_BYTES_LENGTH};
use crate::error::AlgoMintTransactError;
use crate::utils::{hash, sort_msgpack_value};
use serde::{Deserialize, Serialize};

/// Canonical msgpack encoding: named fields, keys sorted, domain prefix prepended.
pub trait AlgorandMsgpack: Serialize + for<'de> Deserialize<'de> {
    const PREFIX: &'static [u8] = b"";

    /// Decodes bytes with or without the domain prefix.
    fn decode(bytes: &[u8]) -> Result<Self, AlgoMintTransactError> {
        let bytes = bytes.strip_prefix(Self::PREFIX).unwrap_or(bytes);
        Ok(rmp_serde::from_slice(bytes)?)
    }

    fn encode_raw(&self) -> Result<Vec<u8>, AlgoMintTransactError> {
        let named = rmp_serde::to_vec_named(self)?;
        let value: rmpv::Value = rmp_serde::from_slice(&named)?;
        let mut sorted = Vec::with_capacity(named.len());
        rmpv::encode::write_value(&mut sorted, &sort_msgpack_value(value))?;
        Ok(sorted)
    }

    fn encode(&self) -> Result<Vec<u8>, AlgoMintTransactError> {
        let mut bytes = Self::PREFIX.to_vec();
        bytes.extend(self.encode_raw()?);
        Ok(bytes)
    }
}

pub trait TransactionId: AlgorandMsgpack {
    fn id_raw(&self) -> Result<[u8; HASH_BYTES_LENGTH], AlgoMintTransactError> {
        Ok(hash(&self.encode()?))
    }

    /// Base32 transaction id, as shown by explorers.
    fn id(&self) -> Result<String, AlgoMintTransactError> {
        Ok(base32::encode(
            base32::Alphabet::Rfc4648 { padding: false },
            &self.id_raw()?,
        ))
    }
}

pub trait EstimateTransactionSize: AlgorandMsgpack {
    /// Encoded size once a single signature is attached.
    fn estimate_size(&self) -> Result<usize, AlgoMintTransactError> {
        Ok(self.encode_raw()?.len() + ALGORAND_SIGNATURE_ENCODING_INCR)
    }
}

/// Protocol-level checks that can run before anything is signed.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<String>>;
}
