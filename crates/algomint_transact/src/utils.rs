use crate::constants::{
    ALGORAND_CHECKSUM_BYTE_LENGTH, Byte32, HASH_BYTES_LENGTH, MAX_EXTRA_PROGRAM_PAGES,
    PROGRAM_PAGE_SIZE,
};
use crate::error::AlgoMintTransactError;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use sha2::{Digest, Sha512_256};
use std::collections::BTreeMap;

/// Recursively sorts map keys so the encoding is canonical.
pub fn sort_msgpack_value(value: rmpv::Value) -> rmpv::Value {
    match value {
        rmpv::Value::Map(entries) => {
            let sorted: BTreeMap<String, rmpv::Value> = entries
                .into_iter()
                .filter_map(|(key, value)| match key {
                    rmpv::Value::String(key) => key
                        .into_str()
                        .map(|key| (key, sort_msgpack_value(value))),
                    _ => None,
                })
                .collect();
            rmpv::Value::Map(
                sorted
                    .into_iter()
                    .map(|(key, value)| (rmpv::Value::String(key.into()), value))
                    .collect(),
            )
        }
        rmpv::Value::Array(items) => {
            rmpv::Value::Array(items.into_iter().map(sort_msgpack_value).collect())
        }
        other => other,
    }
}

pub fn is_zero<T>(n: &T) -> bool
where
    T: PartialEq + From<u8>,
{
    *n == T::from(0u8)
}

pub fn is_zero_opt<T>(n: &Option<T>) -> bool
where
    T: PartialEq + From<u8>,
{
    n.as_ref().is_none_or(is_zero)
}

pub fn is_empty_vec_opt<T>(vec: &Option<Vec<T>>) -> bool {
    vec.as_ref().is_none_or(Vec::is_empty)
}

pub fn is_empty_string_opt(string: &Option<String>) -> bool {
    string.as_ref().is_none_or(String::is_empty)
}

pub fn pub_key_to_checksum(pub_key: &Byte32) -> [u8; ALGORAND_CHECKSUM_BYTE_LENGTH] {
    let digest = Sha512_256::digest(pub_key);
    let mut checksum = [0u8; ALGORAND_CHECKSUM_BYTE_LENGTH];
    checksum.copy_from_slice(&digest[HASH_BYTES_LENGTH - ALGORAND_CHECKSUM_BYTE_LENGTH..]);
    checksum
}

pub fn hash(bytes: &[u8]) -> Byte32 {
    let mut hash_bytes = [0u8; HASH_BYTES_LENGTH];
    hash_bytes.copy_from_slice(&Sha512_256::digest(bytes));
    hash_bytes
}

/// Decodes the base64 genesis hash algod reports into the header's 32 bytes.
pub fn genesis_hash_from_base64(genesis_hash: &str) -> Result<Byte32, AlgoMintTransactError> {
    let decoded = BASE64_STANDARD
        .decode(genesis_hash)
        .map_err(|e| AlgoMintTransactError::InputError {
            message: format!("Genesis hash is not base64: {}", e),
        })?;
    decoded
        .try_into()
        .map_err(|bytes: Vec<u8>| AlgoMintTransactError::InputError {
            message: format!("Genesis hash must be 32 bytes, got {}", bytes.len()),
        })
}

/// Smallest number of extra pages that fits both programs, which share
/// `PROGRAM_PAGE_SIZE * (1 + extra_pages)` bytes.
pub fn extra_pages_for(
    approval_len: usize,
    clear_len: usize,
) -> Result<u64, AlgoMintTransactError> {
    let total = approval_len + clear_len;
    let pages = total.div_ceil(PROGRAM_PAGE_SIZE).max(1) as u64 - 1;
    if pages > MAX_EXTRA_PROGRAM_PAGES {
        return Err(AlgoMintTransactError::InputError {
            message: format!(
                "Programs total {} bytes, more than the {} bytes allowed with {} extra pages",
                total,
                PROGRAM_PAGE_SIZE * (1 + MAX_EXTRA_PROGRAM_PAGES as usize),
                MAX_EXTRA_PROGRAM_PAGES
            ),
        });
    }
    Ok(pages)
}
