use base32::Alphabet;
use num_bigint::BigUint;
use sha2::{Digest, Sha512_256};

use crate::{
    ABIError, ABIType, ABIValue,
    abi_type::bool_run_end,
    constants::{
        ADDRESS_LENGTH, BOOL_FALSE_BYTE, BOOL_TRUE_BYTE, CHECKSUM_LENGTH, LENGTH_PREFIX_SIZE,
        PUBLIC_KEY_LENGTH,
    },
};

const BASE32: Alphabet = Alphabet::Rfc4648 { padding: false };

impl ABIType {
    /// Encodes `value` into its canonical ARC-4 byte string.
    pub fn encode(&self, value: &ABIValue) -> Result<Vec<u8>, ABIError> {
        match (self, value) {
            (ABIType::Uint(bits) | ABIType::UFixed(bits, _), ABIValue::Uint(n)) => {
                let bytes = n.to_bytes_be();
                let width = bits.byte_len();
                if n.bits() > bits.value() as u64 {
                    return Err(ABIError::encoding(format!(
                        "{} does not fit in {}",
                        n, self
                    )));
                }
                let mut out = vec![0u8; width - bytes.len()];
                out.extend_from_slice(&bytes);
                Ok(out)
            }
            (ABIType::Address, ABIValue::Address(address)) => {
                Ok(public_key_from_address(address)?.to_vec())
            }
            (ABIType::Bool, ABIValue::Bool(b)) => Ok(vec![if *b {
                BOOL_TRUE_BYTE
            } else {
                BOOL_FALSE_BYTE
            }]),
            (ABIType::Byte, ABIValue::Byte(b)) => Ok(vec![*b]),
            (ABIType::String, ABIValue::String(s)) => {
                let mut out = length_prefix(s.len())?;
                out.extend_from_slice(s.as_bytes());
                Ok(out)
            }
            (ABIType::StaticArray(child, len), ABIValue::Array(items)) => {
                if items.len() != *len {
                    return Err(ABIError::encoding(format!(
                        "{} expects {} elements, got {}",
                        self,
                        len,
                        items.len()
                    )));
                }
                encode_sequence(&vec![child.as_ref().clone(); *len], items)
            }
            (ABIType::DynamicArray(child), ABIValue::Array(items)) => {
                let mut out = length_prefix(items.len())?;
                out.extend(encode_sequence(
                    &vec![child.as_ref().clone(); items.len()],
                    items,
                )?);
                Ok(out)
            }
            (ABIType::Tuple(children), ABIValue::Array(items)) => encode_sequence(children, items),
            _ => Err(ABIError::encoding(format!(
                "Value {:?} cannot be encoded as {}",
                value, self
            ))),
        }
    }

    /// Decodes a canonical ARC-4 byte string. The whole slice must be consumed.
    pub fn decode(&self, bytes: &[u8]) -> Result<ABIValue, ABIError> {
        match self {
            ABIType::Uint(bits) | ABIType::UFixed(bits, _) => {
                expect_len(self, bytes, bits.byte_len())?;
                Ok(ABIValue::Uint(BigUint::from_bytes_be(bytes)))
            }
            ABIType::Address => {
                expect_len(self, bytes, PUBLIC_KEY_LENGTH)?;
                Ok(ABIValue::Address(address_from_public_key(bytes)))
            }
            ABIType::Bool => {
                expect_len(self, bytes, 1)?;
                match bytes[0] {
                    BOOL_TRUE_BYTE => Ok(ABIValue::Bool(true)),
                    BOOL_FALSE_BYTE => Ok(ABIValue::Bool(false)),
                    other => Err(ABIError::decoding(format!(
                        "0x{:02x} is not a valid bool byte",
                        other
                    ))),
                }
            }
            ABIType::Byte => {
                expect_len(self, bytes, 1)?;
                Ok(ABIValue::Byte(bytes[0]))
            }
            ABIType::String => {
                let (len, body) = split_length_prefix(bytes)?;
                if body.len() != len {
                    return Err(ABIError::decoding(format!(
                        "String declares {} bytes but {} remain",
                        len,
                        body.len()
                    )));
                }
                let text = String::from_utf8(body.to_vec())
                    .map_err(|e| ABIError::decoding(format!("Invalid UTF-8 string: {}", e)))?;
                Ok(ABIValue::String(text))
            }
            ABIType::StaticArray(child, len) => {
                decode_sequence(&vec![child.as_ref().clone(); *len], bytes)
            }
            ABIType::DynamicArray(child) => {
                let (len, body) = split_length_prefix(bytes)?;
                decode_sequence(&vec![child.as_ref().clone(); len], body)
            }
            ABIType::Tuple(children) => decode_sequence(children, bytes),
        }
    }
}

enum Head {
    Fixed(Vec<u8>),
    /// Offset placeholder for the tail at this index.
    Offset(usize),
}

/// Head/tail encoding shared by tuples and arrays.
fn encode_sequence(types: &[ABIType], values: &[ABIValue]) -> Result<Vec<u8>, ABIError> {
    if types.len() != values.len() {
        return Err(ABIError::encoding(format!(
            "Expected {} values, got {}",
            types.len(),
            values.len()
        )));
    }

    let mut heads = Vec::new();
    let mut tails: Vec<Vec<u8>> = Vec::new();
    let mut index = 0;
    while index < types.len() {
        let child = &types[index];
        if child.is_dynamic() {
            heads.push(Head::Offset(tails.len()));
            tails.push(child.encode(&values[index])?);
            index += 1;
        } else if *child == ABIType::Bool {
            let end = bool_run_end(types, index);
            heads.push(Head::Fixed(vec![pack_bools(&values[index..end])?]));
            index = end;
        } else {
            heads.push(Head::Fixed(child.encode(&values[index])?));
            index += 1;
        }
    }

    let head_len: usize = heads
        .iter()
        .map(|head| match head {
            Head::Fixed(bytes) => bytes.len(),
            Head::Offset(_) => LENGTH_PREFIX_SIZE,
        })
        .sum();

    let mut out = Vec::with_capacity(head_len + tails.iter().map(Vec::len).sum::<usize>());
    for head in &heads {
        match head {
            Head::Fixed(bytes) => out.extend_from_slice(bytes),
            Head::Offset(tail_index) => {
                let offset = head_len + tails[..*tail_index].iter().map(Vec::len).sum::<usize>();
                out.extend(u16_be(offset)?);
            }
        }
    }
    for tail in tails {
        out.extend(tail);
    }
    Ok(out)
}

fn decode_sequence(types: &[ABIType], bytes: &[u8]) -> Result<ABIValue, ABIError> {
    let mut values: Vec<Option<ABIValue>> = vec![None; types.len()];
    let mut dynamic: Vec<(usize, usize)> = Vec::new();
    let mut cursor = 0;
    let mut index = 0;

    while index < types.len() {
        let child = &types[index];
        if child.is_dynamic() {
            let offset = read_u16(bytes, cursor)?;
            if let Some((_, previous)) = dynamic.last() {
                if offset < *previous {
                    return Err(ABIError::decoding("Dynamic offsets are not ascending"));
                }
            }
            dynamic.push((index, offset));
            cursor += LENGTH_PREFIX_SIZE;
            index += 1;
        } else if *child == ABIType::Bool {
            let end = bool_run_end(types, index);
            let packed = *bytes
                .get(cursor)
                .ok_or_else(|| ABIError::decoding("Input ended inside a bool run"))?;
            for (bit, slot) in (index..end).enumerate() {
                values[slot] = Some(ABIValue::Bool(packed & (BOOL_TRUE_BYTE >> bit) != 0));
            }
            cursor += 1;
            index = end;
        } else {
            let size = child
                .static_size()
                .ok_or_else(|| ABIError::decoding(format!("{} has no static size", child)))?;
            let slice = bytes.get(cursor..cursor + size).ok_or_else(|| {
                ABIError::decoding(format!(
                    "Need {} bytes at offset {} for {}, input has {}",
                    size,
                    cursor,
                    child,
                    bytes.len()
                ))
            })?;
            values[index] = Some(child.decode(slice)?);
            cursor += size;
            index += 1;
        }
    }

    if dynamic.is_empty() {
        if cursor != bytes.len() {
            return Err(ABIError::decoding(format!(
                "{} trailing bytes after static values",
                bytes.len() - cursor
            )));
        }
    } else if dynamic[0].1 != cursor {
        return Err(ABIError::decoding(
            "First dynamic value does not start after the head",
        ));
    }

    for (position, (slot, start)) in dynamic.iter().enumerate() {
        let end = dynamic
            .get(position + 1)
            .map(|(_, next)| *next)
            .unwrap_or(bytes.len());
        let slice = bytes.get(*start..end).ok_or_else(|| {
            ABIError::decoding(format!("Dynamic offset {} is out of bounds", start))
        })?;
        values[*slot] = Some(types[*slot].decode(slice)?);
    }

    values
        .into_iter()
        .map(|value| value.ok_or_else(|| ABIError::decoding("Sequence element was not decoded")))
        .collect::<Result<Vec<_>, _>>()
        .map(ABIValue::Array)
}

fn pack_bools(values: &[ABIValue]) -> Result<u8, ABIError> {
    values
        .iter()
        .enumerate()
        .try_fold(0u8, |packed, (bit, value)| match value {
            ABIValue::Bool(true) => Ok(packed | (BOOL_TRUE_BYTE >> bit)),
            ABIValue::Bool(false) => Ok(packed),
            other => Err(ABIError::encoding(format!(
                "Expected a bool, got {:?}",
                other
            ))),
        })
}

fn u16_be(value: usize) -> Result<[u8; 2], ABIError> {
    u16::try_from(value)
        .map(u16::to_be_bytes)
        .map_err(|_| ABIError::encoding(format!("{} does not fit in a u16 length", value)))
}

fn length_prefix(len: usize) -> Result<Vec<u8>, ABIError> {
    Ok(u16_be(len)?.to_vec())
}

fn read_u16(bytes: &[u8], at: usize) -> Result<usize, ABIError> {
    match bytes.get(at..at + LENGTH_PREFIX_SIZE) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo]) as usize),
        _ => Err(ABIError::decoding(format!(
            "Input too short to read a u16 at offset {}",
            at
        ))),
    }
}

fn split_length_prefix(bytes: &[u8]) -> Result<(usize, &[u8]), ABIError> {
    let len = read_u16(bytes, 0)?;
    Ok((len, &bytes[LENGTH_PREFIX_SIZE..]))
}

fn expect_len(abi_type: &ABIType, bytes: &[u8], expected: usize) -> Result<(), ABIError> {
    if bytes.len() != expected {
        return Err(ABIError::decoding(format!(
            "{} needs {} bytes, got {}",
            abi_type,
            expected,
            bytes.len()
        )));
    }
    Ok(())
}

/// Decodes a base32 address and verifies its checksum.
pub(crate) fn public_key_from_address(
    address: &str,
) -> Result<[u8; PUBLIC_KEY_LENGTH], ABIError> {
    if address.len() != ADDRESS_LENGTH {
        return Err(ABIError::validation(format!(
            "Address must be {} characters, got {}",
            ADDRESS_LENGTH,
            address.len()
        )));
    }
    let decoded = base32::decode(BASE32, address)
        .ok_or_else(|| ABIError::validation(format!("Address {} is not base32", address)))?;
    let (key, checksum) = decoded.split_at(PUBLIC_KEY_LENGTH);
    if checksum != address_checksum(key) {
        return Err(ABIError::validation(format!(
            "Address {} has an invalid checksum",
            address
        )));
    }
    let mut public_key = [0u8; PUBLIC_KEY_LENGTH];
    public_key.copy_from_slice(key);
    Ok(public_key)
}

pub(crate) fn address_from_public_key(public_key: &[u8]) -> String {
    let mut buffer = public_key.to_vec();
    buffer.extend_from_slice(&address_checksum(public_key));
    base32::encode(BASE32, &buffer)
}

fn address_checksum(public_key: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let digest = Sha512_256::digest(public_key);
    let mut checksum = [0u8; CHECKSUM_LENGTH];
    checksum.copy_from_slice(&digest[digest.len() - CHECKSUM_LENGTH..]);
    checksum
}
