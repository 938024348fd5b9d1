//! Conversion between caller-supplied JSON values and typed ABI values.

use algomint_abi::{ABIType, ABIValue};
use algomint_transact::Address;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use num_bigint::BigUint;
use serde_json::Value;
use std::str::FromStr;

/// Parses a raw argument into a value of `abi_type`. Errors are plain messages; the caller
/// attaches the argument name.
///
/// Byte arrays given as text are read as UTF-8 unless prefixed with `0x` (hex) or
/// `base64:`.
pub fn parse_value(abi_type: &ABIType, raw: &Value) -> Result<ABIValue, String> {
    if raw.is_null() {
        return Err("no value was supplied".to_string());
    }
    match abi_type {
        ABIType::Uint(_) => parse_uint(raw).map(ABIValue::Uint),
        ABIType::UFixed(_, precision) => {
            parse_ufixed(raw, usize::from(precision.value())).map(ABIValue::Uint)
        }
        ABIType::Bool => parse_bool(raw).map(ABIValue::Bool),
        ABIType::Byte => {
            let n = parse_uint(raw)?;
            u8::try_from(&n)
                .map(ABIValue::Byte)
                .map_err(|_| format!("{} does not fit in a byte", n))
        }
        ABIType::Address => {
            let text = expect_str(raw, "an address")?.trim();
            text.parse::<Address>().map_err(|e| e.to_string())?;
            Ok(ABIValue::address(text))
        }
        ABIType::String => expect_str(raw, "text").map(ABIValue::from),
        byte_array if byte_array.is_byte_array() && !looks_like_json_array(raw) => {
            let text = expect_str(raw, "bytes")?;
            let expected_len = match byte_array {
                ABIType::StaticArray(_, len) => Some(*len),
                _ => None,
            };
            parse_bytes(text, expected_len).map(|bytes| ABIValue::from_bytes(&bytes))
        }
        ABIType::StaticArray(child, _) | ABIType::DynamicArray(child) => expect_array(raw)?
            .iter()
            .map(|item| parse_value(child, item))
            .collect::<Result<Vec<_>, _>>()
            .map(ABIValue::Array),
        ABIType::Tuple(children) => {
            let items = expect_array(raw)?;
            if items.len() != children.len() {
                return Err(format!(
                    "{} expects {} elements, got {}",
                    abi_type,
                    children.len(),
                    items.len()
                ));
            }
            children
                .iter()
                .zip(items.iter())
                .map(|(child, item)| parse_value(child, item))
                .collect::<Result<Vec<_>, _>>()
                .map(ABIValue::Array)
        }
    }
}

/// Renders a decoded value as JSON; integers too large for `u64` become decimal strings.
pub fn abi_value_to_json(value: &ABIValue) -> Value {
    match value {
        ABIValue::Bool(b) => Value::Bool(*b),
        ABIValue::Uint(n) => u64::try_from(n)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(n.to_string())),
        ABIValue::String(s) | ABIValue::Address(s) => Value::String(s.clone()),
        ABIValue::Byte(b) => Value::from(*b),
        ABIValue::Array(items) => Value::Array(items.iter().map(abi_value_to_json).collect()),
    }
}

pub(crate) fn parse_uint(raw: &Value) -> Result<BigUint, String> {
    match raw {
        Value::Number(n) => n
            .as_u64()
            .map(BigUint::from)
            .ok_or_else(|| format!("{} is not an unsigned integer", n)),
        Value::String(s) => BigUint::from_str(s.trim())
            .map_err(|_| format!("'{}' is not an unsigned integer", s)),
        other => Err(format!("expected an unsigned integer, got {}", other)),
    }
}

fn parse_ufixed(raw: &Value, precision: usize) -> Result<BigUint, String> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(format!("expected a decimal, got {}", other)),
    };
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > precision {
        return Err(format!(
            "'{}' has more than {} decimal places",
            text, precision
        ));
    }
    let digits = format!("{}{}{}", whole, fraction, "0".repeat(precision - fraction.len()));
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not an unsigned decimal", text));
    }
    BigUint::from_str(&digits).map_err(|_| format!("'{}' is not an unsigned decimal", text))
}

fn parse_bool(raw: &Value) -> Result<bool, String> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(format!("{} is not a boolean", n)),
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(format!("'{}' is not a boolean", s)),
        },
        other => Err(format!("expected a boolean, got {}", other)),
    }
}

/// `0x` hex or `base64:` encoded bytes, otherwise the UTF-8 text itself.
fn parse_bytes(text: &str, expected_len: Option<usize>) -> Result<Vec<u8>, String> {
    let bytes = if let Some(hex_digits) = text.strip_prefix("0x") {
        hex::decode(hex_digits).map_err(|e| format!("invalid hex: {}", e))?
    } else if let Some(encoded) = text.strip_prefix("base64:") {
        BASE64_STANDARD
            .decode(encoded)
            .map_err(|e| format!("invalid base64: {}", e))?
    } else {
        text.as_bytes().to_vec()
    };
    check_len(bytes, expected_len)
}

fn check_len(bytes: Vec<u8>, expected_len: Option<usize>) -> Result<Vec<u8>, String> {
    match expected_len {
        Some(len) if bytes.len() != len => {
            Err(format!("expected {} bytes, got {}", len, bytes.len()))
        }
        _ => Ok(bytes),
    }
}

fn expect_str<'a>(raw: &'a Value, what: &str) -> Result<&'a str, String> {
    raw.as_str()
        .ok_or_else(|| format!("expected {} as a string, got {}", what, raw))
}

fn looks_like_json_array(raw: &Value) -> bool {
    match raw {
        Value::Array(_) => true,
        Value::String(s) => s.trim_start().starts_with('['),
        _ => false,
    }
}

fn expect_array(raw: &Value) -> Result<Vec<Value>, String> {
    match raw {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) if s.trim_start().starts_with('[') => {
            serde_json::from_str(s).map_err(|e| format!("invalid array: {}", e))
        }
        other => Err(format!("expected an array, got {}", other)),
    }
}
