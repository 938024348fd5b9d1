use crate::{
    ABIError,
    constants::{
        BITS_PER_BYTE, MAX_BIT_SIZE, MAX_PRECISION, PUBLIC_KEY_LENGTH, STATIC_ARRAY_REGEX,
        UFIXED_REGEX,
    },
};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Bit width of a `uint<N>` or `ufixed<N>x<M>` type: 8..=512 and a multiple of 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSize(u16);

impl BitSize {
    pub fn new(bits: u16) -> Result<Self, ABIError> {
        let byte = BITS_PER_BYTE as u16;
        if bits < byte || bits > MAX_BIT_SIZE || bits % byte != 0 {
            return Err(ABIError::validation(format!(
                "Bit size must be between {} and {} and divisible by {}, got {}",
                byte, MAX_BIT_SIZE, byte, bits
            )));
        }
        Ok(BitSize(bits))
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn byte_len(&self) -> usize {
        self.0 as usize / BITS_PER_BYTE
    }
}

/// Decimal precision of a `ufixed<N>x<M>` type: 1..=160.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision(u8);

impl Precision {
    pub fn new(precision: u8) -> Result<Self, ABIError> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(ABIError::validation(format!(
                "Precision must be between 1 and {}, got {}",
                MAX_PRECISION, precision
            )));
        }
        Ok(Precision(precision))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// An ARC-4 value type.
///
/// Parsed from and rendered to the canonical type string used in method signatures,
/// so `ABIType::from_str(t)?.to_string() == t` for every well-formed `t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ABIType {
    Uint(BitSize),
    UFixed(BitSize, Precision),
    Address,
    Bool,
    Byte,
    String,
    StaticArray(Box<ABIType>, usize),
    DynamicArray(Box<ABIType>),
    Tuple(Vec<ABIType>),
}

impl ABIType {
    /// `uint64`, the type every reference argument is widened to before encoding as an index.
    pub fn uint64() -> Self {
        ABIType::Uint(BitSize(64))
    }

    /// `uint8`, the encoded form of a reference argument.
    pub fn uint8() -> Self {
        ABIType::Uint(BitSize(8))
    }

    /// Whether the encoding of this type has a length that depends on the value.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ABIType::String | ABIType::DynamicArray(_) => true,
            ABIType::StaticArray(child, _) => child.is_dynamic(),
            ABIType::Tuple(children) => children.iter().any(ABIType::is_dynamic),
            _ => false,
        }
    }

    /// Whether this is `byte[]` or `byte[N]`, which accept raw byte input.
    pub fn is_byte_array(&self) -> bool {
        matches!(
            self,
            ABIType::DynamicArray(child) | ABIType::StaticArray(child, _) if **child == ABIType::Byte
        )
    }

    /// Encoded length of a static type, `None` for dynamic ones.
    pub fn static_size(&self) -> Option<usize> {
        match self {
            ABIType::Uint(bits) | ABIType::UFixed(bits, _) => Some(bits.byte_len()),
            ABIType::Address => Some(PUBLIC_KEY_LENGTH),
            ABIType::Bool | ABIType::Byte => Some(1),
            ABIType::String | ABIType::DynamicArray(_) => None,
            ABIType::StaticArray(child, len) => match child.as_ref() {
                ABIType::Bool => Some(len.div_ceil(BITS_PER_BYTE)),
                other => other.static_size().map(|size| size * len),
            },
            ABIType::Tuple(children) => {
                let mut size = 0;
                let mut index = 0;
                while index < children.len() {
                    if children[index] == ABIType::Bool {
                        // a run of up to eight bools shares one byte
                        index = bool_run_end(children, index);
                        size += 1;
                    } else {
                        size += children[index].static_size()?;
                        index += 1;
                    }
                }
                Some(size)
            }
        }
    }
}

/// Exclusive end of the run of consecutive `bool` types starting at `start`, capped at eight.
pub(crate) fn bool_run_end(types: &[ABIType], start: usize) -> usize {
    let mut end = start;
    while end < types.len() && types[end] == ABIType::Bool && end - start < BITS_PER_BYTE {
        end += 1;
    }
    end
}

impl Display for ABIType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ABIType::Uint(bits) => write!(f, "uint{}", bits.value()),
            ABIType::UFixed(bits, precision) => {
                write!(f, "ufixed{}x{}", bits.value(), precision.value())
            }
            ABIType::Address => f.write_str("address"),
            ABIType::Bool => f.write_str("bool"),
            ABIType::Byte => f.write_str("byte"),
            ABIType::String => f.write_str("string"),
            ABIType::StaticArray(child, len) => write!(f, "{}[{}]", child, len),
            ABIType::DynamicArray(child) => write!(f, "{}[]", child),
            ABIType::Tuple(children) => {
                let inner: Vec<String> = children.iter().map(ToString::to_string).collect();
                write!(f, "({})", inner.join(","))
            }
        }
    }
}

impl FromStr for ABIType {
    type Err = ABIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(element) = s.strip_suffix("[]") {
            return Ok(ABIType::DynamicArray(Box::new(element.parse()?)));
        }

        if s.ends_with(']') {
            let captures = STATIC_ARRAY_REGEX
                .captures(s)
                .ok_or_else(|| ABIError::validation(format!("Malformed static array: {}", s)))?;
            let len = captures[2].parse::<usize>().map_err(|_| {
                ABIError::validation(format!("Invalid array length: {}", &captures[2]))
            })?;
            return Ok(ABIType::StaticArray(Box::new(captures[1].parse()?), len));
        }

        if let Some(digits) = s.strip_prefix("uint") {
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(ABIError::validation(format!("Malformed uint type: {}", s)));
            }
            let bits = digits
                .parse::<u16>()
                .map_err(|_| ABIError::validation(format!("Invalid uint size: {}", digits)))?;
            return Ok(ABIType::Uint(BitSize::new(bits)?));
        }

        if s.starts_with("ufixed") {
            let captures = UFIXED_REGEX
                .captures(s)
                .ok_or_else(|| ABIError::validation(format!("Malformed ufixed type: {}", s)))?;
            let bits = captures[1].parse::<u16>().map_err(|_| {
                ABIError::validation(format!("Invalid ufixed size: {}", &captures[1]))
            })?;
            let precision = captures[2].parse::<u8>().map_err(|_| {
                ABIError::validation(format!("Invalid ufixed precision: {}", &captures[2]))
            })?;
            return Ok(ABIType::UFixed(
                BitSize::new(bits)?,
                Precision::new(precision)?,
            ));
        }

        if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
            let children = split_top_level(&s[1..s.len() - 1])?
                .into_iter()
                .map(str::parse)
                .collect::<Result<Vec<ABIType>, _>>()?;
            return Ok(ABIType::Tuple(children));
        }

        match s {
            "address" => Ok(ABIType::Address),
            "bool" => Ok(ABIType::Bool),
            "byte" => Ok(ABIType::Byte),
            "string" => Ok(ABIType::String),
            _ => Err(ABIError::validation(format!(
                "Cannot convert '{}' to an ABI type",
                s
            ))),
        }
    }
}

/// Splits a comma separated list on commas that are not nested inside parentheses.
pub(crate) fn split_top_level(content: &str) -> Result<Vec<&str>, ABIError> {
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    for (index, ch) in content.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ABIError::validation(format!(
                        "Unbalanced parentheses in '{}'",
                        content
                    )));
                }
            }
            ',' if depth == 0 => {
                parts.push(&content[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ABIError::validation(format!(
            "Unbalanced parentheses in '{}'",
            content
        )));
    }
    parts.push(&content[start..]);

    if parts.iter().any(|part| part.is_empty()) {
        return Err(ABIError::validation(format!(
            "Empty type in list '{}'",
            content
        )));
    }
    Ok(parts)
}
