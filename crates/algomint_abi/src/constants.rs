use regex::Regex;
use std::sync::LazyLock;

pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const CHECKSUM_LENGTH: usize = 4;
pub const ADDRESS_LENGTH: usize = 58;

/// Dynamic values and offsets are prefixed with a big-endian u16.
pub const LENGTH_PREFIX_SIZE: usize = 2;

pub const BOOL_TRUE_BYTE: u8 = 0x80;
pub const BOOL_FALSE_BYTE: u8 = 0x00;
pub const BITS_PER_BYTE: usize = 8;

pub const MAX_BIT_SIZE: u16 = 512;
pub const MAX_PRECISION: u8 = 160;

pub const SELECTOR_LENGTH: usize = 4;
pub const VOID_RETURN_TYPE: &str = "void";

/// Prefix the AVM puts in front of a logged ABI return value.
pub const ABI_RETURN_PREFIX: [u8; 4] = [0x15, 0x1f, 0x7c, 0x75];

pub static STATIC_ARRAY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z\d\[\](),]+)\[(0|[1-9][\d]*)]$").expect("Invalid static array regex")
});

pub static UFIXED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ufixed([1-9][\d]*)x([1-9][\d]*)$").expect("Invalid ufixed regex")
});
