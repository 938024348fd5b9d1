use num_bigint::BigUint;

/// A value that can be encoded as, or decoded from, an [`crate::ABIType`].
///
/// `ufixed` values are carried as their scaled integer in [`ABIValue::Uint`], and
/// tuples as well as arrays use [`ABIValue::Array`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ABIValue {
    Bool(bool),
    Uint(BigUint),
    String(String),
    Byte(u8),
    Array(Vec<ABIValue>),
    /// A 58 character base32 Algorand address.
    Address(String),
}

macro_rules! impl_from_uint {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ABIValue {
                fn from(value: $t) -> Self {
                    ABIValue::Uint(BigUint::from(value))
                }
            }
        )*
    };
}

impl_from_uint!(u8, u16, u32, u64, u128, usize);

impl From<BigUint> for ABIValue {
    fn from(value: BigUint) -> Self {
        ABIValue::Uint(value)
    }
}

impl From<bool> for ABIValue {
    fn from(value: bool) -> Self {
        ABIValue::Bool(value)
    }
}

impl From<&str> for ABIValue {
    fn from(value: &str) -> Self {
        ABIValue::String(value.to_string())
    }
}

impl From<String> for ABIValue {
    fn from(value: String) -> Self {
        ABIValue::String(value)
    }
}

impl From<Vec<ABIValue>> for ABIValue {
    fn from(value: Vec<ABIValue>) -> Self {
        ABIValue::Array(value)
    }
}

impl ABIValue {
    /// Wraps raw bytes as the value of a `byte[]` or `byte[N]`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        ABIValue::Array(bytes.iter().copied().map(ABIValue::Byte).collect())
    }

    pub fn address(value: impl Into<String>) -> Self {
        ABIValue::Address(value.into())
    }

    /// The integer as a `u64`, when it is a uint that fits.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ABIValue::Uint(n) => u64::try_from(n).ok(),
            _ => None,
        }
    }

    /// The bytes of a `byte[]` style value.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self {
            ABIValue::Array(items) => items
                .iter()
                .map(|item| match item {
                    ABIValue::Byte(b) => Some(*b),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}
