use sha2::{Digest, Sha512_256};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::{
    ABIError, ABIType, ABIValue,
    abi_type::split_top_level,
    constants::{ABI_RETURN_PREFIX, SELECTOR_LENGTH, VOID_RETURN_TYPE},
};

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),*
        }

        impl FromStr for $name {
            type Err = ABIError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)*
                    _ => Err(ABIError::validation(format!(
                        concat!("Invalid ", stringify!($name), ": {}"),
                        s
                    ))),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                f.write_str(match self {
                    $($name::$variant => $text),*
                })
            }
        }
    };
}

keyword_enum!(
    /// A transaction that must precede the app call in its group.
    ABITransactionType {
        Txn => "txn",
        Payment => "pay",
        KeyRegistration => "keyreg",
        AssetConfig => "acfg",
        AssetTransfer => "axfer",
        AssetFreeze => "afrz",
        ApplicationCall => "appl",
    }
);

keyword_enum!(
    /// A resource passed as an index into one of the transaction's foreign arrays.
    ABIReferenceType {
        Account => "account",
        Application => "application",
        Asset => "asset",
    }
);

/// How a method argument reaches the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ABIMethodArgType {
    /// Encoded directly into an app argument.
    Value(ABIType),
    /// A preceding transaction in the group.
    Transaction(ABITransactionType),
    /// A `uint8` index into the apps, accounts or assets array.
    Reference(ABIReferenceType),
}

impl ABIMethodArgType {
    pub fn is_reference(&self) -> bool {
        matches!(self, ABIMethodArgType::Reference(_))
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, ABIMethodArgType::Transaction(_))
    }
}

impl FromStr for ABIMethodArgType {
    type Err = ABIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(txn) = s.parse::<ABITransactionType>() {
            return Ok(ABIMethodArgType::Transaction(txn));
        }
        if let Ok(reference) = s.parse::<ABIReferenceType>() {
            return Ok(ABIMethodArgType::Reference(reference));
        }
        Ok(ABIMethodArgType::Value(s.parse()?))
    }
}

impl Display for ABIMethodArgType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ABIMethodArgType::Value(abi_type) => write!(f, "{}", abi_type),
            ABIMethodArgType::Transaction(txn) => write!(f, "{}", txn),
            ABIMethodArgType::Reference(reference) => write!(f, "{}", reference),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ABIMethodArg {
    pub arg_type: ABIMethodArgType,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ABIMethodArg {
    pub fn new(arg_type: ABIMethodArgType, name: Option<String>) -> Self {
        Self {
            arg_type,
            name,
            description: None,
        }
    }
}

/// A parsed ABI method: name, ordered arguments and return type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ABIMethod {
    pub name: String,
    pub args: Vec<ABIMethodArg>,
    /// `None` for `void`.
    pub returns: Option<ABIType>,
    pub readonly: bool,
    pub description: Option<String>,
}

impl ABIMethod {
    pub fn new(name: impl Into<String>, args: Vec<ABIMethodArg>, returns: Option<ABIType>) -> Self {
        Self {
            name: name.into(),
            args,
            returns,
            ..Default::default()
        }
    }

    /// Canonical signature, e.g. `add(uint64,uint64)uint64`.
    pub fn signature(&self) -> Result<String, ABIError> {
        if self.name.is_empty() {
            return Err(ABIError::validation("Method name cannot be empty"));
        }
        if self.name.chars().any(|c| c.is_whitespace() || c == '(' || c == ')') {
            return Err(ABIError::validation(format!(
                "Method name '{}' is not a valid identifier",
                self.name
            )));
        }
        let args: Vec<String> = self.args.iter().map(|a| a.arg_type.to_string()).collect();
        let returns = self
            .returns
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| VOID_RETURN_TYPE.to_string());
        Ok(format!("{}({}){}", self.name, args.join(","), returns))
    }

    /// First four bytes of the SHA-512/256 digest of the signature.
    pub fn selector(&self) -> Result<[u8; SELECTOR_LENGTH], ABIError> {
        let digest = Sha512_256::digest(self.signature()?.as_bytes());
        let mut selector = [0u8; SELECTOR_LENGTH];
        selector.copy_from_slice(&digest[..SELECTOR_LENGTH]);
        Ok(selector)
    }

    pub fn has_transaction_args(&self) -> bool {
        self.args.iter().any(|arg| arg.arg_type.is_transaction())
    }

    /// Finds the ABI return value in a transaction's logs.
    ///
    /// The AVM logs the return as `0x151f7c75 || encoded value`; the last such log wins.
    /// Returns `Ok(None)` for `void` methods or when no log carries the prefix.
    pub fn decode_return(&self, logs: &[Vec<u8>]) -> Result<Option<ABIReturn>, ABIError> {
        let Some(return_type) = &self.returns else {
            return Ok(None);
        };
        let Some(log) = logs
            .iter()
            .rev()
            .find(|log| log.starts_with(&ABI_RETURN_PREFIX))
        else {
            return Ok(None);
        };
        let raw = log[ABI_RETURN_PREFIX.len()..].to_vec();
        let value = return_type.decode(&raw)?;
        Ok(Some(ABIReturn {
            method_name: self.name.clone(),
            raw_return_value: raw,
            return_value: value,
        }))
    }
}

impl FromStr for ABIMethod {
    type Err = ABIError;

    fn from_str(signature: &str) -> Result<Self, Self::Err> {
        if signature.chars().any(char::is_whitespace) {
            return Err(ABIError::validation(
                "Method signature cannot contain whitespace",
            ));
        }
        let open = signature.find('(').ok_or_else(|| {
            ABIError::validation(format!("Signature '{}' has no argument list", signature))
        })?;
        if open == 0 {
            return Err(ABIError::validation("Method name cannot be empty"));
        }

        let mut depth = 0usize;
        let mut close = None;
        for (index, ch) in signature[open..].char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + index);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close = close.ok_or_else(|| {
            ABIError::validation(format!("Unbalanced parentheses in '{}'", signature))
        })?;

        let args = split_top_level(&signature[open + 1..close])?
            .into_iter()
            .enumerate()
            .map(|(i, arg)| -> Result<ABIMethodArg, ABIError> {
                Ok(ABIMethodArg::new(arg.parse()?, Some(format!("arg{}", i))))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let returns = match &signature[close + 1..] {
            "" | VOID_RETURN_TYPE => None,
            other => Some(other.parse()?),
        };

        Ok(ABIMethod::new(&signature[..open], args, returns))
    }
}

/// A decoded ABI return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ABIReturn {
    pub method_name: String,
    pub raw_return_value: Vec<u8>,
    pub return_value: ABIValue,
}
