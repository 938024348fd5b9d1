//! Typed value codec for Algorand ABI methods as defined in [ARC-4](https://arc.algorand.foundation/ARCs/arc-0004),
//! plus the JSON application specifications (ARC-32 and ARC-56) that describe them.
pub mod abi_type;
pub mod abi_value;
pub mod app_spec;
mod codec;
pub mod constants;
pub mod error;
pub mod method;

pub use abi_type::ABIType;
pub use abi_value::ABIValue;
pub use app_spec::{Arc32AppSpec, Arc56AppSpec};
pub use error::ABIError;
pub use method::{
    ABIMethod, ABIMethodArg, ABIMethodArgType, ABIReferenceType, ABIReturn, ABITransactionType,
};
