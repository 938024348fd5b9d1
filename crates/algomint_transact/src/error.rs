use snafu::Snafu;

/// Errors raised while building, validating or encoding transactions.
#[derive(Debug, Snafu)]
pub enum AlgoMintTransactError {
    #[snafu(display("Error ocurred during encoding: {source}"))]
    EncodingError { source: rmp_serde::encode::Error },

    #[snafu(display("Error ocurred during decoding: {source}"))]
    DecodingError { source: rmp_serde::decode::Error },

    #[snafu(display("Error ocurred during msgpack encoding: {source}"))]
    MsgpackEncodingError { source: rmpv::encode::Error },

    #[snafu(display("{message}"))]
    InputError { message: String },

    #[snafu(display("{message}"))]
    InvalidAddress { message: String },

    #[snafu(display("Transaction is invalid: {}", errors.join("; ")))]
    InvalidTransaction { errors: Vec<String> },
}

impl From<rmp_serde::encode::Error> for AlgoMintTransactError {
    fn from(source: rmp_serde::encode::Error) -> Self {
        AlgoMintTransactError::EncodingError { source }
    }
}

impl From<rmp_serde::decode::Error> for AlgoMintTransactError {
    fn from(source: rmp_serde::decode::Error) -> Self {
        AlgoMintTransactError::DecodingError { source }
    }
}

impl From<rmpv::encode::Error> for AlgoMintTransactError {
    fn from(source: rmpv::encode::Error) -> Self {
        AlgoMintTransactError::MsgpackEncodingError { source }
    }
}
