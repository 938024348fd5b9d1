use snafu::Snafu;

/// Errors raised while parsing ABI types, method signatures or app specs, and while
/// encoding or decoding values.
#[derive(Debug, Snafu)]
pub enum ABIError {
    #[snafu(display("ABI validation failed: {message}"))]
    ValidationError { message: String },

    #[snafu(display("ABI encoding failed: {message}"))]
    EncodingError { message: String },

    #[snafu(display("ABI decoding failed: {message}"))]
    DecodingError { message: String },

    #[snafu(display("App spec could not be parsed: {source}"))]
    AppSpecJson { source: serde_json::Error },
}

impl ABIError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ABIError::ValidationError {
            message: message.into(),
        }
    }

    pub(crate) fn encoding(message: impl Into<String>) -> Self {
        ABIError::EncodingError {
            message: message.into(),
        }
    }

    pub(crate) fn decoding(message: impl Into<String>) -> Self {
        ABIError::DecodingError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ABIError {
    fn from(source: serde_json::Error) -> Self {
        ABIError::AppSpecJson { source }
    }
}
