use crate::stage::DeploymentStage;
use algomint_abi::ABIError;
use algomint_transact::AlgoMintTransactError;
use snafu::Snafu;

/// Wallet phrases for the user backing out. Bare words like "closed" also show up in
/// transport failures, so only whole phrases count.
const CANCELLATION_PHRASES: [&str; 14] = [
    "user rejected",
    "rejected by user",
    "rejected by the user",
    "request rejected",
    "modal closed",
    "closed by user",
    "closed by the user",
    "user cancelled",
    "user canceled",
    "cancelled by user",
    "canceled by user",
    "cancelled by the user",
    "user denied",
    "denied by user",
];

#[derive(Debug, Snafu)]
pub enum DeployError {
    #[snafu(display("Deployment cancelled by the user during {stage} ({action})"))]
    UserCancelled {
        stage: DeploymentStage,
        action: String,
    },

    #[snafu(display("Cannot encode argument '{argument}': {message}"))]
    ArgumentEncoding { argument: String, message: String },

    #[snafu(display("{message}"))]
    PlanningAmbiguity { message: String },

    #[snafu(display("Signing failed during {stage} ({action}): {message}"))]
    Signing {
        stage: DeploymentStage,
        action: String,
        message: String,
    },

    #[snafu(display(
        "Submission of transaction {transaction_id} failed during {stage} ({action}): {message}"
    ))]
    Submission {
        stage: DeploymentStage,
        action: String,
        transaction_id: String,
        message: String,
    },

    /// `transaction_id` is the initialization call, when it was built.
    #[snafu(display(
        "App {app_id} was created but {action} did not complete during {stage}{}: {message}",
        transaction_id.as_deref().map(|id| format!(" (transaction {id})")).unwrap_or_default()
    ))]
    PartialDeployment {
        app_id: u64,
        stage: DeploymentStage,
        action: String,
        transaction_id: Option<String>,
        message: String,
    },

    #[snafu(display("Network preparation failed during {stage} ({action}): {message}"))]
    Preparation {
        stage: DeploymentStage,
        action: String,
        message: String,
    },

    #[snafu(display("Build error: {message}"))]
    Build { message: String },

    #[snafu(display("Validation error: {message}"))]
    Validation { message: String },

    #[snafu(display("Interface spec error: {message}"))]
    InterfaceSpec { message: String },

    /// A component error raised while the orchestrator was in `stage`.
    #[snafu(display("{action} failed during {stage}: {source}"))]
    Failed {
        stage: DeploymentStage,
        action: String,
        #[snafu(source(from(DeployError, Box::new)))]
        source: Box<DeployError>,
    },
}

impl DeployError {
    /// Classifies a signer's error message as a cancellation or a signing failure.
    pub fn from_signer_message(
        message: String,
        stage: DeploymentStage,
        action: impl Into<String>,
    ) -> Self {
        let lowered = message.to_lowercase();
        let action = action.into();
        if CANCELLATION_PHRASES
            .iter()
            .any(|phrase| lowered.contains(phrase))
        {
            DeployError::UserCancelled { stage, action }
        } else {
            DeployError::Signing {
                stage,
                action,
                message,
            }
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, DeployError::UserCancelled { .. })
    }

    /// The stage a failure happened in, when the error was raised by the orchestrator.
    pub fn stage(&self) -> Option<DeploymentStage> {
        match self {
            DeployError::UserCancelled { stage, .. }
            | DeployError::Signing { stage, .. }
            | DeployError::Submission { stage, .. }
            | DeployError::PartialDeployment { stage, .. }
            | DeployError::Preparation { stage, .. }
            | DeployError::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The app id that is live on chain despite the error.
    pub fn live_app_id(&self) -> Option<u64> {
        match self {
            DeployError::PartialDeployment { app_id, .. } => Some(*app_id),
            _ => None,
        }
    }

    /// The id of the transaction that may have reached the network, for manual follow-up.
    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            DeployError::Submission { transaction_id, .. } => Some(transaction_id),
            DeployError::PartialDeployment { transaction_id, .. } => transaction_id.as_deref(),
            DeployError::Failed { source, .. } => source.transaction_id(),
            _ => None,
        }
    }

    pub(crate) fn argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        DeployError::ArgumentEncoding {
            argument: argument.into(),
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        DeployError::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn at(self, stage: DeploymentStage, action: impl Into<String>) -> Self {
        if self.stage().is_some() {
            return self;
        }
        DeployError::Failed {
            stage,
            action: action.into(),
            source: Box::new(self),
        }
    }
}

impl From<AlgoMintTransactError> for DeployError {
    fn from(e: AlgoMintTransactError) -> Self {
        DeployError::Build {
            message: e.to_string(),
        }
    }
}

impl From<ABIError> for DeployError {
    fn from(e: ABIError) -> Self {
        DeployError::InterfaceSpec {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("User Rejected Request", true)]
    #[case("Request rejected", true)]
    #[case("Modal closed by user", true)]
    #[case("Operation cancelled by user", true)]
    #[case("The user denied the signature", true)]
    #[case("WebSocket connection closed unexpectedly", false)]
    #[case("Permission denied", false)]
    #[case("Connection aborted", false)]
    #[case("Ledger device disconnected", false)]
    #[case("insufficient funds", false)]
    fn classifies_signer_messages(#[case] message: &str, #[case] cancelled: bool) {
        let error = DeployError::from_signer_message(
            message.to_string(),
            DeploymentStage::AwaitingSignature,
            "sign create transaction",
        );
        assert_eq!(error.is_cancellation(), cancelled);
        assert_eq!(error.stage(), Some(DeploymentStage::AwaitingSignature));
    }

    #[test]
    fn submission_errors_name_their_transaction() {
        let error = DeployError::Submission {
            stage: DeploymentStage::Submitting,
            action: "submit create transaction".to_string(),
            transaction_id: "TXID".to_string(),
            message: "node unavailable".to_string(),
        };
        assert_eq!(error.transaction_id(), Some("TXID"));
        assert!(error.to_string().contains("transaction TXID"));

        let partial = DeployError::PartialDeployment {
            app_id: 7,
            stage: DeploymentStage::AwaitingSecondSignature,
            action: "sign initialization call".to_string(),
            transaction_id: None,
            message: "declined".to_string(),
        };
        assert_eq!(partial.transaction_id(), None);
        assert_eq!(partial.live_app_id(), Some(7));
        assert!(!partial.to_string().contains("transaction"));
    }

    #[test]
    fn component_errors_gain_stage_once() {
        let error = DeployError::validation("bad")
            .at(DeploymentStage::Building, "build create transaction")
            .at(DeploymentStage::Submitting, "ignored");
        assert_eq!(error.stage(), Some(DeploymentStage::Building));
        assert!(error.to_string().contains("build create transaction"));
    }
}
