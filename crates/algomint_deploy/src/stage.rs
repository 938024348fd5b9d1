use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Where a deployment currently is.
///
/// Stages only move forward. The exceptions are `Failed`, which ends a deployment, and a
/// cancelled signature, which returns to `Idle`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeploymentStage {
    #[default]
    Idle,
    Preparing,
    Building,
    AwaitingSignature,
    Submitting,
    AwaitingSecondSignature,
    SubmittingSecond,
    Confirmed,
    Failed,
}

impl DeploymentStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStage::Confirmed | DeploymentStage::Failed)
    }

    pub fn is_awaiting_signature(&self) -> bool {
        matches!(
            self,
            DeploymentStage::AwaitingSignature | DeploymentStage::AwaitingSecondSignature
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: DeploymentStage) -> bool {
        use DeploymentStage::*;
        match (self, next) {
            (Confirmed | Failed, Idle) => true,
            (AwaitingSignature | AwaitingSecondSignature, Idle) => true,
            (Idle | Confirmed | Failed, Failed) => false,
            (_, Failed) => true,
            (Idle, Preparing)
            | (Preparing, Building)
            | (Building, AwaitingSignature)
            | (AwaitingSignature, Submitting)
            | (Submitting, Confirmed)
            | (Submitting, AwaitingSecondSignature)
            | (AwaitingSecondSignature, SubmittingSecond)
            | (SubmittingSecond, Confirmed) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DeploymentStage::*;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Idle, Preparing, true)]
    #[case(Submitting, Confirmed, true)]
    #[case(Submitting, AwaitingSecondSignature, true)]
    #[case(AwaitingSignature, Idle, true)]
    #[case(AwaitingSecondSignature, Idle, true)]
    #[case(SubmittingSecond, Idle, false)]
    #[case(Building, Preparing, false)]
    #[case(Confirmed, Submitting, false)]
    #[case(SubmittingSecond, Failed, true)]
    #[case(Failed, Failed, false)]
    #[case(Idle, Failed, false)]
    fn transitions(
        #[case] from: DeploymentStage,
        #[case] to: DeploymentStage,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn displays_variant_name() {
        assert_eq!(AwaitingSecondSignature.to_string(), "AwaitingSecondSignature");
    }
}
