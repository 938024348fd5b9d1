use crate::error::DeployError;
use crate::planner::{PlanMode, PlanOutline};
use crate::resolver::{ForeignReferenceSet, ReferenceResolver};
use algomint_abi::ABIMethod;
use algomint_transact::OnApplicationComplete;
use log::warn;
use serde_json::Value;

/// Everything needed to build the deployment transactions, with arguments encoded once.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentPlan {
    /// The method the create (or second-phase) transaction calls.
    pub method: Option<ABIMethod>,
    pub mode: PlanMode,
    pub on_complete: OnApplicationComplete,
    /// App arguments, selector first. Empty for a bare create.
    pub args: Vec<Vec<u8>>,
    pub references: ForeignReferenceSet,
    pub warnings: Vec<String>,
    /// Arguments could not be encoded and were dropped in favour of a bare create.
    pub degraded: bool,
}

impl DeploymentPlan {
    /// Encodes the outlined method's arguments.
    ///
    /// When encoding fails and `allow_degraded` is set, the plan falls back to a bare create
    /// and records a warning instead of failing.
    pub fn assemble(
        outline: PlanOutline,
        resolver: &ReferenceResolver<'_>,
        raw_args: &[Value],
        allow_degraded: bool,
    ) -> Result<Self, DeployError> {
        let PlanOutline {
            selection,
            mode,
            create_on_complete,
            bare_on_complete,
            mut warnings,
        } = outline;

        let Some(selection) = selection else {
            return Ok(Self::bare(bare_on_complete, warnings, false));
        };

        let selector = selection.method.selector()?;
        let mut references = ForeignReferenceSet::new();
        match resolver.resolve(&selection.method, raw_args, &mut references) {
            Ok(encoded) => {
                let mut args = Vec::with_capacity(encoded.len() + 1);
                args.push(selector.to_vec());
                args.extend(encoded);
                Ok(Self {
                    method: Some(selection.method),
                    mode,
                    on_complete: create_on_complete,
                    args,
                    references,
                    warnings,
                    degraded: false,
                })
            }
            Err(error @ DeployError::ArgumentEncoding { .. }) if allow_degraded => {
                let message = format!(
                    "{}; creating '{}' without its arguments",
                    error, selection.method.name
                );
                warn!("{}", message);
                warnings.push(message);
                Ok(Self::bare(bare_on_complete, warnings, true))
            }
            Err(error) => Err(error),
        }
    }

    fn bare(on_complete: OnApplicationComplete, warnings: Vec<String>, degraded: bool) -> Self {
        Self {
            method: None,
            mode: PlanMode::Bare,
            on_complete,
            args: Vec::new(),
            references: ForeignReferenceSet::new(),
            warnings,
            degraded,
        }
    }

    pub fn is_two_phase(&self) -> bool {
        self.mode == PlanMode::TwoPhase
    }

    /// Whether the create transaction itself carries the method call.
    pub fn calls_on_create(&self) -> bool {
        matches!(
            self.mode,
            PlanMode::SinglePhase | PlanMode::BestEffortSinglePhase
        )
    }

    pub fn method_name(&self) -> Option<&str> {
        self.method.as_ref().map(|m| m.name.as_str())
    }
}
