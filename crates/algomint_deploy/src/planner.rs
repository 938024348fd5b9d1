//! Chooses the method that initializes a new app, and whether it can run inside the create
//! transaction or needs a follow-up call.

use crate::error::DeployError;
use crate::interface::{InterfaceMethod, InterfaceSpec};
use algomint_abi::ABIMethod;
use algomint_abi::app_spec::CallConfigValue;
use algomint_transact::OnApplicationComplete;
use log::{debug, warn};

const INITIALIZER_NAMES: [&str; 6] = [
    "create",
    "initialize",
    "init",
    "setup",
    "bootstrap",
    "constructor",
];
const HEURISTIC_NAMES: [&str; 2] = ["create", "initialize"];

/// How the app comes into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    /// Create with no app arguments.
    Bare,
    /// The create transaction calls the selected method.
    SinglePhase,
    /// The selected method is not allowed at creation but there is no bare create either,
    /// so it is attempted in the create transaction anyway.
    BestEffortSinglePhase,
    /// Bare create, then a `NoOp` call of the selected method against the new app.
    TwoPhase,
}

/// Ways to pick the create method, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// A method with an action marked `CREATE`.
    CreateOnlyHint,
    /// A method with an action marked `ALL`.
    AllHint,
    /// An initializer-named method with arguments that may only be called.
    CallOnlyInitializer,
    /// A method named `create` or `initialize` with arguments.
    NameHeuristic,
}

impl SelectionStrategy {
    pub const DEFAULT_ORDER: [SelectionStrategy; 4] = [
        SelectionStrategy::CreateOnlyHint,
        SelectionStrategy::AllHint,
        SelectionStrategy::CallOnlyInitializer,
        SelectionStrategy::NameHeuristic,
    ];

    fn select(&self, spec: &InterfaceSpec) -> Option<MethodSelection> {
        match self {
            SelectionStrategy::CreateOnlyHint => {
                self.first_with_hint(spec, CallConfigValue::Create)
            }
            SelectionStrategy::AllHint => self.first_with_hint(spec, CallConfigValue::All),
            SelectionStrategy::CallOnlyInitializer => self.first_named(spec, &INITIALIZER_NAMES, |m| {
                m.call_config.is_call_only()
            }),
            SelectionStrategy::NameHeuristic => self.first_named(spec, &HEURISTIC_NAMES, |_| true),
        }
    }

    fn first_with_hint(
        &self,
        spec: &InterfaceSpec,
        value: CallConfigValue,
    ) -> Option<MethodSelection> {
        spec.methods.iter().find_map(|m| {
            m.call_config.find(value).map(|action| MethodSelection {
                method: m.method.clone(),
                strategy: *self,
                creation_eligible: true,
                on_complete: action,
            })
        })
    }

    fn first_named(
        &self,
        spec: &InterfaceSpec,
        names: &[&str],
        accept: impl Fn(&InterfaceMethod) -> bool,
    ) -> Option<MethodSelection> {
        spec.methods
            .iter()
            .find(|m| {
                !m.method.args.is_empty()
                    && names.iter().any(|name| m.name().eq_ignore_ascii_case(name))
                    && accept(m)
            })
            .map(|m| MethodSelection {
                method: m.method.clone(),
                strategy: *self,
                creation_eligible: false,
                on_complete: OnApplicationComplete::NoOp,
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSelection {
    pub method: ABIMethod,
    pub strategy: SelectionStrategy,
    /// Whether the interface allows this method in the create transaction.
    pub creation_eligible: bool,
    pub on_complete: OnApplicationComplete,
}

/// The planner's decision, before any argument is encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutline {
    pub selection: Option<MethodSelection>,
    pub mode: PlanMode,
    /// On-completion of the create transaction.
    pub create_on_complete: OnApplicationComplete,
    /// On-completion to use if the plan falls back to a bare create.
    pub bare_on_complete: OnApplicationComplete,
    pub warnings: Vec<String>,
}

/// Ordered list of selection strategies; the first that matches wins.
#[derive(Debug, Clone)]
pub struct CreateMethodPlanner {
    strategies: Vec<SelectionStrategy>,
}

impl Default for CreateMethodPlanner {
    fn default() -> Self {
        Self {
            strategies: SelectionStrategy::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl CreateMethodPlanner {
    pub fn with_strategies(strategies: Vec<SelectionStrategy>) -> Self {
        Self { strategies }
    }

    pub fn plan(&self, spec: &InterfaceSpec) -> Result<PlanOutline, DeployError> {
        let bare = spec.bare_call_config;
        let bare_on_complete = bare.create_action().unwrap_or_default();
        let selection = self
            .strategies
            .iter()
            .find_map(|strategy| strategy.select(spec));

        let mut outline = PlanOutline {
            selection: None,
            mode: PlanMode::Bare,
            create_on_complete: bare_on_complete,
            bare_on_complete,
            warnings: Vec::new(),
        };

        let Some(selection) = selection else {
            if !bare.allows_create() {
                let warning = DeployError::PlanningAmbiguity {
                    message: format!(
                        "'{}' declares no create method and no bare create; attempting a bare create",
                        spec.name
                    ),
                };
                warn!("{}", warning);
                outline.warnings.push(warning.to_string());
            }
            return Ok(outline);
        };

        if selection.method.has_transaction_args() {
            return Err(DeployError::validation(format!(
                "Method '{}' takes transaction arguments, which cannot be supplied when creating an app",
                selection.method.name
            )));
        }

        debug!(
            "Selected '{}' via {:?} (creation eligible: {})",
            selection.method.name, selection.strategy, selection.creation_eligible
        );

        if selection.method.args.is_empty() {
            if selection.creation_eligible && !bare.allows_create() {
                outline.mode = PlanMode::SinglePhase;
                outline.create_on_complete = selection.on_complete;
                outline.selection = Some(selection);
            }
            return Ok(outline);
        }

        if selection.creation_eligible {
            outline.mode = PlanMode::SinglePhase;
            outline.create_on_complete = selection.on_complete;
        } else if bare.allows_create() {
            outline.mode = PlanMode::TwoPhase;
        } else {
            let message = format!(
                "'{}' is not allowed at creation and '{}' has no bare create; calling it in the create transaction anyway",
                selection.method.name, spec.name
            );
            warn!("{}", message);
            outline.warnings.push(message);
            outline.mode = PlanMode::BestEffortSinglePhase;
            outline.create_on_complete = OnApplicationComplete::NoOp;
        }
        outline.selection = Some(selection);
        Ok(outline)
    }
}
